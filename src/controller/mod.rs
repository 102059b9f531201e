//! The reconciliation loop and the two steps it drives.
//!
//! Each tick runs [`ClusterInitializer::ensure_initialized`] and then
//! [`UnsealController::ensure_unsealed`], then sleeps for the configured
//! interval. Errors are never retried here: [`Reconciler::run`] returns the
//! first one and the binary exits non-zero, leaving restart and backoff to
//! the process supervisor.

mod init;
mod unseal;

pub use init::{ClusterInitializer, InitOutcome};
pub use unseal::{ShareOutcome, UnsealController, UnsealOutcome, UnsealReport};

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::codec::SecretCodec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::escrow::KeyEscrow;
use crate::vault::VaultApi;

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub init: InitOutcome,
    pub unseal: UnsealReport,
}

pub struct Reconciler {
    initializer: ClusterInitializer,
    unsealer: UnsealController,
    interval: Duration,
}

impl Reconciler {
    pub fn new(config: &Config, vault: Arc<dyn VaultApi>, codec: Arc<dyn SecretCodec>) -> Self {
        let escrow = Arc::new(KeyEscrow::new(config, codec));
        Self {
            initializer: ClusterInitializer::new(config, vault.clone(), escrow.clone()),
            unsealer: UnsealController::new(vault, escrow),
            interval: config.reconcile_interval(),
        }
    }

    pub async fn tick(&self) -> Result<TickReport> {
        let init = self.initializer.ensure_initialized().await?;
        let unseal = self.unsealer.ensure_unsealed().await?;
        Ok(TickReport { init, unseal })
    }

    /// Tick forever. Only returns on the first error.
    ///
    /// The sleep is part of the tick, so ticks never overlap.
    pub async fn run(&self) -> std::result::Result<Infallible, Error> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting reconciliation loop"
        );
        loop {
            match self.tick().await {
                Ok(report) => debug!(?report, "Tick complete"),
                Err(e) => {
                    error!(kind = e.kind(), error = %e, "Reconciliation failed");
                    return Err(e);
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
