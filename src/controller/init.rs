//! One-time cluster initialization with immediate escrow of the results.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::escrow::{KeyEscrow, RootToken, UnsealKeys};
use crate::vault::{InitRequest, VaultApi};

/// What `ensure_initialized` did on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyInitialized,
    /// The cluster was initialized and both artifacts were written.
    Initialized { shares: usize },
}

pub struct ClusterInitializer {
    vault: Arc<dyn VaultApi>,
    escrow: Arc<KeyEscrow>,
    request: InitRequest,
}

impl ClusterInitializer {
    pub fn new(config: &Config, vault: Arc<dyn VaultApi>, escrow: Arc<KeyEscrow>) -> Self {
        Self {
            vault,
            escrow,
            request: InitRequest {
                secret_shares: config.init_key_shares,
                secret_threshold: config.init_key_threshold,
            },
        }
    }

    /// Initialize the cluster if it is not yet initialized.
    ///
    /// Idempotent: against an initialized cluster this is a single status
    /// query. After a successful `init` call there is no way back, so a
    /// failure to persist either artifact is logged as key-material loss
    /// before being returned.
    pub async fn ensure_initialized(&self) -> Result<InitOutcome> {
        if self.vault.init_status().await? {
            info!("Vault is already initialized");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        info!(
            secret_shares = self.request.secret_shares,
            secret_threshold = self.request.secret_threshold,
            "Vault is not initialized, initializing now"
        );
        let mut resp = self.vault.init(self.request).await?;
        info!("Vault has been initialized");

        let shares = resp.keys.len();
        if shares != self.request.secret_shares as usize {
            warn!(
                requested = self.request.secret_shares,
                received = shares,
                "Vault returned an unexpected number of key shares; storing all of them"
            );
        }

        let keys = UnsealKeys::new(std::mem::take(&mut resp.keys));
        if let Err(e) = self.escrow.store_unseal_keys(&keys).await {
            error!(
                error = %e,
                path = %self.escrow.unseal_keys_path().display(),
                "Vault was initialized but the unseal keys could not be stored; \
                 key material exists only in this process and will be lost"
            );
            return Err(e);
        }

        let token = RootToken::new(std::mem::take(&mut resp.root_token));
        if let Err(e) = self.escrow.store_root_token(&token).await {
            error!(
                error = %e,
                path = %self.escrow.root_token_path().display(),
                "Vault was initialized but the root token could not be stored; \
                 the root token will be lost"
            );
            return Err(e);
        }

        Ok(InitOutcome::Initialized { shares })
    }
}
