//! Share-by-share unsealing against the cluster's quorum state machine.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::escrow::KeyEscrow;
use crate::vault::{SealStatus, VaultApi};

/// Effect of submitting one key share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The cluster accepted the share and progress moved forward.
    Advanced { from: u32, to: u32 },
    /// Progress did not move: the share is stale, invalid or a duplicate.
    Stalled { progress: u32 },
    /// The share completed the quorum.
    Unsealed,
}

impl ShareOutcome {
    /// Classify an unseal response against the status observed just before.
    pub fn classify(before: &SealStatus, after: &SealStatus) -> Self {
        if !after.sealed {
            ShareOutcome::Unsealed
        } else if after.progress > before.progress {
            ShareOutcome::Advanced {
                from: before.progress,
                to: after.progress,
            }
        } else {
            ShareOutcome::Stalled {
                progress: after.progress,
            }
        }
    }
}

/// Overall result of one `ensure_unsealed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsealOutcome {
    /// Nothing to unseal until the cluster is initialized.
    NotInitialized,
    AlreadyUnsealed,
    Unsealed,
    /// Every stored share was tried and the cluster is still sealed.
    StillSealed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsealReport {
    pub outcome: UnsealOutcome,
    /// One entry per submitted share, in submission order.
    pub submissions: Vec<ShareOutcome>,
}

impl UnsealReport {
    fn new(outcome: UnsealOutcome) -> Self {
        Self {
            outcome,
            submissions: Vec::new(),
        }
    }

    pub fn submitted(&self) -> usize {
        self.submissions.len()
    }

    pub fn stalled(&self) -> usize {
        self.submissions
            .iter()
            .filter(|s| matches!(s, ShareOutcome::Stalled { .. }))
            .count()
    }
}

pub struct UnsealController {
    vault: Arc<dyn VaultApi>,
    escrow: Arc<KeyEscrow>,
}

impl UnsealController {
    pub fn new(vault: Arc<dyn VaultApi>, escrow: Arc<KeyEscrow>) -> Self {
        Self { vault, escrow }
    }

    /// Unseal the cluster if it is sealed.
    ///
    /// Shares are submitted in stored order, re-reading the seal status before
    /// each one so that nothing is sent to an unsealed cluster. Running out
    /// of shares while still sealed is logged and reported, not an error;
    /// the next tick tries again from scratch.
    pub async fn ensure_unsealed(&self) -> Result<UnsealReport> {
        let status = self.vault.seal_status().await?;
        if !status.initialized {
            info!("Vault is not initialized yet, nothing to unseal");
            return Ok(UnsealReport::new(UnsealOutcome::NotInitialized));
        }
        if !status.sealed {
            info!("Vault is already unsealed");
            return Ok(UnsealReport::new(UnsealOutcome::AlreadyUnsealed));
        }

        info!(
            progress = status.progress,
            threshold = status.threshold,
            "Vault is sealed, trying to unseal now"
        );
        let keys = self.escrow.load_unseal_keys().await?;
        info!(shares = keys.len(), "Unseal keys were successfully decrypted");

        let mut report = UnsealReport::new(UnsealOutcome::StillSealed);
        for (idx, share) in keys.iter().enumerate() {
            let before = self.vault.seal_status().await?;
            if !before.sealed {
                info!("Vault is unsealed");
                report.outcome = UnsealOutcome::Unsealed;
                break;
            }

            let after = self.vault.unseal(share).await?;
            let outcome = ShareOutcome::classify(&before, &after);
            report.submissions.push(outcome);

            match outcome {
                ShareOutcome::Advanced { from, to } => info!(
                    share = idx + 1,
                    from,
                    to,
                    threshold = after.threshold,
                    "Unseal progress advanced"
                ),
                ShareOutcome::Stalled { progress } => warn!(
                    share = idx + 1,
                    progress,
                    threshold = after.threshold,
                    "Unseal share did not advance progress; it may be stale or invalid"
                ),
                ShareOutcome::Unsealed => {
                    info!(share = idx + 1, "Vault is unsealed");
                    report.outcome = UnsealOutcome::Unsealed;
                    break;
                }
            }
        }

        if report.outcome == UnsealOutcome::StillSealed {
            warn!(
                submitted = report.submitted(),
                stalled = report.stalled(),
                "All stored unseal keys were submitted but Vault is still sealed; \
                 retrying on the next tick"
            );
        }

        Ok(report)
    }
}
