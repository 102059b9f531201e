//! Sidecar controller that keeps a Vault cluster initialized and unsealed.
//!
//! Key shares and the root token produced at initialization are encrypted
//! with `rage` to a fixed set of age recipients before they touch disk. On
//! every reconciliation tick the shares are decrypted with the local identity
//! and fed to the cluster's unseal endpoint until quorum is reached.

pub mod cli;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod escrow;
pub mod infra;
pub mod logging;
pub mod vault;

pub use error::{Error, Result};
