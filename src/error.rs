//! Error types shared by every reconciliation step.

use std::path::PathBuf;
use thiserror::Error;

use crate::vault::ClusterApiError;

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop a reconciliation tick.
///
/// None of these are retried in-process; the loop surfaces them and the
/// process exits.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport or API-level failure talking to the cluster, including timeouts.
    #[error("Cluster API error: {0}")]
    ClusterApi(#[from] ClusterApiError),

    /// The encryption tool failed to produce an artifact.
    #[error("Failed to encrypt '{}': {reason}", path.display())]
    Encryption { path: PathBuf, reason: String },

    /// The encryption tool could not decrypt an artifact.
    #[error("Failed to decrypt '{}': {reason}", path.display())]
    Decryption { path: PathBuf, reason: String },

    /// Decrypted content does not have the expected shape.
    #[error("Malformed record in '{}': {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },
}

impl Error {
    /// Stable short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::ClusterApi(_) => "cluster_api",
            Error::Encryption { .. } => "encryption",
            Error::Decryption { .. } => "decryption",
            Error::MalformedRecord { .. } => "malformed_record",
        }
    }
}
