//! The slice of the Vault `sys/` API this controller drives.
//!
//! [`VaultApi`] is the seam between the reconciliation logic and the
//! cluster; [`HttpVaultClient`] talks to a real cluster over HTTP.

mod client;

pub use client::HttpVaultClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Failure talking to the cluster.
#[derive(Error, Debug)]
pub enum ClusterApiError {
    /// Connection-level failure (DNS, refused, TLS, reset).
    #[error("{operation}: transport failure: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The call did not complete within the per-request timeout.
    #[error("{operation}: request timed out")]
    Timeout { operation: &'static str },

    /// The cluster answered with a non-success status.
    #[error("{operation}: HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("{operation}: unexpected response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

/// Parameters for `sys/init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitRequest {
    pub secret_shares: u32,
    pub secret_threshold: u32,
}

/// Secret material returned by `sys/init`.
///
/// Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct InitResponse {
    /// Unseal key shares in the order the cluster produced them.
    pub keys: Vec<String>,
    pub root_token: String,
}

impl std::fmt::Debug for InitResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitResponse")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("root_token", &"<redacted>")
            .finish()
    }
}

/// Seal state as reported by `sys/seal-status` and `sys/unseal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SealStatus {
    pub initialized: bool,
    pub sealed: bool,
    /// Number of shares accepted so far in the current unseal attempt.
    pub progress: u32,
    /// Number of shares required to unseal.
    #[serde(rename = "t")]
    pub threshold: u32,
    /// Total number of shares the cluster was initialized with.
    #[serde(rename = "n", default)]
    pub shares: u32,
}

/// Operations consumed from the cluster.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Whether the cluster has been initialized.
    async fn init_status(&self) -> Result<bool, ClusterApiError>;

    /// Initialize the cluster. Only succeeds once per cluster lifetime.
    async fn init(&self, request: InitRequest) -> Result<InitResponse, ClusterApiError>;

    async fn seal_status(&self) -> Result<SealStatus, ClusterApiError>;

    /// Submit one unseal key share and return the resulting seal state.
    async fn unseal(&self, share: &str) -> Result<SealStatus, ClusterApiError>;
}
