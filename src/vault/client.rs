use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{ClusterApiError, InitRequest, InitResponse, SealStatus, VaultApi};

/// HTTP client for the unauthenticated `sys/` endpoints.
///
/// Every request is bounded by the timeout given at construction; a request
/// that exceeds it surfaces as [`ClusterApiError::Timeout`].
pub struct HttpVaultClient {
    base_url: String,
    client: Client,
}

impl HttpVaultClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClusterApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClusterApiError::Transport {
                operation: "client",
                source,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/sys/{}", self.base_url, path)
    }
}

// ============================================================================
// Vault API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct InitStatusResponse {
    initialized: bool,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct RawInitResponse {
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    keys_base64: Vec<String>,
    root_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

fn classify(operation: &'static str, source: reqwest::Error) -> ClusterApiError {
    if source.is_timeout() {
        ClusterApiError::Timeout { operation }
    } else if source.is_decode() {
        ClusterApiError::Decode {
            operation,
            message: source.to_string(),
        }
    } else {
        ClusterApiError::Transport { operation, source }
    }
}

/// Turn a Vault error body into a single line.
fn error_message(body: &str) -> String {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    if !parsed.errors.is_empty() {
        return parsed.errors.join("; ");
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details".to_string()
    } else {
        trimmed.to_string()
    }
}

async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    resp: reqwest::Response,
) -> Result<T, ClusterApiError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(ClusterApiError::Status {
            operation,
            status: status.as_u16(),
            message: error_message(&text),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| classify(operation, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ClusterApiError::Decode {
        operation,
        message: e.to_string(),
    })
}

// ============================================================================
// VaultApi Implementation
// ============================================================================

#[async_trait]
impl VaultApi for HttpVaultClient {
    async fn init_status(&self) -> Result<bool, ClusterApiError> {
        const OP: &str = "init-status";
        let resp = self
            .client
            .get(self.endpoint("init"))
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        let body: InitStatusResponse = read_json(OP, resp).await?;
        debug!(initialized = body.initialized, "Init status received");
        Ok(body.initialized)
    }

    async fn init(&self, request: InitRequest) -> Result<InitResponse, ClusterApiError> {
        const OP: &str = "init";
        let resp = self
            .client
            .put(self.endpoint("init"))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        let mut raw: RawInitResponse = read_json(OP, resp).await?;

        // Prefer the base64 encoding, which is what operators paste back in.
        let keys = if raw.keys_base64.is_empty() {
            std::mem::take(&mut raw.keys)
        } else {
            std::mem::take(&mut raw.keys_base64)
        };
        if keys.is_empty() {
            return Err(ClusterApiError::Decode {
                operation: OP,
                message: "response contained no key shares".to_string(),
            });
        }
        if raw.root_token.is_empty() {
            return Err(ClusterApiError::Decode {
                operation: OP,
                message: "response contained no root token".to_string(),
            });
        }

        Ok(InitResponse {
            keys,
            root_token: std::mem::take(&mut raw.root_token),
        })
    }

    async fn seal_status(&self) -> Result<SealStatus, ClusterApiError> {
        const OP: &str = "seal-status";
        let resp = self
            .client
            .get(self.endpoint("seal-status"))
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        let status: SealStatus = read_json(OP, resp).await?;
        debug!(
            initialized = status.initialized,
            sealed = status.sealed,
            progress = status.progress,
            threshold = status.threshold,
            "Seal status received"
        );
        Ok(status)
    }

    async fn unseal(&self, share: &str) -> Result<SealStatus, ClusterApiError> {
        const OP: &str = "unseal";
        let resp = self
            .client
            .put(self.endpoint("unseal"))
            .json(&serde_json::json!({ "key": share }))
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        read_json(OP, resp).await
    }
}
