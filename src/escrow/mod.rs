//! Encrypted persistence of the unseal key shares and root token.
//!
//! Both records are serialized to text, handed to the [`SecretCodec`] and
//! only ever written in encrypted form. The share list is YAML
//! (`keys: [...]`) and keeps the order the cluster produced; the root token
//! is stored as its bare string.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::codec::SecretCodec;
use crate::config::Config;
use crate::error::{Error, Result};

/// Ordered unseal key shares.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct UnsealKeys {
    pub keys: Vec<String>,
}

impl UnsealKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    fn to_text(&self) -> std::result::Result<Zeroizing<String>, serde_yaml::Error> {
        serde_yaml::to_string(self).map(Zeroizing::new)
    }

    fn from_text(text: &str) -> std::result::Result<Self, String> {
        let parsed: UnsealKeys = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        if parsed.is_empty() {
            return Err("record contains no key shares".to_string());
        }
        if let Some(idx) = parsed.keys.iter().position(|k| k.trim().is_empty()) {
            return Err(format!("key share {idx} is blank"));
        }
        Ok(parsed)
    }
}

impl std::fmt::Debug for UnsealKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnsealKeys([{} redacted])", self.keys.len())
    }
}

/// The cluster's root token.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RootToken(String);

impl RootToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RootToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RootToken(<redacted>)")
    }
}

/// Reads and writes the two encrypted artifacts.
pub struct KeyEscrow {
    codec: Arc<dyn SecretCodec>,
    recipients: Vec<String>,
    identity: String,
    unseal_keys_path: PathBuf,
    root_token_path: PathBuf,
}

impl KeyEscrow {
    pub fn new(config: &Config, codec: Arc<dyn SecretCodec>) -> Self {
        Self {
            codec,
            recipients: config.recipients.clone(),
            identity: config.identity.clone(),
            unseal_keys_path: config.recovery_keys_path.clone(),
            root_token_path: config.root_token_path.clone(),
        }
    }

    pub fn unseal_keys_path(&self) -> &Path {
        &self.unseal_keys_path
    }

    pub fn root_token_path(&self) -> &Path {
        &self.root_token_path
    }

    pub async fn store_unseal_keys(&self, keys: &UnsealKeys) -> Result<()> {
        let text = keys.to_text().map_err(|e| Error::Encryption {
            path: self.unseal_keys_path.clone(),
            reason: format!("cannot serialize key shares: {e}"),
        })?;
        self.codec
            .encrypt(text.as_bytes(), &self.recipients, &self.unseal_keys_path)
            .await?;
        info!(
            shares = keys.len(),
            codec = self.codec.name(),
            "Unseal keys stored in {}",
            self.unseal_keys_path.display()
        );
        Ok(())
    }

    pub async fn load_unseal_keys(&self) -> Result<UnsealKeys> {
        let text = self.decrypt_text(&self.unseal_keys_path).await?;
        UnsealKeys::from_text(&text).map_err(|reason| Error::MalformedRecord {
            path: self.unseal_keys_path.clone(),
            reason,
        })
    }

    pub async fn store_root_token(&self, token: &RootToken) -> Result<()> {
        self.codec
            .encrypt(token.expose().as_bytes(), &self.recipients, &self.root_token_path)
            .await?;
        info!(
            codec = self.codec.name(),
            "Root token stored in {}",
            self.root_token_path.display()
        );
        Ok(())
    }

    /// Recover the root token. Not used by the reconciliation loop; operators
    /// and tests use it to check what was escrowed.
    pub async fn load_root_token(&self) -> Result<RootToken> {
        let text = self.decrypt_text(&self.root_token_path).await?;
        let token = text.trim();
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(Error::MalformedRecord {
                path: self.root_token_path.clone(),
                reason: "root token record is not a single token".to_string(),
            });
        }
        Ok(RootToken::new(token))
    }

    async fn decrypt_text(&self, path: &Path) -> Result<Zeroizing<String>> {
        let bytes = self.codec.decrypt(path, &self.identity).await?;
        let text = std::str::from_utf8(&bytes).map_err(|e| Error::MalformedRecord {
            path: path.to_path_buf(),
            reason: format!("decrypted content is not UTF-8: {e}"),
        })?;
        Ok(Zeroizing::new(text.to_string()))
    }
}
