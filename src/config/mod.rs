mod defaults;
mod io;
mod validation;

pub use defaults::*;
pub use io::*;
pub use validation::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{Error, Result};

/// Top-level vaultkeeper configuration.
///
/// Built once at startup and handed by reference to every component that
/// needs it; nothing reads it through a global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// age recipients every artifact is encrypted to.
    pub recipients: Vec<String>,
    /// Identity file (or plugin identity reference) used for decryption.
    pub identity: String,
    /// Base URL of the Vault cluster.
    pub vault_address: String,
    /// Where the encrypted unseal key shares live.
    pub recovery_keys_path: PathBuf,
    /// Where the encrypted root token lives.
    pub root_token_path: PathBuf,
    pub init_key_shares: u32,
    pub init_key_threshold: u32,
    /// Directory holding the `rage` and identity plugin binaries.
    pub binaries_path: PathBuf,

    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default = "default_rage_binary")]
    pub rage_binary: String,
    #[serde(default = "default_plugin_binary")]
    pub plugin_binary: String,
}

impl Config {
    /// Load, override and validate the configuration.
    ///
    /// `path` comes from the CLI (which already falls back to
    /// `VAULTKEEPER_CONFIG`); without it the fixed sidecar location is used.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_from(&resolve_config_path(path))
    }

    /// Load from an explicit file, then apply env overrides and validate.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        info!("Loading config from {}", config_path.display());
        let mut config = read_config_file(config_path).map_err(config_error)?;

        config.apply_env_overrides();
        validate_config_object(&config).map_err(config_error)?;
        config.log_summary(config_path);

        Ok(config)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("VAULT_ADDR") {
            if !addr.trim().is_empty() {
                self.vault_address = addr;
            }
        }

        if let Ok(identity) = std::env::var("VAULTKEEPER_IDENTITY") {
            if !identity.trim().is_empty() {
                self.identity = identity;
            }
        }
    }

    fn log_summary(&self, source: &Path) {
        info!(
            source = %source.display(),
            vault_address = %self.vault_address,
            recipients = self.recipients.len(),
            recovery_keys_path = %self.recovery_keys_path.display(),
            root_token_path = %self.root_token_path.display(),
            init_key_shares = self.init_key_shares,
            init_key_threshold = self.init_key_threshold,
            interval_secs = self.reconcile_interval_secs,
            "Configuration loaded"
        );
    }
}

/// Config file location: the given path, else [`DEFAULT_CONFIG_PATH`].
pub fn resolve_config_path(path: Option<&str>) -> PathBuf {
    path.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn config_error(e: anyhow::Error) -> Error {
    Error::Config(format!("{e:#}"))
}
