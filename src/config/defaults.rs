//! Default configuration constants used across the system.

/// Config file location used when neither the flag nor the env var is set.
pub const DEFAULT_CONFIG_PATH: &str = "/config.yaml";

/// Seconds between reconciliation ticks.
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;

/// Per-request timeout for cluster API calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Timeout for a single encryption tool invocation.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Encryption tool binary name, resolved under `binaries_path`.
pub const DEFAULT_RAGE_BINARY: &str = "rage";

/// Hardware identity plugin binary name, resolved under `binaries_path`.
pub const DEFAULT_PLUGIN_BINARY: &str = "age-plugin-yubikey";

/// Maximum size for a config file (1 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

pub(crate) fn default_reconcile_interval_secs() -> u64 {
    DEFAULT_RECONCILE_INTERVAL_SECS
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub(crate) fn default_tool_timeout_secs() -> u64 {
    DEFAULT_TOOL_TIMEOUT_SECS
}

pub(crate) fn default_rage_binary() -> String {
    DEFAULT_RAGE_BINARY.to_string()
}

pub(crate) fn default_plugin_binary() -> String {
    DEFAULT_PLUGIN_BINARY.to_string()
}
