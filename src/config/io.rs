use anyhow::{bail, Context, Result};
use std::path::Path;

use super::defaults::MAX_CONFIG_FILE_BYTES;
use super::Config;

/// Read and parse a YAML configuration file.
///
/// Symlinks are followed (mounted config maps are symlink farms), but the
/// final target must be a regular file no larger than
/// [`MAX_CONFIG_FILE_BYTES`].
pub fn read_config_file(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    if !metadata.is_file() {
        bail!("Config path '{}' is not a regular file", path.display());
    }

    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    parse_config_yaml(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Parse a YAML configuration document.
pub fn parse_config_yaml(content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(content)?;
    Ok(config)
}
