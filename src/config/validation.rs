use super::Config;
use anyhow::Result;

/// Validation errors for configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn push(errors: &mut Vec<ConfigValidationError>, path: &str, message: &str) {
    errors.push(ConfigValidationError {
        path: path.to_string(),
        message: message.to_string(),
    });
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.recipients.is_empty() {
        push(&mut errors, "recipients", "At least one recipient is required");
    }
    for (idx, recipient) in config.recipients.iter().enumerate() {
        if recipient.trim().is_empty() {
            push(
                &mut errors,
                &format!("recipients[{idx}]"),
                "Recipient must not be blank",
            );
        }
    }

    if config.identity.trim().is_empty() {
        push(&mut errors, "identity", "Decryption identity is required");
    }

    match url::Url::parse(&config.vault_address) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(_) => push(&mut errors, "vault_address", "Scheme must be http or https"),
        Err(e) => push(
            &mut errors,
            "vault_address",
            &format!("Invalid URL: {e}"),
        ),
    }

    if config.recovery_keys_path.as_os_str().is_empty() {
        push(&mut errors, "recovery_keys_path", "Path is required");
    }
    if config.root_token_path.as_os_str().is_empty() {
        push(&mut errors, "root_token_path", "Path is required");
    }
    if !config.recovery_keys_path.as_os_str().is_empty()
        && config.recovery_keys_path == config.root_token_path
    {
        push(
            &mut errors,
            "root_token_path",
            "Must differ from recovery_keys_path",
        );
    }

    if config.init_key_threshold < 1 {
        push(&mut errors, "init_key_threshold", "Must be at least 1");
    }
    if config.init_key_shares < 1 {
        push(&mut errors, "init_key_shares", "Must be at least 1");
    }
    if config.init_key_threshold > config.init_key_shares {
        push(
            &mut errors,
            "init_key_threshold",
            "Must not exceed init_key_shares",
        );
    }

    if config.reconcile_interval_secs == 0 {
        push(&mut errors, "reconcile_interval_secs", "Must be greater than 0");
    }
    if config.request_timeout_secs == 0 {
        push(&mut errors, "request_timeout_secs", "Must be greater than 0");
    }
    if config.tool_timeout_secs == 0 {
        push(&mut errors, "tool_timeout_secs", "Must be greater than 0");
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
