//! Operator diagnostics: report tool versions and plugin identities.

use anyhow::{Context, Result};
use tracing::info;

use super::process::ToolRunner;
use crate::config::Config;

/// Output of one diagnostic command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub command: String,
    pub output: String,
}

impl DiagnosticReport {
    /// Shell-transcript form printed by `vaultkeeper doctor`.
    pub fn render(&self) -> String {
        format!("$ {}\n{}\n", self.command, self.output)
    }
}

/// Run every diagnostic command and collect the output.
///
/// Stops at the first command that fails.
pub async fn collect_diagnostics(config: &Config) -> Result<Vec<DiagnosticReport>> {
    let runner = ToolRunner::new(&config.binaries_path, config.tool_timeout());
    let checks = [
        (config.rage_binary.as_str(), "--version"),
        (config.plugin_binary.as_str(), "--version"),
        (config.plugin_binary.as_str(), "-i"),
    ];

    let mut reports = Vec::with_capacity(checks.len());
    for (binary, arg) in checks {
        let command = format!("{binary} {arg}");
        let output = runner
            .run(binary, [arg], None)
            .await
            .with_context(|| format!("Diagnostic '{command}' failed"))?;
        reports.push(DiagnosticReport {
            command,
            output: String::from_utf8_lossy(&output).trim().to_string(),
        });
    }
    Ok(reports)
}

pub async fn run_diagnostics(config: &Config) -> Result<()> {
    info!(
        binaries_path = %config.binaries_path.display(),
        "Running vaultkeeper diagnostics"
    );
    for report in collect_diagnostics(config).await? {
        info!(command = %report.command, "Diagnostic passed");
        println!("{}", report.render());
    }
    info!("Diagnostics complete");
    Ok(())
}
