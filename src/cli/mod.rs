use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "vaultkeeper",
    version,
    about = "Keeps a Vault cluster initialized and unsealed"
)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, env = "VAULTKEEPER_CONFIG")]
    pub config: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "VAULTKEEPER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the reconciliation loop (default).
    Run,
    /// Print encryption tool versions and available plugin identities.
    Doctor,
    Version,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}
