use clap::Parser;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info};
use vaultkeeper::cli::{Cli, Commands};
use vaultkeeper::codec::RageCodec;
use vaultkeeper::config::Config;
use vaultkeeper::controller::Reconciler;
use vaultkeeper::logging;
use vaultkeeper::vault::HttpVaultClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.log_format);

    match cli.command() {
        Commands::Run => {
            info!("Starting vaultkeeper");
            // `run` only comes back with an error; the supervisor restarts us.
            if let Err(e) = run(cli.config.as_deref()).await {
                error!(kind = e.kind(), "Fatal: {e}");
                std::process::exit(1);
            }
        }
        Commands::Doctor => {
            let config = match Config::load(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    error!(kind = e.kind(), "Fatal: {e}");
                    std::process::exit(1);
                }
            };
            if let Err(e) = vaultkeeper::infra::doctor::run_diagnostics(&config).await {
                error!("Fatal: {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("vaultkeeper {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn run(config_path: Option<&str>) -> vaultkeeper::Result<Infallible> {
    let config = Config::load(config_path)?;

    let vault = HttpVaultClient::new(&config.vault_address, config.request_timeout())?;
    info!(address = %config.vault_address, "Vault client was created successfully");
    let codec = RageCodec::from_config(&config);

    Reconciler::new(&config, Arc::new(vault), Arc::new(codec))
        .run()
        .await
}
