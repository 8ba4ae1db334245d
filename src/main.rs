use clap::Parser;
use tracing::{error, info};

use filedock::{Config, FileServer, FileTransferService};

const DEFAULT_CONFIG_PATH: &str = "filedock.toml";

#[derive(Parser)]
#[command(name = "filedock")]
#[command(about = "Remote file store serving chunked uploads and downloads over gRPC")]
#[command(version)]
struct Cli {
    /// Server configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() {
    let config_path = Cli::parse().config;

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = filedock::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filedock::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("filedock - remote file store");

    if let Err(e) = run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> filedock::Result<()> {
    let service = FileTransferService::from_config(&config)?;
    let server = FileServer::bind(&config, service).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await
}
