//! Command-line driver for a filedock server.
//!
//! ```text
//! filedock-client [--config PATH] upload FILE...
//! filedock-client [--config PATH] list
//! filedock-client [--config PATH] download NAME DEST
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use filedock::{Config, FileClient, FiledockError, Result};

const DEFAULT_CONFIG_PATH: &str = "filedock.toml";

#[derive(Parser)]
#[command(name = "filedock-client")]
#[command(about = "Upload, list and download files on a filedock server")]
#[command(version)]
struct Cli {
    /// Client configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more local files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List stored files
    List,
    /// Download a stored file to DEST
    Download { name: String, dest: PathBuf },
}

fn load_config(path: &str) -> Config {
    if Path::new(path).exists() {
        match Config::load_with_env(path) {
            Ok(config) => return config,
            Err(e) => eprintln!("Failed to load {path}: {e}"),
        }
    }
    let mut config = Config::default();
    config.apply_env_overrides();
    config
}

async fn run(config: Config, command: Commands) -> Result<()> {
    let client = FileClient::connect(config.client.endpoint.clone()).await?;

    match command {
        Commands::Upload { files } => {
            let mut failed = 0;
            for (path, result) in client
                .upload_batch(files, config.client.max_concurrent_uploads)
                .await
            {
                match result {
                    Ok(outcome) => println!(
                        "Upload successful: {} (size: {} bytes)",
                        outcome.filename, outcome.size
                    ),
                    Err(e) => {
                        failed += 1;
                        eprintln!("Upload failed: {}: {e}", path.display());
                    }
                }
            }
            if failed > 0 {
                return Err(FiledockError::Protocol(format!("{failed} upload(s) failed")));
            }
        }
        Commands::List => {
            let files = client.list_files(config.client.list_timeout()).await?;
            println!("Filename | Created At | Updated At | Size");
            println!("----------------------------------------");
            for file in files {
                println!(
                    "{} | {} | {} | {} bytes",
                    file.filename,
                    file.created_at.format("%Y-%m-%d %H:%M:%S"),
                    file.updated_at.format("%Y-%m-%d %H:%M:%S"),
                    file.size
                );
            }
        }
        Commands::Download { name, dest } => {
            let file = client.download_to(&name, &dest).await?;
            println!(
                "Download successful: {} ({} bytes)",
                dest.display(),
                file.data.len()
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = load_config(&cli.config);
    filedock::logging::init_console_only(&config.logging.level);

    if let Err(e) = run(config, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
