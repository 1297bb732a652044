//! docpair CLI: the main entry point.
//!
//! Commands:
//! - `init`    Write a starter config file
//! - `docs`    List the configured documents
//! - `chat`    Interactive chat or single-request mode
//! - `doctor`  Diagnose configuration and service health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "docpair",
    about = "docpair: ask questions across a pair of legal documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of ~/.docpair/config.toml
    #[arg(short, long, global = true, env = "DOCPAIR_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List configured documents and whether their files are present
    Docs,

    /// Chat about the selected documents
    Chat {
        /// Send a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Select a document before starting (repeatable; the last two win)
        #[arg(short, long = "select", value_name = "ID")]
        select: Vec<String>,

        /// Run the extraction prompt once and exit
        #[arg(long, conflicts_with_all = ["compare", "message"])]
        extract: bool,

        /// Run the comparison prompt once and exit
        #[arg(long, conflicts_with = "message")]
        compare: bool,
    },

    /// Diagnose configuration, documents and service reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Environment from .env must be in place before config and RUST_LOG are read
    let env_file = docpair_config::load_env_file();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Docs => commands::docs::run(config_path).await?,
        Commands::Chat {
            message,
            select,
            extract,
            compare,
        } => {
            let request = commands::chat::ChatRequest {
                message,
                select,
                extract,
                compare,
            };
            commands::chat::run(config_path, request).await?
        }
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
