use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tipstream::{commands, config};

#[derive(Parser)]
#[command(name = "tipstream")]
#[command(about = "Creator revenue ledger and payout governor", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.tipstream/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Run the HTTP API (restores the ledger snapshot, persists on shutdown)
    Run {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compute a payout run and seal it into the audit chain
    Payout {
        /// JSON file with creator view stats and the revenue context
        #[arg(long)]
        input: String,
    },

    /// Verify the payout chain hashes and links
    VerifyChain,

    /// Show ledger and payout chain status
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init => commands::init::run(&config_path),
        Commands::Run { port } => commands::run::run(&config_path, port),
        Commands::Payout { input } => commands::payout::run(&config_path, Path::new(&input)),
        Commands::VerifyChain => commands::verify_chain::run(&config_path),
        Commands::Status => commands::status::run(&config_path),
    }
}
