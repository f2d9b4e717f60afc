//! keygrab CLI - per-channel stream key retrieval
//!
//! Features:
//! - Key grab pipeline (default command)
//! - Authorization URL list generation
//! - HEAD probing of authorization URLs
//! - Credentials harvesting from player pages
//! - Decoding of the written key mapping

use clap::{Parser, Subcommand};
use keygrab_core::{GrabConfig, KeyProtocol};
use std::path::PathBuf;

mod commands;
mod output;

/// keygrab - fetch per-channel stream keys
#[derive(Parser)]
#[command(name = "keygrab")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Fetch per-channel stream keys into a JSON mapping", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Credentials file (default: channelAuth.txt)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Key mapping file (default: channelKeys.json)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Key protocol (binary, manifest)
    #[arg(short, long, global = true)]
    protocol: Option<KeyProtocol>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch keys for every channel in the credentials file (default)
    Grab,

    /// Write one authorization URL per credential block
    Urls {
        /// Destination file
        #[arg(long, default_value = "signatureURLs.txt")]
        to: PathBuf,
    },

    /// HEAD every URL in a list file
    Probe {
        /// URL list file
        #[arg(default_value = "signatureURLs.txt")]
        list: PathBuf,
    },

    /// Scrape player pages into the credentials file
    Harvest {
        /// Channel list files containing premium<N> ids
        #[arg(default_values = ["nfs.txt", "wind.txt", "zeko.txt", "dokko1.txt"])]
        lists: Vec<PathBuf>,
    },

    /// Print the keys of a mapping file as hex
    Decode {
        /// Mapping file (defaults to the output path)
        file: Option<PathBuf>,
    },
}

impl Cli {
    fn grab_config(&self) -> anyhow::Result<GrabConfig> {
        let mut config = match &self.config {
            Some(path) => GrabConfig::load(path)?,
            None => GrabConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays parseable with --format json
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.grab_config()?;

    match cli.command.unwrap_or(Commands::Grab) {
        Commands::Grab => {
            commands::grab(config, &cli.format).await?;
        }
        Commands::Urls { to } => {
            commands::urls(&config, &to, &cli.format)?;
        }
        Commands::Probe { list } => {
            commands::probe(&config, &list, &cli.format).await?;
        }
        Commands::Harvest { lists } => {
            commands::harvest(&config, &lists, &cli.format).await?;
        }
        Commands::Decode { file } => {
            let file = file.unwrap_or_else(|| config.output_path.clone());
            commands::decode(&file, &cli.format)?;
        }
    }

    Ok(())
}
