//! Tintgate CLI - Import untrusted raw images and tint them with a label colour.
//!
//! # Usage
//!
//! ```bash
//! # Accept an icon from a producer, tint it, and save it
//! tintgate import --icon --source firefox --tint red -o icon.png --exec ssh work tintgate serve
//!
//! # Producer side: send a local image in wire format
//! tintgate serve ~/Pictures/photo.jpg
//!
//! # Convert an untrusted file through a disposable converter
//! tintgate convert untrusted.gif -o safe.png --exec sandbox-run tintgate convert-server
//!
//! # Recolour a trusted file
//! tintgate tint logo.png logo-red.png --colour red
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tintgate_core::Config;

mod cli;
mod logging;

/// Tintgate - Import untrusted raw images and tint them with a label colour.
#[derive(Parser, Debug)]
#[command(name = "tintgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TINTGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Accept a raw image from stdin or a spawned producer
    Import(cli::import::ImportArgs),

    /// Tint a trusted local image
    Tint(cli::tint::TintArgs),

    /// Send a local image in wire format on stdout
    Serve(cli::serve::ServeArgs),

    /// Convert an untrusted file through a disposable converter
    Convert(cli::convert::ConvertArgs),

    /// Answer one conversion request on stdin/stdout
    ConvertServer(cli::convert::ConvertServerArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config problems go to stderr directly.
    let config_path = match &cli.config {
        Some(path) => tintgate_core::config::expand_path(path),
        None => Config::default_path(),
    };
    let config = match (&cli.config, config_path.exists()) {
        // An explicit config file must load.
        (Some(_), _) => Config::load_from(&config_path)?,
        (None, true) => match Config::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `tintgate config path`."
                );
                Config::default()
            }
        },
        (None, false) => Config::default(),
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tintgate v{}", tintgate_core::VERSION);

    match cli.command {
        Commands::Import(args) => cli::import::execute(args, &config).await,
        Commands::Tint(args) => cli::tint::execute(args, &config).await,
        Commands::Serve(args) => cli::serve::execute(args).await,
        Commands::Convert(args) => cli::convert::execute(args, &config).await,
        Commands::ConvertServer(args) => cli::convert::serve(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, &config_path).await,
    }
}
