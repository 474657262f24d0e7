//! Hangar CLI - ingestion pipeline for aviation photo uploads.
//!
//! Hangar validates an image (plus an optional RAW sidecar), extracts EXIF
//! metadata, normalizes orientation and size, renders thumbnails and records
//! the photo in a local SQLite database.
//!
//! # Usage
//!
//! ```bash
//! # Ingest a photo
//! hangar ingest concorde.jpg --title "Concorde at LHR" --tags concorde,lhr
//!
//! # Check a file and dump its EXIF without storing anything
//! hangar inspect concorde.jpg
//!
//! # Read or remove a stored photo
//! hangar show 42
//! hangar remove 42
//!
//! # View configuration
//! hangar config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Hangar - ingestion pipeline for aviation photo uploads.
#[derive(Parser, Debug)]
#[command(name = "hangar")]
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
    #[arg(long, global = true, env = "HANGAR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a photo through the full pipeline
    Ingest(cli::ingest::IngestArgs),

    /// Validate a file and print its EXIF metadata without storing it
    Inspect(cli::inspect::InspectArgs),

    /// Print a stored photo
    Show(cli::photo::PhotoArgs),

    /// Delete a stored photo and its files
    Remove(cli::photo::PhotoArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(cli::expand_path)
        .unwrap_or_else(hangar_core::Config::default_path);

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = if config_path.exists() {
        match hangar_core::Config::load_from(&config_path) {
            Ok(config) => config,
            Err(e) if cli.config.is_none() => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `hangar config path`."
                );
                hangar_core::Config::default()
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        hangar_core::Config::default()
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Hangar v{}", hangar_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Ingest(args) => cli::ingest::execute(args, config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, config).await,
        Commands::Show(args) => cli::photo::show(args, config).await,
        Commands::Remove(args) => cli::photo::remove(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, &config_path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ingest_with_optional_fields() {
        let cli = Cli::try_parse_from([
            "hangar",
            "ingest",
            "a.jpg",
            "--title",
            "Spitfire",
            "--raw",
            "a.nef",
            "--tags",
            "warbird,duxford",
            "--registration",
            "G-AIST",
        ])
        .unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.title, "Spitfire");
                assert_eq!(args.raw, Some(PathBuf::from("a.nef")));
                assert_eq!(args.registration.as_deref(), Some("G-AIST"));
                assert_eq!(args.category, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ingest_requires_title() {
        assert!(Cli::try_parse_from(["hangar", "ingest", "a.jpg"]).is_err());
    }
}
