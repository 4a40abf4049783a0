//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the ingest pipeline
//! using clap.

pub mod commands;

use crate::domain::IngestError;
use clap::{Parser, Subcommand};

/// Exit code for a successful command
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for configuration errors
pub const EXIT_CONFIGURATION: i32 = 2;

/// Exit code for database or remote service connection errors
pub const EXIT_CONNECTION: i32 = 4;

/// Exit code for failed runs and other fatal errors
pub const EXIT_FATAL: i32 = 5;

/// Cadastre Ingest - Croatian cadastral data ETL pipeline
#[derive(Parser, Debug)]
#[command(name = "cadastre-ingest")]
#[command(version, about, long_about = None)]
#[command(author = "Cadastre Ingest Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "cadastre-ingest.toml",
        env = "CADASTRE_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CADASTRE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline once: download, promote, publish
    Ingest(commands::ingest::IngestArgs),

    /// Publish the layer catalog to GeoServer without ingesting
    Publish(commands::publish::PublishArgs),

    /// Show the most recent pipeline runs
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}

/// Exit code for an error raised while a command sets up or queries
pub fn setup_exit_code(error: &IngestError) -> i32 {
    match error {
        IngestError::Configuration(_) | IngestError::Validation(_) => EXIT_CONFIGURATION,
        e if e.is_connection() => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_cli_parse_ingest() {
        let cli = Cli::parse_from(["cadastre-ingest", "ingest"]);
        assert_eq!(cli.config, "cadastre-ingest.toml");
        match cli.command {
            Commands::Ingest(args) => {
                assert!(!args.skip_download);
                assert!(!args.skip_publish);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_ingest_skip_flags() {
        let cli = Cli::parse_from([
            "cadastre-ingest",
            "ingest",
            "--skip-download",
            "--skip-publish",
        ]);
        match cli.command {
            Commands::Ingest(args) => {
                let flags = args.run_flags();
                assert!(!flags.perform_downloads);
                assert!(!flags.publish_to_geoserver);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["cadastre-ingest", "--config", "custom.toml", "publish"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Publish(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["cadastre-ingest", "-l", "debug", "ingest"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["cadastre-ingest", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status_limit() {
        let cli = Cli::parse_from(["cadastre-ingest", "status", "--limit", "3"]);
        match cli.command {
            Commands::Status(args) => assert_eq!(args.limit, 3),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["cadastre-ingest", "export"]).is_err());
    }

    #[test_case(IngestError::Configuration("bad".into()) => EXIT_CONFIGURATION; "configuration")]
    #[test_case(IngestError::Validation("bad".into()) => EXIT_CONFIGURATION; "validation")]
    #[test_case(IngestError::Connection("refused".into()) => EXIT_CONNECTION; "connection")]
    #[test_case(IngestError::Database("relation missing".into()) => EXIT_FATAL; "database")]
    #[test_case(IngestError::Http("502".into()) => EXIT_CONNECTION; "http")]
    #[test_case(IngestError::Loader("exit 1".into()) => EXIT_FATAL; "loader")]
    fn test_setup_exit_code(error: IngestError) -> i32 {
        setup_exit_code(&error)
    }
}
