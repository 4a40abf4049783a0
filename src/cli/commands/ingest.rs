//! Ingest command implementation
//!
//! This module implements the `ingest` command, which runs the whole
//! pipeline once. Cron or a systemd timer invokes it on a schedule.

use crate::cli::{setup_exit_code, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::pipeline::{Pipeline, RunSummary};
use crate::domain::RunFlags;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Skip downloading and extracting source archives
    #[arg(long)]
    pub skip_download: bool,

    /// Skip publishing layers to GeoServer
    #[arg(long)]
    pub skip_publish: bool,
}

impl IngestArgs {
    /// Stage switches selected on the command line
    pub fn run_flags(&self) -> RunFlags {
        RunFlags {
            perform_downloads: !self.skip_download,
            publish_to_geoserver: !self.skip_publish,
        }
    }

    /// Execute the ingest command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting ingest command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(setup_exit_code(&e));
            }
        };

        let (pipeline, backends) = match Pipeline::from_config(&config) {
            Ok((pipeline, backends)) => (pipeline.with_shutdown(shutdown_signal), backends),
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize pipeline");
                eprintln!("Failed to initialize pipeline: {e}");
                return Ok(setup_exit_code(&e));
            }
        };

        if let Err(e) = backends.client.test_connection().await {
            tracing::error!(
                database = %backends.client.connection_string_safe(),
                error = %e,
                "Database connection failed"
            );
            eprintln!("Failed to connect to database: {e}");
            return Ok(setup_exit_code(&e));
        }

        match pipeline.run(self.run_flags()).await {
            Ok(summary) => {
                summary.log_summary();
                print_summary(&summary);
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Pipeline run failed: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    match summary.run_id {
        Some(id) => println!("Run #{id} completed in {:.1}s", summary.duration.as_secs_f64()),
        None => println!("Run completed in {:.1}s", summary.duration.as_secs_f64()),
    }

    if let Some(ingest) = &summary.ingest {
        println!(
            "  Archives: {} advertised, {} downloaded, {} extracted",
            ingest.archives_requested, ingest.archives_downloaded, ingest.archives_extracted
        );
        println!("  Datasets loaded: {}", ingest.datasets_loaded);
    } else {
        println!("  Downloads: skipped");
    }

    if let Some(counts) = &summary.counts {
        println!(
            "  Changes: {} inserted, {} updated, {} deleted",
            counts.inserted, counts.updated, counts.deleted
        );
    }

    match (summary.published, &summary.publish) {
        (None, _) => println!("  Publication: skipped"),
        (Some(false), _) => println!("  Publication: failed"),
        (Some(true), Some(report)) => println!(
            "  Publication: {} created, {} updated, {} failed",
            report.created.len(),
            report.updated.len(),
            report.failed.len()
        ),
        (Some(true), None) => println!("  Publication: done"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(false, false => (true, true); "full run")]
    #[test_case(true, false => (false, true); "skip download")]
    #[test_case(false, true => (true, false); "skip publish")]
    #[test_case(true, true => (false, false); "promote only")]
    fn test_run_flags(skip_download: bool, skip_publish: bool) -> (bool, bool) {
        let flags = IngestArgs {
            skip_download,
            skip_publish,
        }
        .run_flags();
        (flags.perform_downloads, flags.publish_to_geoserver)
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = IngestArgs {
            skip_download: true,
            skip_publish: true,
        };
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let code = args
            .execute("/nonexistent/cadastre-ingest.toml", shutdown_rx)
            .await
            .unwrap();
        assert_eq!(code, crate::cli::EXIT_CONFIGURATION);
    }
}
