//! Status command implementation
//!
//! This module implements the `status` command for displaying the most
//! recent pipeline runs recorded in the journal.

use crate::adapters::database::create_database_backends;
use crate::cli::{setup_exit_code, EXIT_SUCCESS};
use crate::config::load_config;
use crate::domain::{PipelineRun, RunStatus};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: i64,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(limit = self.limit, "Checking run status");

        println!("Pipeline Runs");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(setup_exit_code(&e));
            }
        };

        let backends = match create_database_backends(&config.database) {
            Ok(b) => b,
            Err(e) => {
                println!("Failed to create database client");
                println!("   Error: {}", e);
                return Ok(setup_exit_code(&e));
            }
        };

        if let Err(e) = backends.client.test_connection().await {
            println!("Failed to connect to database");
            println!("   Error: {}", e);
            return Ok(setup_exit_code(&e));
        }

        let runs = match backends.journal.recent_runs(self.limit.max(1)).await {
            Ok(r) => r,
            Err(e) => {
                println!("Failed to load pipeline runs");
                println!("   Error: {}", e);
                return Ok(setup_exit_code(&e));
            }
        };

        if runs.is_empty() {
            println!("No pipeline runs found.");
            println!("Run 'cadastre-ingest ingest' to start the first run.");
            return Ok(EXIT_SUCCESS);
        }

        println!(
            "{:<8} {:<20} {:<11} {:<10} {:<10} {:>10} {:>10} {:>10} {:>9}",
            "Run", "Started", "Status", "Downloads", "Published", "Inserted", "Updated", "Deleted",
            "Duration"
        );
        println!("{}", "-".repeat(104));

        for run in &runs {
            println!("{}", format_row(run));
            if let Some(message) = &run.error_message {
                println!("         error: {message}");
            }
        }

        println!();
        Ok(EXIT_SUCCESS)
    }
}

fn format_row(run: &PipelineRun) -> String {
    let status = match run.status {
        RunStatus::Completed => "completed",
        RunStatus::Running => "running",
        RunStatus::Failed => "FAILED",
    };
    let count = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
    let duration = run
        .duration_seconds
        .map(|s| format!("{}s", s))
        .unwrap_or_else(|| "-".into());

    format!(
        "{:<8} {:<20} {:<11} {:<10} {:<10} {:>10} {:>10} {:>10} {:>9}",
        format!("#{}", run.id),
        run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        status,
        yes_no(run.downloads_performed),
        yes_no(run.geoserver_published),
        count(run.records_inserted),
        count(run.records_updated),
        count(run.records_deleted),
        duration
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
