//! Publish command implementation
//!
//! This module implements the `publish` command, which republishes the layer
//! catalog without downloading or promoting. No journal record is written.

use crate::adapters::database::create_database_backends;
use crate::cli::{setup_exit_code, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::publish::{GeoServerPublisher, LayerPublisher};
use clap::Args;

/// Arguments for the publish command
#[derive(Args, Debug)]
pub struct PublishArgs {}

impl PublishArgs {
    /// Execute the publish command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting publish command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(setup_exit_code(&e));
            }
        };

        let backends = match create_database_backends(&config.database) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Failed to create database client: {e}");
                return Ok(setup_exit_code(&e));
            }
        };
        if let Err(e) = backends.client.test_connection().await {
            eprintln!("Failed to connect to database: {e}");
            return Ok(setup_exit_code(&e));
        }

        let publisher = match GeoServerPublisher::new(
            &config.geoserver,
            &config.database,
            backends.extents.clone(),
        ) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to create GeoServer client: {e}");
                return Ok(setup_exit_code(&e));
            }
        };

        println!(
            "Publishing {} layer(s) to {}",
            config.layers.len(),
            config.geoserver.url
        );

        match publisher.publish(&config.layers).await {
            Ok(report) => {
                report.log_summary();
                println!(
                    "Created {}, updated {}, failed {}",
                    report.created.len(),
                    report.updated.len(),
                    report.failed.len()
                );
                for failure in &report.failed {
                    println!("  {}: {}", failure.layer, failure.message);
                }
                if report.is_complete() {
                    Ok(EXIT_SUCCESS)
                } else {
                    Ok(EXIT_FATAL)
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Publishing failed");
                eprintln!("Publishing failed: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}
