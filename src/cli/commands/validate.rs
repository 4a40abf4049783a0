//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the configuration file.

use crate::adapters::postgresql::ConnectionParameters;
use crate::cli::{EXIT_CONFIGURATION, EXIT_SUCCESS};
use crate::config::{load_config, IngestConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIGURATION);
            }
        };

        println!("Configuration is valid");
        println!();
        print_summary(&config);
        Ok(EXIT_SUCCESS)
    }
}

fn print_summary(config: &IngestConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Cadastral Feed: {}", config.sources.cadastral_feed_url);
    println!(
        "  Administrative Units: {}",
        config.sources.administrative_units_url
    );
    println!("  Addresses: {}", config.sources.addresses_url);
    println!("  Downloads Directory: {}", config.sources.downloads_dir);
    println!("  Max Concurrent Downloads: {}", config.download.max_concurrent);

    match ConnectionParameters::from_config(&config.database) {
        Ok(params) => println!(
            "  Database: {}:{}/{} as {}",
            params.host, params.port, params.dbname, params.user
        ),
        Err(e) => println!("  Database: unparseable connection string ({e})"),
    }
    println!("  Staging Schema: {}", config.database.staging_schema);
    println!(
        "  Promotion Routine: {}()",
        config.database.promotion_routine
    );
    println!("  Loader: {}", config.loader.program);
    println!("  GeoServer: {}", config.geoserver.url);
    println!(
        "  Workspace/Datastore: {}/{}",
        config.geoserver.workspace, config.geoserver.datastore
    );
    println!("  Layers: {}", config.layers.len());
    for layer in &config.layers {
        println!("    {} -> {}", layer.wms_name, layer.native_table);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_validate_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\nconnection_string = \"postgresql://etl:secret@db:5432/cadastre\""
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\nconnection_string = \"postgresql://db/cadastre\"\n\n[download]\nmax_concurrent = 0"
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIGURATION);
    }
}
