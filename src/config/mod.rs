//! Configuration management for the ingest pipeline.
//!
//! TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CADASTRE_<SECTION>_<KEY>` environment overrides
//! - Default values for every optional setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cadastre_ingest::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cadastre-ingest.toml")?;
//! println!("Feed: {}", config.sources.cadastral_feed_url);
//! println!("Max concurrent downloads: {}", config.download.max_concurrent);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SourcesConfig`] - Feed and archive URLs, download directory
//! - [`DownloadConfig`] - Concurrency, timeouts, skip-existing behaviour
//! - [`DatabaseConfig`] - PostgreSQL connection, promotion routine, journal
//! - [`LoaderConfig`] - ogr2ogr invocation
//! - [`GeoServerConfig`] - Map server publication
//! - `[[layers]]` - Layer catalog ([`LayerCatalogEntry`](crate::domain::LayerCatalogEntry))
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [download]
//! max_concurrent = 5
//!
//! [database]
//! connection_string = "${CADASTRE_DATABASE_URL}"
//!
//! [geoserver]
//! url = "http://geoserver:8080/geoserver"
//! password = "${GEOSERVER_PASSWORD}"
//!
//! [[layers]]
//! id = "cadastral_parcels"
//! wms_name = "cadastral_parcels"
//! native_table = "gs.v_cadastral_parcels"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, DatabaseConfig, DownloadConfig, GeoServerConfig, IngestConfig,
    LatLonBoundingBox, LoaderConfig, LoggingConfig, SourcesConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
