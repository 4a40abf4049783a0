// Cadastre Ingest - Croatian cadastral data ETL pipeline
// Copyright (c) 2025 Cadastre Ingest Contributors
// Licensed under the MIT License

//! # Cadastre Ingest - Croatian cadastral data ETL
//!
//! Cadastre Ingest keeps a PostGIS database in sync with the national
//! cadastral, administrative-unit and address datasets and republishes the
//! resulting layers on GeoServer.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Discovering** per-municipality cadastral archives from the ATOM feed
//! - **Downloading** archives with bounded concurrency
//! - **Loading** the GML datasets into staging tables through `ogr2ogr`
//! - **Promoting** staging data into production with a database routine
//! - **Publishing** the layer catalog through the GeoServer REST API
//! - **Journaling** every run with its outcome and change counts
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline stages (feed, extract, promote, publish, journal, pipeline)
//! - [`adapters`] - External integrations (HTTP, PostgreSQL, ogr2ogr, GeoServer)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cadastre_ingest::config::load_config;
//! use cadastre_ingest::core::pipeline::Pipeline;
//! use cadastre_ingest::domain::RunFlags;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("cadastre-ingest.toml")?;
//!     let (pipeline, _backends) = Pipeline::from_config(&config)?;
//!
//!     let summary = pipeline.run(RunFlags::default()).await?;
//!     summary.log_summary();
//!     Ok(())
//! }
//! ```
//!
//! ## Run lifecycle
//!
//! A run is journaled as `running` before the first stage and finalized
//! exactly once. Downloads and publication can be skipped with
//! [`RunFlags`](domain::RunFlags); promotion always runs. A failed download
//! or promotion marks the run `failed` and is returned to the caller. A
//! failed publication only clears the journal's publish flag.
//!
//! ## Error Handling
//!
//! All library operations return [`domain::Result`], whose error type is
//! [`domain::IngestError`]:
//!
//! ```rust,no_run
//! use cadastre_ingest::domain::IngestError;
//!
//! fn example() -> Result<(), IngestError> {
//!     let config = cadastre_ingest::config::load_config("cadastre-ingest.toml")?;
//!     println!("{}", config.sources.cadastral_feed_url);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
