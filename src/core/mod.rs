//! Core pipeline logic.
//!
//! This module contains the stages of an ingest run and their orchestration.
//!
//! # Modules
//!
//! - [`feed`] - ATOM feed parsing and concurrent archive downloads
//! - [`extract`] - Archive extraction and staging loads
//! - [`promote`] - Staging-to-production promotion
//! - [`publish`] - Layer publication to the map server
//! - [`journal`] - Run journal
//! - [`pipeline`] - Orchestration
//!
//! # Run Workflow
//!
//! 1. **Journal**: Record the run as `running`
//! 2. **Download** (optional): Parse the feed, fetch archives concurrently,
//!    fetch the AU and AD archives, extract everything into staging
//! 3. **Promote**: Merge staging into production in one database call
//! 4. **Publish** (optional): Create or update the map server layers
//! 5. **Journal**: Record the final status and change counts
//!
//! # Example
//!
//! ```rust,no_run
//! use cadastre_ingest::config::load_config;
//! use cadastre_ingest::core::pipeline::Pipeline;
//! use cadastre_ingest::domain::RunFlags;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cadastre-ingest.toml")?;
//! let (pipeline, _backends) = Pipeline::from_config(&config)?;
//!
//! let summary = pipeline.run(RunFlags::default()).await?;
//! summary.log_summary();
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod feed;
pub mod journal;
pub mod pipeline;
pub mod promote;
pub mod publish;
