//! Domain models and types for the ingest pipeline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Feed types** ([`FeedEntry`], [`DownloadedArtifact`])
//! - **Dataset kinds** ([`ArchiveKind`], [`Dataset`]) with their fixed staging mappings
//! - **Layer catalog** ([`LayerCatalogEntry`])
//! - **Run journal records** ([`PipelineRun`], [`RunStatus`], [`RunFlags`], [`ChangeCounts`])
//! - **Error types** ([`IngestError`]) and the [`Result`] alias
//!
//! # Dataset kinds
//!
//! Dataset behaviour is a closed enum rather than string dispatch:
//!
//! ```rust
//! use cadastre_ingest::domain::{ArchiveKind, Dataset};
//!
//! let datasets = ArchiveKind::AdministrativeUnits.datasets();
//! assert_eq!(datasets.len(), 4);
//! assert_eq!(Dataset::Settlement.staging_table(), "u_settlement");
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`](Result):
//!
//! ```rust
//! use cadastre_ingest::domain::{IngestError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(IngestError::Validation("empty feed".to_string()))
//! }
//! ```

pub mod dataset;
pub mod errors;
pub mod feed;
pub mod layer;
pub mod result;
pub mod run;

// Re-export commonly used types for convenience
pub use dataset::{AdminLevel, ArchiveKind, ColumnMapping, Dataset};
pub use errors::IngestError;
pub use feed::{file_name_from_url, DownloadedArtifact, FeedEntry};
pub use layer::{default_catalog, Extent, LayerCatalogEntry};
pub use result::Result;
pub use run::{ChangeCounts, PipelineRun, RunFlags, RunId, RunOutcome, RunStatus};
