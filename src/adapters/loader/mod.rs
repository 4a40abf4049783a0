//! Bulk loading of extracted vector files into staging tables
//!
//! The [`BulkLoader`] trait is the seam between archive extraction and the
//! external loader process. [`Ogr2OgrLoader`] drives GDAL's `ogr2ogr`.

pub mod ogr2ogr;

pub use ogr2ogr::Ogr2OgrLoader;

use crate::domain::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Where the projection SQL of a load comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlSource {
    /// SQL text passed on the command line
    Inline(String),

    /// SQL read by the loader from a file
    File(PathBuf),
}

/// One file loaded into one staging table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    /// Extracted source file
    pub source_file: PathBuf,

    /// Projection onto the staging columns
    pub sql: SqlSource,

    /// Schema-qualified target table
    pub table: String,
}

/// Appends the rows of a source file to a staging table
#[async_trait]
pub trait BulkLoader: Send + Sync {
    /// Run a single load job
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Loader`](crate::domain::IngestError::Loader)
    /// when the load does not complete.
    async fn load(&self, job: &LoadJob) -> Result<()>;
}
