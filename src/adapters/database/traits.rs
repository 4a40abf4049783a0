//! Database abstraction traits
//!
//! This module defines the traits that database adapters must implement
//! to serve the ingest pipeline. Each trait covers one concern so tests can
//! replace a single backend with an in-memory version.

use crate::domain::{ChangeCounts, Extent, PipelineRun, Result, RunFlags, RunId, RunOutcome};
use async_trait::async_trait;

/// Persistent storage for the run journal
#[async_trait]
pub trait JournalStorage: Send + Sync {
    /// Insert a new record in the `running` state and return its identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be inserted.
    async fn insert_run(&self, flags: RunFlags) -> Result<RunId>;

    /// Finalize a record with its terminal status and change counts
    ///
    /// `counts` is `None` when the counts could not be collected; the
    /// corresponding columns are then left null.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be updated.
    async fn complete_run(
        &self,
        run_id: RunId,
        outcome: &RunOutcome,
        counts: Option<ChangeCounts>,
    ) -> Result<()>;

    /// Record whether publication to the map server succeeded
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be updated.
    async fn update_publish_status(&self, run_id: RunId, published: bool) -> Result<()>;

    /// Sum the change counts of per-table journal entries written during
    /// the last `window_minutes` before the newest entry
    ///
    /// # Errors
    ///
    /// Returns an error if the summary query fails.
    async fn summarize_changes(&self, window_minutes: u32) -> Result<ChangeCounts>;

    /// Most recent runs, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    async fn recent_runs(&self, limit: i64) -> Result<Vec<PipelineRun>>;
}

/// Applies staged data to the live tables
#[async_trait]
pub trait StagingPromoter: Send + Sync {
    /// Invoke the promotion routine
    ///
    /// # Errors
    ///
    /// Returns an error if the routine fails. Nothing is retried.
    async fn promote(&self) -> Result<()>;
}

/// Computes native bounding boxes of published tables
#[async_trait]
pub trait ExtentSource: Send + Sync {
    /// Bounding box of the geometry column of `schema.table`
    ///
    /// # Errors
    ///
    /// Returns an error if the extent query fails.
    async fn extent(&self, schema: &str, table: &str) -> Result<Extent>;
}
