//! Run journal
//!
//! Every pipeline run owns one [`RunContext`], created by
//! [`RunJournal::start`] and consumed by [`RunJournal::complete`]. Completion
//! never fails: bookkeeping errors are logged and the run's own result is
//! left untouched.

use crate::adapters::database::JournalStorage;
use crate::domain::{ChangeCounts, Result, RunFlags, RunId, RunOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Journal handle for one run
#[derive(Debug)]
pub struct RunContext {
    run_id: Option<RunId>,
    flags: RunFlags,
    started: Instant,
}

impl RunContext {
    fn recorded(run_id: RunId, flags: RunFlags) -> Self {
        Self {
            run_id: Some(run_id),
            flags,
            started: Instant::now(),
        }
    }

    /// Context for a run without a journal record
    ///
    /// Completing it only logs a warning.
    pub fn detached(flags: RunFlags) -> Self {
        Self {
            run_id: None,
            flags,
            started: Instant::now(),
        }
    }

    /// Journal record identifier, if the run was recorded
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    /// Flags the run was started with
    pub fn flags(&self) -> RunFlags {
        self.flags
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Records run lifecycles in [`JournalStorage`]
#[derive(Clone)]
pub struct RunJournal {
    storage: Arc<dyn JournalStorage + Send + Sync>,
    summary_window_minutes: u32,
}

impl RunJournal {
    /// Create a journal summing change counts over `summary_window_minutes`
    pub fn new(storage: Arc<dyn JournalStorage + Send + Sync>, summary_window_minutes: u32) -> Self {
        Self {
            storage,
            summary_window_minutes,
        }
    }

    /// Record the start of a run
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be inserted; the run must not
    /// proceed untracked.
    pub async fn start(&self, flags: RunFlags) -> Result<RunContext> {
        let run_id = self.storage.insert_run(flags).await?;
        tracing::info!(
            run_id = %run_id,
            downloads = flags.perform_downloads,
            publish = flags.publish_to_geoserver,
            "Started run #{}",
            run_id
        );
        Ok(RunContext::recorded(run_id, flags))
    }

    /// Record whether publication succeeded
    ///
    /// Failures are logged only.
    pub async fn update_publish_status(&self, ctx: &RunContext, published: bool) {
        let Some(run_id) = ctx.run_id else {
            return;
        };
        if let Err(e) = self.storage.update_publish_status(run_id, published).await {
            tracing::error!(run_id = %run_id, error = %e, "Failed to record publish status");
        }
    }

    /// Change counts written by the most recent promotion
    ///
    /// Sums the per-table journal entries inside the configured window
    /// before the newest entry. This approximates the effect of the current
    /// run; it is not an exact per-run count.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary query fails.
    pub async fn summarize(&self) -> Result<ChangeCounts> {
        self.storage
            .summarize_changes(self.summary_window_minutes)
            .await
    }

    /// Finalize the run record
    ///
    /// Consumes the context so a run is completed at most once. Returns the
    /// change counts that were recorded, if any.
    pub async fn complete(&self, ctx: RunContext, outcome: &RunOutcome) -> Option<ChangeCounts> {
        let Some(run_id) = ctx.run_id else {
            tracing::warn!("Attempted to complete a run that was never recorded");
            return None;
        };

        let counts = match self.summarize().await {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Failed to summarize changes, recording run without counts");
                None
            }
        };

        match self.storage.complete_run(run_id, outcome, counts).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %run_id,
                    status = %outcome.status(),
                    duration_secs = ctx.elapsed().as_secs(),
                    "Completed run #{} with status: {}",
                    run_id,
                    outcome.status()
                );
                counts
            }
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "Failed to complete run tracking");
                None
            }
        }
    }
}
