//! Pipeline run records
//!
//! A [`PipelineRun`] mirrors one row of the run journal. It is created in the
//! `running` state when orchestration starts and moves exactly once to a
//! terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Journal row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub i64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Orchestration in progress
    Running,
    /// All mandatory stages succeeded
    Completed,
    /// A mandatory stage failed
    Failed,
}

impl RunStatus {
    /// Value stored in the journal table
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Whether the run can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("Unknown run status '{other}'")),
        }
    }
}

/// Stage switches for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFlags {
    /// Fetch and extract source archives before promotion
    pub perform_downloads: bool,

    /// Republish layers after promotion
    pub publish_to_geoserver: bool,
}

impl Default for RunFlags {
    fn default() -> Self {
        Self {
            perform_downloads: true,
            publish_to_geoserver: true,
        }
    }
}

/// Row-level change counters reported by the database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub inserted: i64,
    pub deleted: i64,
    pub updated: i64,
}

impl ChangeCounts {
    /// Sum of all counters
    pub fn total(&self) -> i64 {
        self.inserted + self.deleted + self.updated
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every mandatory stage succeeded
    Completed,
    /// A mandatory stage failed with the given message
    Failed(String),
}

impl RunOutcome {
    /// Derive the outcome from a stage result
    pub fn from_result<T, E: fmt::Display>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => RunOutcome::Completed,
            Err(e) => RunOutcome::Failed(e.to_string()),
        }
    }

    /// Terminal status recorded for this outcome
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Completed => RunStatus::Completed,
            RunOutcome::Failed(_) => RunStatus::Failed,
        }
    }

    /// Error message, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed => None,
            RunOutcome::Failed(message) => Some(message.as_str()),
        }
    }
}

/// One journal row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub downloads_performed: bool,
    pub geoserver_published: bool,
    pub records_inserted: Option<i64>,
    pub records_deleted: Option<i64>,
    pub records_updated: Option<i64>,
    pub duration_seconds: Option<i64>,
}

impl PipelineRun {
    /// Create a freshly started run
    pub fn started(id: RunId, flags: RunFlags) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            completed_at: None,
            status: RunStatus::Running,
            error_message: None,
            downloads_performed: flags.perform_downloads,
            geoserver_published: false,
            records_inserted: None,
            records_deleted: None,
            records_updated: None,
            duration_seconds: None,
        }
    }

    /// Move the run to its terminal state
    ///
    /// Returns `false` without changing anything if the run was already finalized.
    pub fn finish(&mut self, outcome: &RunOutcome, counts: Option<ChangeCounts>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let now = Utc::now();
        self.completed_at = Some(now);
        self.status = outcome.status();
        self.error_message = outcome.error_message().map(str::to_string);
        self.records_inserted = counts.map(|c| c.inserted);
        self.records_deleted = counts.map(|c| c.deleted);
        self.records_updated = counts.map(|c| c.updated);
        self.duration_seconds = Some((now - self.started_at).num_seconds());
        true
    }
}
