//! Run summaries and reporting

use crate::core::publish::PublishReport;
use crate::domain::{ChangeCounts, RunFlags, RunId};
use std::time::Duration;

/// Result of the download and extraction stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Cadastral archives advertised by the feed
    pub archives_requested: usize,

    /// Cadastral archives downloaded or reused from disk
    pub archives_downloaded: usize,

    /// Archives extracted into staging, single-archive datasets included
    pub archives_extracted: usize,

    /// Staging datasets loaded across all archives
    pub datasets_loaded: usize,
}

impl IngestReport {
    /// Fold the extraction of one archive into the report
    pub fn record_extraction(&mut self, datasets: usize) {
        self.archives_extracted += 1;
        self.datasets_loaded += datasets;
    }

    /// Archives that were advertised but not downloaded
    pub fn missing_archives(&self) -> usize {
        self.archives_requested.saturating_sub(self.archives_downloaded)
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Journal record of the run
    pub run_id: Option<RunId>,

    /// Flags the run was started with
    pub flags: RunFlags,

    /// Download and extraction results, when that stage ran
    pub ingest: Option<IngestReport>,

    /// Publication results, when publication succeeded
    pub publish: Option<PublishReport>,

    /// Publish status recorded in the journal (`None` when skipped)
    pub published: Option<bool>,

    /// Change counts recorded in the journal
    pub counts: Option<ChangeCounts>,

    /// Duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Create an empty summary for a run
    pub fn new(run_id: Option<RunId>, flags: RunFlags) -> Self {
        Self {
            run_id,
            flags,
            ingest: None,
            publish: None,
            published: None,
            counts: None,
            duration: Duration::from_secs(0),
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        let run_id = self
            .run_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::info!(
            run_id = %run_id,
            downloads = self.flags.perform_downloads,
            publish = self.flags.publish_to_geoserver,
            duration_secs = self.duration.as_secs(),
            "Pipeline complete"
        );

        if let Some(ingest) = &self.ingest {
            tracing::info!(
                requested = ingest.archives_requested,
                downloaded = ingest.archives_downloaded,
                extracted = ingest.archives_extracted,
                datasets = ingest.datasets_loaded,
                "Ingest stage results"
            );
            if ingest.missing_archives() > 0 {
                tracing::warn!(
                    missing = ingest.missing_archives(),
                    "Run completed with archives missing"
                );
            }
        }

        if let Some(counts) = &self.counts {
            tracing::info!(
                inserted = counts.inserted,
                deleted = counts.deleted,
                updated = counts.updated,
                "Recorded changes"
            );
        }

        if self.published == Some(false) {
            tracing::warn!("Layers were not published");
        }
    }
}
