//! Shared in-memory backends for integration tests
//!
//! Each test binary only uses part of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use cadastre_ingest::adapters::database::{ExtentSource, JournalStorage, StagingPromoter};
use cadastre_ingest::adapters::http::ArchiveDownloader;
use cadastre_ingest::adapters::loader::{BulkLoader, LoadJob};
use cadastre_ingest::core::pipeline::{IngestReport, IngestStage};
use cadastre_ingest::core::publish::{LayerPublisher, PublishReport};
use cadastre_ingest::domain::{
    ChangeCounts, Extent, IngestError, LayerCatalogEntry, PipelineRun, Result, RunFlags, RunId,
    RunOutcome,
};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Journal kept in memory, behaving like the journal table
#[derive(Default)]
pub struct MemoryJournal {
    pub runs: Mutex<Vec<PipelineRun>>,
    pub fail_insert: bool,
    pub completions: AtomicUsize,
}

impl MemoryJournal {
    pub fn failing_insert() -> Self {
        Self {
            fail_insert: true,
            ..Self::default()
        }
    }

    pub async fn only_run(&self) -> PipelineRun {
        let runs = self.runs.lock().await;
        assert_eq!(runs.len(), 1, "expected exactly one journal record");
        runs[0].clone()
    }
}

#[async_trait]
impl JournalStorage for MemoryJournal {
    async fn insert_run(&self, flags: RunFlags) -> Result<RunId> {
        if self.fail_insert {
            return Err(IngestError::Connection("journal unavailable".to_string()));
        }
        let mut runs = self.runs.lock().await;
        let id = RunId(runs.len() as i64 + 1);
        runs.push(PipelineRun::started(id, flags));
        Ok(id)
    }

    async fn complete_run(
        &self,
        run_id: RunId,
        outcome: &RunOutcome,
        counts: Option<ChangeCounts>,
    ) -> Result<()> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        let mut runs = self.runs.lock().await;
        let run = runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| IngestError::Journal(format!("no run {run_id}")))?;
        run.finish(outcome, counts);
        Ok(())
    }

    async fn update_publish_status(&self, run_id: RunId, published: bool) -> Result<()> {
        let mut runs = self.runs.lock().await;
        if let Some(run) = runs.iter_mut().find(|r| r.id == run_id) {
            run.geoserver_published = published;
        }
        Ok(())
    }

    async fn summarize_changes(&self, _window_minutes: u32) -> Result<ChangeCounts> {
        Ok(ChangeCounts {
            inserted: 5,
            deleted: 1,
            updated: 2,
        })
    }

    async fn recent_runs(&self, limit: i64) -> Result<Vec<PipelineRun>> {
        let runs = self.runs.lock().await;
        Ok(runs.iter().rev().take(limit as usize).cloned().collect())
    }
}

/// Promoter counting its invocations
#[derive(Default)]
pub struct CountingPromoter {
    pub calls: AtomicUsize,
    pub failure: Option<String>,
}

impl CountingPromoter {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StagingPromoter for CountingPromoter {
    async fn promote(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(IngestError::Database(message.clone())),
            None => Ok(()),
        }
    }
}

/// Ingest stage returning a canned report
///
/// A stalled stage never finishes on its own.
#[derive(Default)]
pub struct StubIngest {
    pub calls: AtomicUsize,
    pub failure: Option<String>,
    pub stall: bool,
}

impl StubIngest {
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestStage for StubIngest {
    async fn ingest(&self) -> Result<IngestReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(message) = &self.failure {
            return Err(IngestError::Extraction(message.clone()));
        }
        Ok(IngestReport {
            archives_requested: 2,
            archives_downloaded: 2,
            archives_extracted: 4,
            datasets_loaded: 13,
        })
    }
}

/// Publisher counting its invocations
#[derive(Default)]
pub struct StubPublisher {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl StubPublisher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LayerPublisher for StubPublisher {
    async fn publish(&self, catalog: &[LayerCatalogEntry]) -> Result<PublishReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(IngestError::Http("GeoServer unreachable".to_string()));
        }
        Ok(PublishReport {
            created: catalog.iter().map(|l| l.wms_name.clone()).collect(),
            ..PublishReport::default()
        })
    }
}

/// Extent source returning the same box for every table
pub struct FixedExtents(pub Extent);

#[async_trait]
impl ExtentSource for FixedExtents {
    async fn extent(&self, _schema: &str, _table: &str) -> Result<Extent> {
        Ok(self.0)
    }
}

/// Loader recording jobs, optionally failing for one table
#[derive(Default)]
pub struct RecordingLoader {
    pub jobs: Mutex<Vec<LoadJob>>,
    pub fail_table: Option<String>,
}

impl RecordingLoader {
    pub fn failing_on(table: &str) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail_table: Some(table.to_string()),
        }
    }

    pub async fn tables(&self) -> Vec<String> {
        self.jobs
            .lock()
            .await
            .iter()
            .map(|job| job.table.clone())
            .collect()
    }
}

#[async_trait]
impl BulkLoader for RecordingLoader {
    async fn load(&self, job: &LoadJob) -> Result<()> {
        self.jobs.lock().await.push(job.clone());
        if self.fail_table.as_deref() == Some(job.table.as_str()) {
            return Err(IngestError::Loader(format!(
                "ERROR 1: failed to load {}",
                job.table
            )));
        }
        Ok(())
    }
}

/// Downloader writing a small file after a delay, tracking concurrency
///
/// URLs containing `fail` produce an error and no file.
#[derive(Default)]
pub struct SlowDownloader {
    pub delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl SlowDownloader {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveDownloader for SlowDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.contains("fail") {
            return Err(IngestError::Http(format!("404 Not Found for {url}")));
        }
        tokio::fs::write(dest, url.as_bytes()).await?;
        Ok(url.len() as u64)
    }
}

/// Downloader serving a feed document and zip fixtures from memory
///
/// The feed URL yields `feed_xml`; AU and AD URLs yield archives with the
/// INSPIRE member files; every other URL yields a cadastral archive. URLs
/// containing `fail` produce an error and no file.
pub struct FixtureDownloader {
    pub feed_url: String,
    pub feed_xml: String,
    pub delay: Duration,
    urls: std::sync::Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FixtureDownloader {
    pub fn new(feed_url: &str, feed_xml: &str) -> Self {
        Self {
            feed_url: feed_url.to_string(),
            feed_xml: feed_xml.to_string(),
            delay: Duration::from_millis(20),
            urls: std::sync::Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Requested URLs in call order
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveDownloader for FixtureDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.urls.lock().unwrap().push(url.to_string());

        if url == self.feed_url {
            tokio::fs::write(dest, self.feed_xml.as_bytes()).await?;
            return Ok(self.feed_xml.len() as u64);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.contains("fail") {
            return Err(IngestError::Http(format!("503 Service Unavailable for {url}")));
        }

        let files: &[(&str, &str)] = if url.contains("(AU)") {
            &[("AU/AdministrativeUnits.gml", "<gml/>")]
        } else if url.contains("(AD)") {
            &[
                ("AD/Address.gml", "<gml/>"),
                ("AD/ThoroughfareName.gml", "<gml/>"),
                ("AD/PostalDescriptor.gml", "<gml/>"),
            ]
        } else {
            &[
                ("cadastral_municipalities.gml", "<gml/>"),
                ("cadastral_parcels.gml", "<gml/>"),
                ("buildings.gml", "<gml/>"),
            ]
        };
        write_zip(dest, files);
        Ok(std::fs::metadata(dest)?.len())
    }
}

/// Write a zip archive containing the given files
pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}
