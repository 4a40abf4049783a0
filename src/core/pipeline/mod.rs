//! Pipeline orchestration
//!
//! A run moves through `download? -> promote -> publish?`. Promotion always
//! runs. A download or promotion error fails the run; a publication error is
//! recorded in the journal and the run still completes. The run journal is
//! opened before the first stage and closed after the last one on every path,
//! including a shutdown signal arriving mid-run.

pub mod sources;
pub mod summary;

pub use sources::SourceIngest;
pub use summary::{IngestReport, RunSummary};

use crate::adapters::database::{create_database_backends, DatabaseBackends, StagingPromoter};
use crate::adapters::http::{ArchiveDownloader, HttpDownloader};
use crate::adapters::loader::Ogr2OgrLoader;
use crate::config::IngestConfig;
use crate::core::extract::Extractor;
use crate::core::feed::{ArchiveFetcher, FeedParser};
use crate::core::journal::{RunContext, RunJournal};
use crate::core::promote::promote;
use crate::core::publish::{GeoServerPublisher, LayerPublisher};
use crate::domain::{IngestError, LayerCatalogEntry, Result, RunFlags, RunOutcome};
use crate::{log_stage_complete, log_stage_start};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// The download and extraction stage
#[async_trait]
pub trait IngestStage: Send + Sync {
    /// Download every source and load it into staging
    ///
    /// # Errors
    ///
    /// Returns an error when the feed cannot be fetched, a single-archive
    /// download fails or any extraction fails.
    async fn ingest(&self) -> Result<IngestReport>;
}

/// Sequences one ingest run
pub struct Pipeline {
    journal: RunJournal,
    ingest: Arc<dyn IngestStage>,
    promoter: Arc<dyn StagingPromoter + Send + Sync>,
    publisher: Arc<dyn LayerPublisher>,
    catalog: Vec<LayerCatalogEntry>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Pipeline {
    /// Assemble a pipeline from its stages
    pub fn new(
        journal: RunJournal,
        ingest: Arc<dyn IngestStage>,
        promoter: Arc<dyn StagingPromoter + Send + Sync>,
        publisher: Arc<dyn LayerPublisher>,
        catalog: Vec<LayerCatalogEntry>,
    ) -> Self {
        Self {
            journal,
            ingest,
            promoter,
            publisher,
            catalog,
            shutdown: None,
        }
    }

    /// Stop the run when `shutdown` turns true
    ///
    /// The stage in progress is abandoned and the run is recorded as failed.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Wire the production pipeline from configuration
    ///
    /// Returns the database backends as well so callers can check the
    /// connection before running.
    ///
    /// # Errors
    ///
    /// Returns an error if any adapter cannot be created.
    pub fn from_config(config: &IngestConfig) -> Result<(Self, DatabaseBackends)> {
        let backends = create_database_backends(&config.database)?;

        let downloader: Arc<dyn ArchiveDownloader> =
            Arc::new(HttpDownloader::new(&config.download)?);
        let loader = Arc::new(Ogr2OgrLoader::new(config.loader.clone(), &config.database)?);

        let ingest = SourceIngest::new(
            FeedParser::new(downloader.clone(), config.download.parse_workers),
            ArchiveFetcher::new(
                downloader,
                config.download.max_concurrent,
                config.download.skip_existing_batch,
            ),
            Extractor::new(
                loader,
                config.database.staging_schema.clone(),
                config.loader.sql_template_dir.as_ref().map(PathBuf::from),
            ),
            config.sources.clone(),
            chrono::Local::now().date_naive(),
        );

        let publisher = GeoServerPublisher::new(
            &config.geoserver,
            &config.database,
            backends.extents.clone(),
        )?;

        let pipeline = Self::new(
            RunJournal::new(
                backends.journal.clone(),
                config.database.summary_window_minutes,
            ),
            Arc::new(ingest),
            backends.promoter.clone(),
            Arc::new(publisher),
            config.layers.clone(),
        );
        Ok((pipeline, backends))
    }

    /// Execute one run
    ///
    /// # Errors
    ///
    /// Returns an error if the journal record cannot be created, or the
    /// error of the download or promotion stage after the journal has
    /// recorded the run as failed. A shutdown signal yields
    /// [`IngestError::Interrupted`], recorded the same way.
    pub async fn run(&self, flags: RunFlags) -> Result<RunSummary> {
        tracing::info!(
            downloads = flags.perform_downloads,
            publish = flags.publish_to_geoserver,
            "Starting ingest pipeline"
        );

        let ctx = self.journal.start(flags).await?;
        let run_id = ctx.run_id();
        let started = Instant::now();

        let result = tokio::select! {
            result = self.run_stages(&ctx) => result,
            _ = wait_for_shutdown(self.shutdown.clone()) => {
                tracing::warn!(run_id = ?run_id, "Shutdown signal received, abandoning run");
                Err(IngestError::Interrupted("shutdown signal received".to_string()))
            }
        };
        let outcome = RunOutcome::from_result(&result);
        if let Err(e) = &result {
            tracing::error!(run_id = ?run_id, error = %e, "Run failed");
        }

        let counts = self.journal.complete(ctx, &outcome).await;

        let mut summary = result?;
        summary.counts = counts;
        summary.duration = started.elapsed();
        Ok(summary)
    }

    async fn run_stages(&self, ctx: &RunContext) -> Result<RunSummary> {
        let flags = ctx.flags();
        let mut summary = RunSummary::new(ctx.run_id(), flags);

        if flags.perform_downloads {
            let started = Instant::now();
            log_stage_start!("download");
            summary.ingest = Some(self.ingest.ingest().await?);
            log_stage_complete!("download", started.elapsed());
        } else {
            tracing::info!("Skipping download/extraction step");
        }

        promote(self.promoter.as_ref()).await?;

        if flags.publish_to_geoserver {
            let started = Instant::now();
            log_stage_start!("publish");
            match self.publisher.publish(&self.catalog).await {
                Ok(report) => {
                    report.log_summary();
                    self.journal.update_publish_status(ctx, true).await;
                    summary.published = Some(true);
                    summary.publish = Some(report);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Publishing failed");
                    self.journal.update_publish_status(ctx, false).await;
                    summary.published = Some(false);
                }
            }
            log_stage_complete!("publish", started.elapsed());
        } else {
            tracing::info!("Skipping publication step");
        }

        Ok(summary)
    }
}

/// Resolves once the shutdown flag is set; never resolves without a receiver
/// or after the sender is gone
async fn wait_for_shutdown(shutdown: Option<watch::Receiver<bool>>) {
    let Some(mut shutdown) = shutdown else {
        return std::future::pending().await;
    };
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
