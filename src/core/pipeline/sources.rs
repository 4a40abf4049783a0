//! Download and extraction of all national sources

use super::summary::IngestReport;
use super::IngestStage;
use crate::config::SourcesConfig;
use crate::core::extract::Extractor;
use crate::core::feed::{feed_cache_path, ArchiveFetcher, FeedParser};
use crate::domain::{ArchiveKind, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Fetches the cadastral feed archives plus the AU and AD archives and
/// extracts each of them into staging
pub struct SourceIngest {
    parser: FeedParser,
    fetcher: ArchiveFetcher,
    extractor: Extractor,
    sources: SourcesConfig,
    run_date: NaiveDate,
}

impl SourceIngest {
    /// Create the stage
    ///
    /// Downloads land in `<downloads_dir>/<kind>/<run_date>/`.
    pub fn new(
        parser: FeedParser,
        fetcher: ArchiveFetcher,
        extractor: Extractor,
        sources: SourcesConfig,
        run_date: NaiveDate,
    ) -> Self {
        Self {
            parser,
            fetcher,
            extractor,
            sources,
            run_date,
        }
    }

    /// Dated download directory for an archive kind
    pub fn download_dir(&self, kind: ArchiveKind) -> PathBuf {
        PathBuf::from(&self.sources.downloads_dir)
            .join(kind.directory())
            .join(self.run_date.format("%Y-%m-%d").to_string())
    }

    async fn ingest_cadastral(&self, report: &mut IngestReport) -> Result<()> {
        let dir = self.download_dir(ArchiveKind::Cadastral);
        tokio::fs::create_dir_all(&dir).await?;

        let document = self
            .parser
            .fetch_feed(
                &self.sources.cadastral_feed_url,
                &feed_cache_path(&dir, self.run_date),
            )
            .await?;
        let entries = self.parser.parse_entries(&document)?;
        report.archives_requested = entries.len();

        let artifacts = self.fetcher.fetch_all(entries, &dir).await;
        report.archives_downloaded = artifacts.len();

        for artifact in artifacts {
            tracing::info!(archive = %artifact.path().display(), "Extracting cadastral archive");
            let datasets = self
                .extractor
                .extract(ArchiveKind::Cadastral, artifact)
                .await?;
            report.record_extraction(datasets);
        }
        Ok(())
    }

    async fn ingest_single(
        &self,
        kind: ArchiveKind,
        url: &str,
        report: &mut IngestReport,
    ) -> Result<()> {
        tracing::info!(kind = %kind, url = %url, "Downloading dataset");
        let artifact = self.fetcher.fetch_single(url, &self.download_dir(kind)).await?;
        let datasets = self.extractor.extract(kind, artifact).await?;
        report.record_extraction(datasets);
        Ok(())
    }
}

#[async_trait]
impl IngestStage for SourceIngest {
    async fn ingest(&self) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        self.ingest_cadastral(&mut report).await?;
        self.ingest_single(
            ArchiveKind::AdministrativeUnits,
            &self.sources.administrative_units_url,
            &mut report,
        )
        .await?;
        self.ingest_single(
            ArchiveKind::Addresses,
            &self.sources.addresses_url,
            &mut report,
        )
        .await?;

        Ok(report)
    }
}
