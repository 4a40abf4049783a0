//! Archive extraction and schema-mapped staging loads
//!
//! Each archive is unpacked into its own temporary directory. Every dataset
//! its [`ArchiveKind`] declares is then loaded into `<staging_schema>.u_<dataset>`
//! through the [`BulkLoader`]. The first failed dataset aborts the rest of the
//! archive. The archive file is deleted when the artifact is dropped, on
//! every exit path.

pub mod archive;

use crate::adapters::loader::{BulkLoader, LoadJob, SqlSource};
use crate::domain::{ArchiveKind, Dataset, DownloadedArtifact, IngestError, Result};
use archive::{find_file, unzip};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Unpacks archives and loads their datasets into staging tables
pub struct Extractor {
    loader: Arc<dyn BulkLoader>,
    staging_schema: String,
    template_dir: Option<PathBuf>,
}

impl Extractor {
    /// Create an extractor
    ///
    /// When `template_dir` is set, `<template_dir>/<template>.sql` files
    /// replace the generated SQL of the datasets they name.
    pub fn new(
        loader: Arc<dyn BulkLoader>,
        staging_schema: impl Into<String>,
        template_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            loader,
            staging_schema: staging_schema.into(),
            template_dir,
        }
    }

    /// Extract one archive and load all of its datasets
    ///
    /// Takes ownership of the artifact; its file is gone when this returns.
    /// Returns the number of datasets loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be unpacked, an expected file
    /// is missing or a load fails. Remaining datasets are not attempted.
    pub async fn extract(&self, kind: ArchiveKind, artifact: DownloadedArtifact) -> Result<usize> {
        let started = Instant::now();

        let scratch = tempfile::Builder::new()
            .prefix("cadastre-ingest-")
            .tempdir()?;

        let datasets = kind.datasets();
        let archive_path = artifact.path().to_path_buf();
        let unpack_dir = scratch.path().to_path_buf();
        let (entries, sources) =
            tokio::task::spawn_blocking(move || unpack(&archive_path, &unpack_dir, datasets))
                .await
                .map_err(|e| IngestError::Extraction(format!("Unzip task failed: {}", e)))??;

        tracing::debug!(
            archive = %artifact.path().display(),
            kind = %kind,
            entries = entries,
            "Archive unpacked"
        );

        let mut loaded = 0;
        for (dataset, source) in datasets.iter().zip(sources) {
            self.load_dataset(*dataset, source).await?;
            loaded += 1;
        }

        tracing::info!(
            archive = %artifact.path().display(),
            kind = %kind,
            datasets = loaded,
            duration_ms = started.elapsed().as_millis() as u64,
            "Archive extracted"
        );
        Ok(loaded)
    }

    async fn load_dataset(&self, dataset: Dataset, source: Option<PathBuf>) -> Result<()> {
        let source_file = source.ok_or_else(|| {
            IngestError::Extraction(format!(
                "{} not found in archive for dataset {}",
                dataset.source_file(),
                dataset
            ))
        })?;

        let job = LoadJob {
            source_file,
            sql: self.sql_for(dataset).await?,
            table: format!("{}.{}", self.staging_schema, dataset.staging_table()),
        };

        self.loader.load(&job).await?;
        tracing::info!(
            dataset = %dataset,
            table = %job.table,
            "Parsed {} and loaded",
            dataset.source_file()
        );
        Ok(())
    }

    /// SQL for a dataset: a template file when one exists, else generated
    async fn sql_for(&self, dataset: Dataset) -> Result<SqlSource> {
        let Some(dir) = &self.template_dir else {
            return Ok(SqlSource::Inline(dataset.select_sql()));
        };

        let template = dir.join(format!("{}.sql", dataset.template_name()));
        let is_file = tokio::fs::metadata(&template)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Ok(SqlSource::Inline(dataset.select_sql()));
        }

        match dataset.admin_level() {
            Some(level) => {
                let text = tokio::fs::read_to_string(&template).await?;
                Ok(SqlSource::Inline(level.render(&text)))
            }
            None => Ok(SqlSource::File(template)),
        }
    }
}

/// Unzip the archive and locate each dataset's source file
///
/// Runs on a blocking thread; missing files come back as `None` so the
/// caller reports them in dataset order.
fn unpack(
    archive: &Path,
    dest: &Path,
    datasets: &[Dataset],
) -> Result<(usize, Vec<Option<PathBuf>>)> {
    let entries = unzip(archive, dest)?;
    let sources = datasets
        .iter()
        .map(|dataset| find_file(dest, dataset.source_file()))
        .collect();
    Ok((entries, sources))
}
