//! `ogr2ogr` process invocation

use super::{BulkLoader, LoadJob, SqlSource};
use crate::adapters::postgresql::ConnectionParameters;
use crate::config::{DatabaseConfig, LoaderConfig, SecretString};
use crate::domain::{IngestError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Loads GML files into PostGIS with GDAL's `ogr2ogr`
pub struct Ogr2OgrLoader {
    config: LoaderConfig,
    connection: SecretString,
}

impl Ogr2OgrLoader {
    /// Create a loader writing to the configured database
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection string cannot be parsed.
    pub fn new(config: LoaderConfig, database: &DatabaseConfig) -> Result<Self> {
        let connection = ConnectionParameters::from_config(database)?.keyword_string();
        Ok(Self::with_connection(config, connection))
    }

    /// Create a loader with a ready-made libpq keyword string
    pub fn with_connection(config: LoaderConfig, connection: SecretString) -> Self {
        Self { config, connection }
    }

    /// Command-line arguments for a job, the datasource included
    pub fn build_args(&self, job: &LoadJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            "PostgreSQL".into(),
            format!("PG:{}", self.connection.expose_secret().as_ref()).into(),
            job.source_file.clone().into_os_string(),
            "-append".into(),
            "-dialect".into(),
            "SQLite".into(),
            "-sql".into(),
        ];

        match &job.sql {
            SqlSource::Inline(sql) => args.push(sql.into()),
            SqlSource::File(path) => {
                let mut arg = OsString::from("@");
                arg.push(path.as_os_str());
                args.push(arg);
            }
        }

        args.push("-nln".into());
        args.push(job.table.as_str().into());

        if self.config.promote_to_multi {
            args.push("-nlt".into());
            args.push("PROMOTE_TO_MULTI".into());
        }

        args.push("-lco".into());
        args.push(format!("ENCODING={}", self.config.encoding).into());

        if self.config.use_copy {
            args.push("--config".into());
            args.push("PG_USE_COPY".into());
            args.push("YES".into());
        }

        args
    }
}

#[async_trait]
impl BulkLoader for Ogr2OgrLoader {
    async fn load(&self, job: &LoadJob) -> Result<()> {
        let started = Instant::now();
        tracing::debug!(
            program = %self.config.program,
            source = %job.source_file.display(),
            table = %job.table,
            "Starting bulk load"
        );

        let output = Command::new(&self.config.program)
            .args(self.build_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                IngestError::Loader(format!(
                    "Failed to start {} for {}: {}",
                    self.config.program, job.table, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::Loader(format!(
                "{} exited with {} while loading {} into {}: {}",
                self.config.program,
                output.status,
                job.source_file.display(),
                job.table,
                stderr.trim()
            )));
        }

        tracing::debug!(
            table = %job.table,
            duration_ms = started.elapsed().as_millis() as u64,
            "Bulk load finished"
        );
        Ok(())
    }
}
