//! Run journal storage backed by PostgreSQL
//!
//! Runs live in `<journal_schema>.etl_runs`. Per-table change counts are
//! written by the promotion routine into `<journal_schema>.v_journals`.

use crate::adapters::database::traits::JournalStorage;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::domain::{
    ChangeCounts, IngestError, PipelineRun, Result, RunFlags, RunId, RunOutcome, RunStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::Row;

/// PostgreSQL implementation of [`JournalStorage`]
pub struct PostgresJournalStorage {
    client: Arc<PostgreSQLClient>,
    schema: String,
}

impl PostgresJournalStorage {
    /// Create journal storage over a shared client
    ///
    /// The schema name comes from `database.journal_schema` and is validated
    /// as a plain identifier when the configuration is loaded.
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        let schema = client.config().journal_schema.clone();
        Self { client, schema }
    }

    fn runs_table(&self) -> String {
        format!("{}.etl_runs", self.schema)
    }

    fn row_to_run(row: &Row) -> Result<PipelineRun> {
        let status: String = row.get("status");
        let status = status.parse::<RunStatus>().map_err(IngestError::Journal)?;

        Ok(PipelineRun {
            id: RunId(row.get("id")),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            status,
            error_message: row.get("error_message"),
            downloads_performed: row.get("downloads_performed"),
            geoserver_published: row.get("geoserver_published"),
            records_inserted: row.get("records_inserted"),
            records_deleted: row.get("records_deleted"),
            records_updated: row.get("records_updated"),
            duration_seconds: row.get("duration_seconds"),
        })
    }
}

#[async_trait]
impl JournalStorage for PostgresJournalStorage {
    async fn insert_run(&self, flags: RunFlags) -> Result<RunId> {
        let statement = format!(
            "INSERT INTO {} (started_at, status, downloads_performed, geoserver_published) \
             VALUES (CURRENT_TIMESTAMP, 'running', $1, false) RETURNING id::BIGINT",
            self.runs_table()
        );

        let rows = self
            .client
            .query(&statement, &[&flags.perform_downloads])
            .await
            .map_err(|e| IngestError::Journal(format!("Failed to record run start: {}", e)))?;

        let row = rows.first().ok_or_else(|| {
            IngestError::Journal("Run insert returned no identifier".to_string())
        })?;

        Ok(RunId(row.get(0)))
    }

    async fn complete_run(
        &self,
        run_id: RunId,
        outcome: &RunOutcome,
        counts: Option<ChangeCounts>,
    ) -> Result<()> {
        let statement = format!(
            "UPDATE {} SET completed_at = CURRENT_TIMESTAMP, status = $2, error_message = $3, \
             records_inserted = $4::BIGINT, records_deleted = $5::BIGINT, \
             records_updated = $6::BIGINT, \
             duration_seconds = EXTRACT(EPOCH FROM (CURRENT_TIMESTAMP - started_at))::INTEGER \
             WHERE id = $1",
            self.runs_table()
        );

        let status = outcome.status().as_str();
        let error_message = outcome.error_message();
        let inserted = counts.map(|c| c.inserted);
        let deleted = counts.map(|c| c.deleted);
        let updated = counts.map(|c| c.updated);

        let affected = self
            .client
            .execute(
                &statement,
                &[
                    &run_id.0,
                    &status,
                    &error_message,
                    &inserted,
                    &deleted,
                    &updated,
                ],
            )
            .await
            .map_err(|e| IngestError::Journal(format!("Failed to complete run {}: {}", run_id, e)))?;

        if affected == 0 {
            return Err(IngestError::Journal(format!("Run {} not found", run_id)));
        }
        Ok(())
    }

    async fn update_publish_status(&self, run_id: RunId, published: bool) -> Result<()> {
        let statement = format!(
            "UPDATE {} SET geoserver_published = $2 WHERE id = $1",
            self.runs_table()
        );

        self.client
            .execute(&statement, &[&run_id.0, &published])
            .await
            .map_err(|e| {
                IngestError::Journal(format!(
                    "Failed to record publish status for run {}: {}",
                    run_id, e
                ))
            })?;
        Ok(())
    }

    async fn summarize_changes(&self, window_minutes: u32) -> Result<ChangeCounts> {
        let view = format!("{}.v_journals", self.schema);
        let query = format!(
            "SELECT COALESCE(SUM(inserted), 0)::BIGINT AS inserted, \
                    COALESCE(SUM(deleted), 0)::BIGINT AS deleted, \
                    COALESCE(SUM(updated), 0)::BIGINT AS updated \
             FROM {view} \
             WHERE created_at >= (SELECT MAX(created_at) - make_interval(mins => $1) FROM {view})"
        );

        let window = i32::try_from(window_minutes).unwrap_or(i32::MAX);
        let rows = self
            .client
            .query(&query, &[&window])
            .await
            .map_err(|e| IngestError::Journal(format!("Failed to summarize changes: {}", e)))?;

        Ok(rows
            .first()
            .map(|row| ChangeCounts {
                inserted: row.get("inserted"),
                deleted: row.get("deleted"),
                updated: row.get("updated"),
            })
            .unwrap_or_default())
    }

    async fn recent_runs(&self, limit: i64) -> Result<Vec<PipelineRun>> {
        let query = format!(
            "SELECT id::BIGINT AS id, started_at::TIMESTAMPTZ AS started_at, \
                    completed_at::TIMESTAMPTZ AS completed_at, status::TEXT AS status, \
                    error_message::TEXT AS error_message, downloads_performed, \
                    geoserver_published, records_inserted::BIGINT AS records_inserted, \
                    records_deleted::BIGINT AS records_deleted, \
                    records_updated::BIGINT AS records_updated, \
                    duration_seconds::BIGINT AS duration_seconds \
             FROM {} ORDER BY started_at DESC LIMIT $1",
            self.runs_table()
        );

        let rows = self
            .client
            .query(&query, &[&limit])
            .await
            .map_err(|e| IngestError::Journal(format!("Failed to read runs: {}", e)))?;

        rows.iter().map(Self::row_to_run).collect()
    }
}
