//! Staging promotion backed by a stored routine

use crate::adapters::database::traits::StagingPromoter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::domain::{IngestError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Calls the configured promotion routine (`staging.update_tables` by default)
///
/// The routine owns the transaction: it applies inserts, updates and deletes
/// to the production tables and writes per-table counts to the journal view.
pub struct PostgresPromoter {
    client: Arc<PostgreSQLClient>,
    routine: String,
}

impl PostgresPromoter {
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        let routine = client.config().promotion_routine.clone();
        Self { client, routine }
    }

    fn statement(&self) -> String {
        format!("SELECT {}()", self.routine)
    }
}

#[async_trait]
impl StagingPromoter for PostgresPromoter {
    async fn promote(&self) -> Result<()> {
        let started = Instant::now();
        tracing::info!(routine = %self.routine, "Promoting staging tables");

        self.client
            .query(&self.statement(), &[])
            .await
            .map_err(|e| {
                IngestError::Database(format!("Promotion routine {} failed: {}", self.routine, e))
            })?;

        tracing::info!(
            routine = %self.routine,
            duration_ms = started.elapsed().as_millis() as u64,
            "Staging tables promoted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, DatabaseConfig};

    #[test]
    fn test_promotion_statement() {
        let mut config =
            DatabaseConfig::new(secret_string("postgresql://u:p@localhost/db".to_string()));
        config.promotion_routine = "etl.apply_changes".to_string();

        let client = Arc::new(PostgreSQLClient::new(config).unwrap());
        let promoter = PostgresPromoter::new(client);
        assert_eq!(promoter.statement(), "SELECT etl.apply_changes()");
    }
}
