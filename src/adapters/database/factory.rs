//! Database backend factory
//!
//! This module builds the database-backed trait objects used by the pipeline
//! from a single shared connection pool.

use crate::adapters::database::traits::{ExtentSource, JournalStorage, StagingPromoter};
use crate::adapters::postgresql::{
    PostgreSQLClient, PostgresExtentSource, PostgresJournalStorage, PostgresPromoter,
};
use crate::config::DatabaseConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Database-backed collaborators sharing one pool
#[derive(Clone)]
pub struct DatabaseBackends {
    /// Shared client, kept for connection checks
    pub client: Arc<PostgreSQLClient>,

    /// Run journal storage
    pub journal: Arc<dyn JournalStorage + Send + Sync>,

    /// Staging promotion routine
    pub promoter: Arc<dyn StagingPromoter + Send + Sync>,

    /// Layer extent queries
    pub extents: Arc<dyn ExtentSource + Send + Sync>,
}

/// Create a shared PostgreSQL client
///
/// # Errors
///
/// Returns an error if the client cannot be created
pub fn create_database_client(config: &DatabaseConfig) -> Result<Arc<PostgreSQLClient>> {
    tracing::info!("Creating PostgreSQL client");
    let client = PostgreSQLClient::new(config.clone())?;
    tracing::debug!(database = %client.connection_string_safe(), "PostgreSQL pool ready");
    Ok(Arc::new(client))
}

/// Create every database backend from one configuration
///
/// # Errors
///
/// Returns an error if the shared client cannot be created
pub fn create_database_backends(config: &DatabaseConfig) -> Result<DatabaseBackends> {
    let client = create_database_client(config)?;
    Ok(create_backends_with_client(client))
}

/// Create every database backend around an existing client
pub fn create_backends_with_client(client: Arc<PostgreSQLClient>) -> DatabaseBackends {
    DatabaseBackends {
        journal: Arc::new(PostgresJournalStorage::new(client.clone()))
            as Arc<dyn JournalStorage + Send + Sync>,
        promoter: Arc::new(PostgresPromoter::new(client.clone()))
            as Arc<dyn StagingPromoter + Send + Sync>,
        extents: Arc::new(PostgresExtentSource::new(client.clone()))
            as Arc<dyn ExtentSource + Send + Sync>,
        client,
    }
}
