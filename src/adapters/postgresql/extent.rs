//! Layer extents computed with PostGIS

use crate::adapters::database::traits::ExtentSource;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::domain::{Extent, IngestError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Computes `ST_Extent(geom)` of a published table
pub struct PostgresExtentSource {
    client: Arc<PostgreSQLClient>,
}

impl PostgresExtentSource {
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn extent_query(schema: &str, table: &str) -> String {
    format!(
        "SELECT ST_XMin(extent)::FLOAT8, ST_YMin(extent)::FLOAT8, \
                ST_XMax(extent)::FLOAT8, ST_YMax(extent)::FLOAT8 \
         FROM (SELECT ST_Extent(geom) AS extent FROM {}.{}) sub",
        quote_identifier(schema),
        quote_identifier(table)
    )
}

#[async_trait]
impl ExtentSource for PostgresExtentSource {
    async fn extent(&self, schema: &str, table: &str) -> Result<Extent> {
        let rows = self
            .client
            .query(&extent_query(schema, table), &[])
            .await
            .map_err(|e| {
                IngestError::Database(format!(
                    "Failed to compute extent of {}.{}: {}",
                    schema, table, e
                ))
            })?;

        let extent = rows
            .first()
            .map(|row| Extent::from_nullable(row.get(0), row.get(1), row.get(2), row.get(3)))
            .unwrap_or_default();

        if extent.is_empty() {
            tracing::warn!(schema = %schema, table = %table, "Table has no geometries, using empty extent");
        }
        Ok(extent)
    }
}
