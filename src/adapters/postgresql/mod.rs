//! PostgreSQL/PostGIS integration
//!
//! This module provides the pooled client and the PostgreSQL implementations
//! of the journal, promotion and extent traits.

pub mod client;
pub mod extent;
pub mod journal;
pub mod promotion;

pub use client::{ConnectionParameters, PostgreSQLClient};
pub use extent::PostgresExtentSource;
pub use journal::PostgresJournalStorage;
pub use promotion::PostgresPromoter;
