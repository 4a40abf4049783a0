//! Database abstraction layer
//!
//! This module provides a trait-based abstraction for the database work the
//! pipeline performs, so stages can be exercised without a live PostGIS.

pub mod factory;
pub mod traits;

pub use factory::{
    create_backends_with_client, create_database_backends, create_database_client,
    DatabaseBackends,
};
pub use traits::{ExtentSource, JournalStorage, StagingPromoter};
