//! Staging-to-production promotion
//!
//! Promotion is one opaque call into the database. It is never skipped and
//! never retried; a failure fails the run.

pub use crate::adapters::database::StagingPromoter;

use crate::domain::Result;
use crate::{log_stage_complete, log_stage_start};
use std::time::Instant;

/// Run the promotion routine as a pipeline stage
///
/// # Errors
///
/// Returns the promoter's error unchanged.
pub async fn promote(promoter: &dyn StagingPromoter) -> Result<()> {
    let started = Instant::now();
    log_stage_start!("promote");

    promoter.promote().await.map_err(|e| {
        tracing::error!(error = %e, "Promotion failed");
        e
    })?;

    log_stage_complete!("promote", started.elapsed());
    Ok(())
}
