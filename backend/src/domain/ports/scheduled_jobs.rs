//! Driving port for scheduled maintenance runs.

use async_trait::async_trait;

use crate::domain::{CronJob, CronRun, Error};

/// Driving port for the background sweeps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduledJobs: Send + Sync {
    /// Run one batch of `job`, processing at most `limit` rows.
    async fn run(&self, job: CronJob, limit: u32) -> Result<CronRun, Error>;
}
