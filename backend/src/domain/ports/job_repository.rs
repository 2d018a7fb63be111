//! Port for cleaning job persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, Job, JobFilter, JobId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by job repository adapters.
    pub enum JobRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "job repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "job repository query failed: {message}",
    }
}

/// Persistence port for jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job.
    async fn create(&self, job: &Job) -> Result<(), JobRepositoryError>;

    /// Fetch a job by identifier.
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>, JobRepositoryError>;

    /// List jobs matching `filter`, ordered by scheduled start.
    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobRepositoryError>;

    /// Persist the job's current state.
    async fn update(&self, job: &Job) -> Result<(), JobRepositoryError>;

    /// Scheduled jobs starting in `[from, to)` that have not had a reminder.
    async fn list_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Job>, JobRepositoryError>;

    /// Completion time of the customer's most recent completed job.
    async fn last_completed_at(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<DateTime<Utc>>, JobRepositoryError>;
}
