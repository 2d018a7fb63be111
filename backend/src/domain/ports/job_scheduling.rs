//! Driving port for cleaning jobs.

use async_trait::async_trait;

use crate::domain::{Error, Job, JobDraft, JobFilter, JobId, JobStatus};

/// Driving port for booking jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobScheduling: Send + Sync {
    /// Validate and book a new job.
    async fn create_job(&self, draft: JobDraft) -> Result<Job, Error>;

    /// Fetch a job by identifier.
    async fn get_job(&self, id: JobId) -> Result<Job, Error>;

    /// List jobs matching `filter`.
    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, Error>;

    /// Move a job along its lifecycle. Completion schedules a review request.
    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<Job, Error>;

    /// Queue reminders for jobs starting within the lead window.
    async fn send_reminders(&self, limit: u32) -> Result<u32, Error>;
}
