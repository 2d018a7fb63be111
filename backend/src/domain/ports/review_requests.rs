//! Driving port for post-job review requests.

use async_trait::async_trait;

use crate::domain::{
    Error, Job, ReviewFilter, ReviewRequest, ReviewRequestId, ReviewSubmission,
};

/// Driving port for post-job review requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRequests: Send + Sync {
    /// Schedule the request for a completed job. Returns `None` when the job
    /// already has one.
    async fn schedule_for_job(&self, job: &Job) -> Result<Option<ReviewRequest>, Error>;

    /// Fetch a review request by identifier.
    async fn get_review(&self, id: ReviewRequestId) -> Result<ReviewRequest, Error>;

    /// List review requests matching `filter`.
    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<ReviewRequest>, Error>;

    /// Record the customer's rating and optional comment.
    async fn submit_review(
        &self,
        id: ReviewRequestId,
        rating: i16,
        comment: Option<String>,
    ) -> Result<ReviewSubmission, Error>;

    /// Send due requests and reminders, expiring exhausted ones.
    async fn advance_due(&self, limit: u32) -> Result<u32, Error>;
}
