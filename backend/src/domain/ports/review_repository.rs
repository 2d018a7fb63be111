//! Port for review request persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{JobId, ReviewFilter, ReviewRequest, ReviewRequestId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by review repository adapters.
    pub enum ReviewRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "review repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "review repository query failed: {message}",
        /// A request already exists for the job.
        DuplicateJob { job_id: JobId } => "review request already exists for job {job_id}",
    }
}

/// Persistence port for review requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a new review request.
    async fn create(&self, review: &ReviewRequest) -> Result<(), ReviewRepositoryError>;

    /// Fetch a review request by identifier.
    async fn find_by_id(
        &self,
        id: &ReviewRequestId,
    ) -> Result<Option<ReviewRequest>, ReviewRepositoryError>;

    /// List requests matching `filter`, newest first.
    async fn list(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRequest>, ReviewRepositoryError>;

    /// Persist the review request's current state.
    async fn update(&self, review: &ReviewRequest) -> Result<(), ReviewRepositoryError>;

    /// Open requests whose next action is at or before `now`, oldest first.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ReviewRequest>, ReviewRepositoryError>;
}
