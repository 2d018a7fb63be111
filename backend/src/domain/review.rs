//! Post-job review requests and their reminder sequence.
//!
//! A completed job schedules one request. The scheduled-job layer walks due
//! requests through `pending -> sent -> reminded* -> expired`; a customer
//! rating at any open stage completes the request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::{CustomerId, JobId, PageRequest, ReviewRequestId};

/// Ratings at or above this value are invited to post a public review.
pub const PUBLIC_REVIEW_MIN_RATING: i16 = 4;
/// Longest accepted review comment.
pub const REVIEW_COMMENT_MAX: usize = 2000;

text_enum! {
    /// Review request stage.
    pub enum ReviewStatus {
        /// Waiting for the first request.
        Pending => "pending",
        /// First request sent.
        Sent => "sent",
        /// At least one reminder sent.
        Reminded => "reminded",
        /// Customer responded.
        Completed => "completed",
        /// Gave up without a response.
        Expired => "expired",
    }
}

impl ReviewStatus {
    /// Whether the customer can still submit a rating.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Sent | Self::Reminded)
    }
}

/// Timing rules for the reminder sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPolicy {
    /// Delay between job completion and the first request.
    pub initial_delay: Duration,
    /// Gap between the request and each reminder.
    pub reminder_interval: Duration,
    /// Reminders sent before the request expires.
    pub max_reminders: i32,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::hours(2),
            reminder_interval: Duration::days(3),
            max_reminders: 2,
        }
    }
}

/// Next action for a due request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStep {
    /// Send the first request.
    SendRequest,
    /// Send another reminder.
    SendReminder,
    /// Give up on the request.
    Expire,
}

/// Errors raised by review rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Rating outside 1 to 5.
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    /// Comment longer than allowed.
    #[error("comment must be at most {max} characters")]
    CommentTooLong {
        /// Longest accepted comment in characters.
        max: usize,
    },
    /// Request no longer accepts a rating.
    #[error("review request is already {status}")]
    Closed {
        /// Status the request reached.
        status: ReviewStatus,
    },
}

/// Review request for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// Request identifier.
    pub id: ReviewRequestId,
    /// Customer asked for the review.
    pub customer_id: CustomerId,
    /// Completed job under review.
    pub job_id: JobId,
    /// Lifecycle status.
    pub status: ReviewStatus,
    /// When the next request or reminder is due.
    pub next_action_at: Option<DateTime<Utc>>,
    /// Reminders sent so far.
    pub reminders_sent: i32,
    /// Submitted rating from 1 to 5.
    pub rating: Option<i16>,
    /// Submitted comment.
    pub comment: Option<String>,
    /// When the first request went out.
    pub sent_at: Option<DateTime<Utc>>,
    /// When the customer responded.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Result of a customer submitting a rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    /// Request after the rating was stored.
    pub review: ReviewRequest,
    /// Whether to invite the customer to post a public review.
    pub invite_public_review: bool,
}

impl ReviewRequest {
    /// Schedule a request after a job completes.
    pub fn schedule(
        customer_id: CustomerId,
        job_id: JobId,
        completed_at: DateTime<Utc>,
        policy: &ReviewPolicy,
    ) -> Self {
        Self {
            id: ReviewRequestId::random(),
            customer_id,
            job_id,
            status: ReviewStatus::Pending,
            next_action_at: Some(completed_at + policy.initial_delay),
            reminders_sent: 0,
            rating: None,
            comment: None,
            sent_at: None,
            completed_at: None,
            created_at: completed_at,
        }
    }

    /// Decide what the sequencer should do with a due request.
    pub fn next_step(&self, policy: &ReviewPolicy) -> Option<ReviewStep> {
        match self.status {
            ReviewStatus::Pending => Some(ReviewStep::SendRequest),
            ReviewStatus::Sent | ReviewStatus::Reminded
                if self.reminders_sent < policy.max_reminders =>
            {
                Some(ReviewStep::SendReminder)
            }
            ReviewStatus::Sent | ReviewStatus::Reminded => Some(ReviewStep::Expire),
            ReviewStatus::Completed | ReviewStatus::Expired => None,
        }
    }

    /// Record that `step` was carried out at `now`.
    pub fn apply_step(&mut self, step: ReviewStep, now: DateTime<Utc>, policy: &ReviewPolicy) {
        match step {
            ReviewStep::SendRequest => {
                self.status = ReviewStatus::Sent;
                self.sent_at = Some(now);
                self.next_action_at = Some(now + policy.reminder_interval);
            }
            ReviewStep::SendReminder => {
                self.status = ReviewStatus::Reminded;
                self.reminders_sent += 1;
                self.next_action_at = Some(now + policy.reminder_interval);
            }
            ReviewStep::Expire => {
                self.status = ReviewStatus::Expired;
                self.next_action_at = None;
            }
        }
    }

    /// Accept a rating from the customer.
    pub fn submit(
        &mut self,
        rating: i16,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, ReviewError> {
        if !self.status.is_open() {
            return Err(ReviewError::Closed {
                status: self.status,
            });
        }
        if !(1..=5).contains(&rating) {
            return Err(ReviewError::InvalidRating);
        }
        let comment = comment
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());
        if matches!(&comment, Some(c) if c.chars().count() > REVIEW_COMMENT_MAX) {
            return Err(ReviewError::CommentTooLong {
                max: REVIEW_COMMENT_MAX,
            });
        }
        self.status = ReviewStatus::Completed;
        self.rating = Some(rating);
        self.comment = comment;
        self.completed_at = Some(now);
        self.next_action_at = None;
        Ok(rating >= PUBLIC_REVIEW_MIN_RATING)
    }
}

/// List filter for review requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    /// Restrict to one customer.
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    pub status: Option<ReviewStatus>,
    /// Page to return.
    pub page: PageRequest,
}
