//! Cleaning jobs and their status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::MAX_AMOUNT_CENTS;
use super::text_enum::text_enum;
use super::{CustomerId, JobId, PageRequest};

/// Longest bookable job in minutes (one working day plus overtime).
pub const MAX_JOB_DURATION_MINUTES: i32 = 16 * 60;

text_enum! {
    /// Kind of cleaning service booked.
    pub enum ServiceType {
        /// Regular cleaning.
        Standard => "standard",
        /// Deep cleaning.
        Deep => "deep",
        /// Move-out cleaning.
        MoveOut => "move_out",
        /// Cleaning after building work.
        PostConstruction => "post_construction",
        /// Repeating visit.
        Recurring => "recurring",
    }
}

text_enum! {
    /// Lifecycle state of a job.
    pub enum JobStatus {
        /// Booked and not started.
        Scheduled => "scheduled",
        /// Cleaner on site.
        InProgress => "in_progress",
        /// Finished.
        Completed => "completed",
        /// Called off.
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// Whether a job may move from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::InProgress | Self::Cancelled)
                | (Self::InProgress, Self::Completed | Self::Cancelled)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Validation and transition errors for jobs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// Duration outside the accepted range.
    #[error("durationMinutes must be between 1 and {max}")]
    InvalidDuration {
        /// Longest accepted duration in minutes.
        max: i32,
    },
    /// Price below zero.
    #[error("priceCents must not be negative")]
    NegativePrice,
    /// Price above the supported amount.
    #[error("priceCents must not exceed {max}")]
    PriceTooLarge {
        /// Largest accepted price in cents.
        max: i64,
    },
    /// Status change not allowed from the current status.
    #[error("cannot move job from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },
}

/// Scheduled cleaning job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// Customer the job is for.
    pub customer_id: CustomerId,
    /// Kind of cleaning.
    pub service_type: ServiceType,
    /// Start of the booked slot.
    pub scheduled_start: DateTime<Utc>,
    /// Booked length in minutes.
    pub duration_minutes: i32,
    /// Agreed price.
    pub price_cents: i64,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Cleaner assigned to the job.
    pub assigned_cleaner: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the reminder went out.
    pub reminder_sent_at: Option<DateTime<Utc>>,
    /// When the job was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Input for booking a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    /// Customer the job is for.
    pub customer_id: CustomerId,
    /// Kind of cleaning.
    pub service_type: ServiceType,
    /// Start of the booked slot.
    pub scheduled_start: DateTime<Utc>,
    /// Booked length in minutes.
    pub duration_minutes: i32,
    /// Agreed price.
    pub price_cents: i64,
    /// Cleaner assigned to the job.
    pub assigned_cleaner: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl Job {
    /// Validate a draft into a scheduled job.
    pub fn schedule(id: JobId, draft: JobDraft, now: DateTime<Utc>) -> Result<Self, JobError> {
        if !(1..=MAX_JOB_DURATION_MINUTES).contains(&draft.duration_minutes) {
            return Err(JobError::InvalidDuration {
                max: MAX_JOB_DURATION_MINUTES,
            });
        }
        if draft.price_cents < 0 {
            return Err(JobError::NegativePrice);
        }
        if draft.price_cents > MAX_AMOUNT_CENTS {
            return Err(JobError::PriceTooLarge {
                max: MAX_AMOUNT_CENTS,
            });
        }
        Ok(Self {
            id,
            customer_id: draft.customer_id,
            service_type: draft.service_type,
            scheduled_start: draft.scheduled_start,
            duration_minutes: draft.duration_minutes,
            price_cents: draft.price_cents,
            status: JobStatus::Scheduled,
            assigned_cleaner: draft.assigned_cleaner,
            notes: draft.notes,
            reminder_sent_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Move the job to `next`, stamping completion time where relevant.
    pub fn transition(&mut self, next: JobStatus, now: DateTime<Utc>) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next == JobStatus::Completed {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// List filter for jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Restrict to one customer.
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    pub status: Option<JobStatus>,
    /// Earliest start to include.
    pub scheduled_from: Option<DateTime<Utc>>,
    /// Latest start to include.
    pub scheduled_to: Option<DateTime<Utc>>,
    /// Page to return.
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> JobDraft {
        JobDraft {
            customer_id: CustomerId::random(),
            service_type: ServiceType::Deep,
            scheduled_start: Utc::now(),
            duration_minutes: 180,
            price_cents: 25_000,
            assigned_cleaner: None,
            notes: None,
        }
    }

    #[rstest]
    #[case(JobStatus::Scheduled, JobStatus::InProgress, true)]
    #[case(JobStatus::Scheduled, JobStatus::Cancelled, true)]
    #[case(JobStatus::Scheduled, JobStatus::Completed, false)]
    #[case(JobStatus::InProgress, JobStatus::Completed, true)]
    #[case(JobStatus::InProgress, JobStatus::Scheduled, false)]
    #[case(JobStatus::Completed, JobStatus::Cancelled, false)]
    #[case(JobStatus::Cancelled, JobStatus::Scheduled, false)]
    fn transition_table(#[case] from: JobStatus, #[case] to: JobStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    #[case(JobDraft { duration_minutes: 0, ..draft() })]
    #[case(JobDraft { duration_minutes: MAX_JOB_DURATION_MINUTES + 1, ..draft() })]
    #[case(JobDraft { price_cents: -1, ..draft() })]
    #[case(JobDraft { price_cents: MAX_AMOUNT_CENTS + 1, ..draft() })]
    #[case(JobDraft { price_cents: i64::MAX, ..draft() })]
    fn schedule_rejects_bad_drafts(#[case] input: JobDraft) {
        assert!(Job::schedule(JobId::random(), input, Utc::now()).is_err());
    }

    #[rstest]
    fn completion_stamps_completed_at() {
        let now = Utc::now();
        let mut job = Job::schedule(JobId::random(), draft(), now).expect("valid");
        job.transition(JobStatus::InProgress, now).expect("start");
        job.transition(JobStatus::Completed, now).expect("complete");
        assert_eq!(job.completed_at, Some(now));
        let err = job
            .transition(JobStatus::Cancelled, now)
            .expect_err("terminal");
        assert!(matches!(err, JobError::InvalidTransition { .. }));
    }
}
