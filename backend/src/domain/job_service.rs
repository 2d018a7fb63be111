//! Job scheduling service and the reminder run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use chrono_tz::Tz;
use mockable::Clock;

use crate::domain::customer_service::require_customer;
use crate::domain::ports::{
    Communications, CustomerRepository, JobRepository, JobRepositoryError, JobScheduling,
    ReviewRequests,
};
use crate::domain::{
    Customer, Error, Job, JobDraft, JobError, JobFilter, JobId, JobStatus, MessageDraft,
    MessagePurpose,
};

/// Default lead time for job reminders.
pub const DEFAULT_REMINDER_LEAD_HOURS: i64 = 24;

pub(crate) fn map_job_error(error: JobRepositoryError) -> Error {
    match error {
        JobRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("job repository unavailable: {message}"))
        }
        JobRepositoryError::Query { message } => {
            Error::internal(format!("job repository error: {message}"))
        }
    }
}

fn map_rule_error(error: JobError) -> Error {
    match error {
        JobError::InvalidTransition { .. } => Error::conflict(error.to_string()),
        JobError::InvalidDuration { .. }
        | JobError::NegativePrice
        | JobError::PriceTooLarge { .. } => {
            Error::invalid_request(error.to_string())
        }
    }
}

pub(crate) async fn require_job<R>(repo: &R, id: JobId) -> Result<Job, Error>
where
    R: JobRepository + ?Sized,
{
    repo.find_by_id(&id)
        .await
        .map_err(map_job_error)?
        .ok_or_else(|| Error::not_found(format!("job {id} not found")))
}

fn reminder_message(job: &Job, customer: &Customer, zone: Tz) -> MessageDraft {
    let zone = customer.time_zone.unwrap_or(zone);
    let start = job.scheduled_start.with_timezone(&zone);
    MessageDraft {
        customer_id: customer.id,
        channel: customer.preferred_channel(),
        purpose: MessagePurpose::JobReminder,
        subject: Some("Your cleaning appointment".to_owned()),
        body: format!(
            "Hi {}, this is a reminder that your {} cleaning is booked for {}.",
            customer.name,
            job.service_type.as_str().replace('_', " "),
            start.format("%A %-d %B at %H:%M %Z"),
        ),
    }
}

/// Job service implementing the scheduling port.
#[derive(Clone)]
pub struct JobService<J, C> {
    jobs: Arc<J>,
    customers: Arc<C>,
    reviews: Arc<dyn ReviewRequests>,
    messages: Arc<dyn Communications>,
    clock: Arc<dyn Clock>,
    reminder_lead: Duration,
    zone: Tz,
}

impl<J, C> JobService<J, C> {
    /// Create the service over its repositories and collaborators.
    pub fn new(
        jobs: Arc<J>,
        customers: Arc<C>,
        reviews: Arc<dyn ReviewRequests>,
        messages: Arc<dyn Communications>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs,
            customers,
            reviews,
            messages,
            clock,
            reminder_lead: Duration::hours(DEFAULT_REMINDER_LEAD_HOURS),
            zone: chrono_tz::UTC,
        }
    }

    /// Send reminders for jobs starting within `lead` of now.
    pub fn with_reminder_lead(mut self, lead: Duration) -> Self {
        self.reminder_lead = lead;
        self
    }

    /// Zone used to render times for customers without one.
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }
}

#[async_trait]
impl<J, C> JobScheduling for JobService<J, C>
where
    J: JobRepository,
    C: CustomerRepository,
{
    async fn create_job(&self, draft: JobDraft) -> Result<Job, Error> {
        let customer = require_customer(self.customers.as_ref(), draft.customer_id).await?;
        if customer.archived {
            return Err(Error::conflict("cannot book jobs for an archived customer"));
        }
        let job = Job::schedule(JobId::random(), draft, self.clock.utc()).map_err(map_rule_error)?;
        self.jobs.create(&job).await.map_err(map_job_error)?;
        tracing::info!(job_id = %job.id, customer_id = %job.customer_id, "job scheduled");
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> Result<Job, Error> {
        require_job(self.jobs.as_ref(), id).await
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, Error> {
        self.jobs.list(&filter).await.map_err(map_job_error)
    }

    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<Job, Error> {
        let mut job = require_job(self.jobs.as_ref(), id).await?;
        job.transition(status, self.clock.utc())
            .map_err(map_rule_error)?;
        self.jobs.update(&job).await.map_err(map_job_error)?;
        tracing::info!(job_id = %job.id, status = %job.status, "job status changed");

        if job.status == JobStatus::Completed {
            if let Err(error) = self.reviews.schedule_for_job(&job).await {
                tracing::warn!(job_id = %job.id, %error, "review request not scheduled");
            }
        }
        Ok(job)
    }

    async fn send_reminders(&self, limit: u32) -> Result<u32, Error> {
        let now = self.clock.utc();
        let due = self
            .jobs
            .list_needing_reminder(now, now + self.reminder_lead, limit)
            .await
            .map_err(map_job_error)?;

        let mut processed = 0;
        for mut job in due {
            let customer = require_customer(self.customers.as_ref(), job.customer_id).await?;
            let message = self
                .messages
                .enqueue(reminder_message(&job, &customer, self.zone))
                .await?;
            job.reminder_sent_at = Some(now);
            job.updated_at = now;
            self.jobs.update(&job).await.map_err(map_job_error)?;
            tracing::debug!(job_id = %job.id, status = %message.status, "job reminder queued");
            processed += 1;
        }
        Ok(processed)
    }
}

#[cfg(test)]
#[path = "job_service_tests.rs"]
mod tests;
