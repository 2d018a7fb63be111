//! Tests for the job service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockCommunications, MockCustomerRepository, MockJobRepository, MockReviewRequests,
};
use crate::domain::test_fixtures::{
    fixture_clock, fixture_now, logged, sample_customer, sample_job,
};
use crate::domain::{Channel, ErrorCode, MessageStatus, ServiceType};

struct Mocks {
    jobs: MockJobRepository,
    customers: MockCustomerRepository,
    reviews: MockReviewRequests,
    messages: MockCommunications,
}

impl Mocks {
    fn new() -> Self {
        Self {
            jobs: MockJobRepository::new(),
            customers: MockCustomerRepository::new(),
            reviews: MockReviewRequests::new(),
            messages: MockCommunications::new(),
        }
    }

    fn service(self) -> JobService<MockJobRepository, MockCustomerRepository> {
        JobService::new(
            Arc::new(self.jobs),
            Arc::new(self.customers),
            Arc::new(self.reviews),
            Arc::new(self.messages),
            fixture_clock(),
        )
    }
}

fn draft(customer_id: crate::domain::CustomerId) -> JobDraft {
    JobDraft {
        customer_id,
        service_type: ServiceType::Deep,
        scheduled_start: fixture_now(),
        duration_minutes: 180,
        price_cents: 25_000,
        assigned_cleaner: Some("Sam".into()),
        notes: None,
    }
}

#[rstest]
#[tokio::test]
async fn archived_customers_cannot_book() {
    let mut customer = sample_customer();
    customer.archived = true;
    let id = customer.id;
    let mut mocks = Mocks::new();
    mocks
        .customers
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(customer)));
    mocks.jobs.expect_create().times(0);

    let err = mocks.service().create_job(draft(id)).await.expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn invalid_duration_is_invalid_request() {
    let customer = sample_customer();
    let id = customer.id;
    let mut mocks = Mocks::new();
    mocks
        .customers
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(customer)));

    let err = mocks
        .service()
        .create_job(JobDraft {
            duration_minutes: 0,
            ..draft(id)
        })
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn completing_a_job_schedules_a_review() {
    let mut job = sample_job(sample_customer().id);
    job.status = JobStatus::InProgress;
    let id = job.id;
    let mut mocks = Mocks::new();
    mocks.jobs.expect_find_by_id().return_once(move |_| Ok(Some(job)));
    mocks.jobs.expect_update().times(1).return_once(|_| Ok(()));
    mocks
        .reviews
        .expect_schedule_for_job()
        .withf(|job| job.status == JobStatus::Completed && job.completed_at.is_some())
        .times(1)
        .return_once(|_| Ok(None));

    let job = mocks
        .service()
        .update_job_status(id, JobStatus::Completed)
        .await
        .expect("completed");
    assert_eq!(job.completed_at, Some(fixture_now()));
}

#[rstest]
#[tokio::test]
async fn invalid_transition_is_conflict() {
    let job = sample_job(sample_customer().id);
    let id = job.id;
    let mut mocks = Mocks::new();
    mocks.jobs.expect_find_by_id().return_once(move |_| Ok(Some(job)));
    mocks.jobs.expect_update().times(0);
    mocks.reviews.expect_schedule_for_job().times(0);

    let err = mocks
        .service()
        .update_job_status(id, JobStatus::Completed)
        .await
        .expect_err("scheduled jobs cannot complete directly");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn reminders_use_lead_window_and_stamp_jobs() {
    let customer = sample_customer();
    let job = sample_job(customer.id);
    let mut mocks = Mocks::new();
    mocks
        .jobs
        .expect_list_needing_reminder()
        .withf(|from, to, limit| {
            *from == fixture_now() && *to == fixture_now() + Duration::hours(24) && *limit == 10
        })
        .return_once(move |_, _, _| Ok(vec![job]));
    mocks
        .customers
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(customer)));
    mocks
        .messages
        .expect_enqueue()
        .withf(|draft| {
            draft.purpose == MessagePurpose::JobReminder
                && draft.channel == Channel::Email
                && draft.body.contains("standard cleaning")
        })
        .times(1)
        .returning(|draft| Ok(logged(draft, MessageStatus::Sent)));
    mocks
        .jobs
        .expect_update()
        .withf(|job| job.reminder_sent_at == Some(fixture_now()))
        .times(1)
        .return_once(|_| Ok(()));

    let processed = mocks.service().send_reminders(10).await.expect("run");
    assert_eq!(processed, 1);
}
