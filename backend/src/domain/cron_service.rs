//! Dispatch of scheduled maintenance runs to the owning services.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    Communications, Invoicing, JobScheduling, OpportunityPipeline, PromotionsCatalog,
    ReviewRequests, ScheduledJobs, SupportDesk,
};
use crate::domain::{CronJob, CronRun, Error};

/// Routes each [`CronJob`] to the port that owns it.
#[derive(Clone)]
pub struct CronService {
    jobs: Arc<dyn JobScheduling>,
    invoices: Arc<dyn Invoicing>,
    opportunities: Arc<dyn OpportunityPipeline>,
    reviews: Arc<dyn ReviewRequests>,
    messages: Arc<dyn Communications>,
    promotions: Arc<dyn PromotionsCatalog>,
    tickets: Arc<dyn SupportDesk>,
}

impl CronService {
    /// Wire each sweep to its owning port.
    pub fn new(
        jobs: Arc<dyn JobScheduling>,
        invoices: Arc<dyn Invoicing>,
        opportunities: Arc<dyn OpportunityPipeline>,
        reviews: Arc<dyn ReviewRequests>,
        messages: Arc<dyn Communications>,
        promotions: Arc<dyn PromotionsCatalog>,
        tickets: Arc<dyn SupportDesk>,
    ) -> Self {
        Self {
            jobs,
            invoices,
            opportunities,
            reviews,
            messages,
            promotions,
            tickets,
        }
    }
}

#[async_trait]
impl ScheduledJobs for CronService {
    async fn run(&self, job: CronJob, limit: u32) -> Result<CronRun, Error> {
        let processed = match job {
            CronJob::JobReminders => self.jobs.send_reminders(limit).await?,
            CronJob::InvoicesOverdue => self.invoices.mark_overdue(limit).await?,
            CronJob::OpportunitiesExpire => self.opportunities.expire_due(limit).await?,
            CronJob::ReviewRequests => self.reviews.advance_due(limit).await?,
            CronJob::MessagesDispatch => self.messages.dispatch_due(limit).await?,
            CronJob::PromotionsExpire => self.promotions.expire_ended(limit).await?,
            CronJob::TicketsEscalate => self.tickets.escalate_overdue(limit).await?,
        };
        tracing::info!(job = %job, limit, processed, "scheduled job finished");
        Ok(CronRun { job, processed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockCommunications, MockInvoicing, MockJobScheduling, MockOpportunityPipeline,
        MockPromotionsCatalog, MockReviewRequests, MockSupportDesk,
    };
    use rstest::rstest;

    #[derive(Default)]
    struct Mocks {
        jobs: MockJobScheduling,
        invoices: MockInvoicing,
        opportunities: MockOpportunityPipeline,
        reviews: MockReviewRequests,
        messages: MockCommunications,
        promotions: MockPromotionsCatalog,
        tickets: MockSupportDesk,
    }

    impl Mocks {
        fn service(self) -> CronService {
            CronService::new(
                Arc::new(self.jobs),
                Arc::new(self.invoices),
                Arc::new(self.opportunities),
                Arc::new(self.reviews),
                Arc::new(self.messages),
                Arc::new(self.promotions),
                Arc::new(self.tickets),
            )
        }
    }

    #[rstest]
    #[tokio::test]
    async fn reminders_run_through_job_scheduling() {
        let mut mocks = Mocks::default();
        mocks
            .jobs
            .expect_send_reminders()
            .withf(|limit| *limit == 25)
            .times(1)
            .returning(|_| Ok(3));

        let run = mocks
            .service()
            .run(CronJob::JobReminders, 25)
            .await
            .expect("ran");
        assert_eq!(run, CronRun { job: CronJob::JobReminders, processed: 3 });
    }

    #[rstest]
    #[case(CronJob::InvoicesOverdue)]
    #[case(CronJob::OpportunitiesExpire)]
    #[case(CronJob::ReviewRequests)]
    #[case(CronJob::MessagesDispatch)]
    #[case(CronJob::PromotionsExpire)]
    #[case(CronJob::TicketsEscalate)]
    #[tokio::test]
    async fn each_job_reaches_its_owner(#[case] job: CronJob) {
        let mut mocks = Mocks::default();
        match job {
            CronJob::JobReminders => {
                mocks.jobs.expect_send_reminders().returning(|_| Ok(1));
            }
            CronJob::InvoicesOverdue => {
                mocks.invoices.expect_mark_overdue().returning(|_| Ok(1));
            }
            CronJob::OpportunitiesExpire => {
                mocks.opportunities.expect_expire_due().returning(|_| Ok(1));
            }
            CronJob::ReviewRequests => {
                mocks.reviews.expect_advance_due().returning(|_| Ok(1));
            }
            CronJob::MessagesDispatch => {
                mocks.messages.expect_dispatch_due().returning(|_| Ok(1));
            }
            CronJob::PromotionsExpire => {
                mocks.promotions.expect_expire_ended().returning(|_| Ok(1));
            }
            CronJob::TicketsEscalate => {
                mocks.tickets.expect_escalate_overdue().returning(|_| Ok(1));
            }
        }

        let run = mocks.service().run(job, 10).await.expect("ran");
        assert_eq!(run.processed, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failures_propagate() {
        let mut mocks = Mocks::default();
        mocks
            .messages
            .expect_dispatch_due()
            .returning(|_| Err(Error::service_unavailable("database down")));

        let err = mocks
            .service()
            .run(CronJob::MessagesDispatch, 10)
            .await
            .expect_err("failed");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
