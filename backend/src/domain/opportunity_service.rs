//! Opportunity pipeline with lead scoring.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::customer_service::require_customer;
use crate::domain::job_service::map_job_error;
use crate::domain::ports::{
    CustomerRepository, JobRepository, LoyaltyProgram, OpportunityPipeline,
    OpportunityRepository, OpportunityRepositoryError,
};
use crate::domain::{
    Error, Opportunity, OpportunityDraft, OpportunityError, OpportunityFilter, OpportunityId,
    OpportunityStatus, ScoreInputs, score_opportunity,
};

fn map_opportunity_error(error: OpportunityRepositoryError) -> Error {
    match error {
        OpportunityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("opportunity repository unavailable: {message}"))
        }
        OpportunityRepositoryError::Query { message } => {
            Error::internal(format!("opportunity repository error: {message}"))
        }
    }
}

fn map_rule_error(error: OpportunityError) -> Error {
    match error {
        OpportunityError::InvalidTransition { .. } => Error::conflict(error.to_string()),
        OpportunityError::NegativeValue | OpportunityError::ExpiryInPast => {
            Error::invalid_request(error.to_string())
        }
    }
}

/// Opportunity service implementing the pipeline port.
#[derive(Clone)]
pub struct OpportunityService<O, J, C> {
    opportunities: Arc<O>,
    jobs: Arc<J>,
    customers: Arc<C>,
    loyalty: Arc<dyn LoyaltyProgram>,
    clock: Arc<dyn Clock>,
}

impl<O, J, C> OpportunityService<O, J, C> {
    /// Create the service over its repositories.
    pub fn new(
        opportunities: Arc<O>,
        jobs: Arc<J>,
        customers: Arc<C>,
        loyalty: Arc<dyn LoyaltyProgram>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            opportunities,
            jobs,
            customers,
            loyalty,
            clock,
        }
    }
}

impl<O, J, C> OpportunityService<O, J, C>
where
    O: OpportunityRepository,
    J: JobRepository,
    C: CustomerRepository,
{
    async fn require_opportunity(&self, id: OpportunityId) -> Result<Opportunity, Error> {
        self.opportunities
            .find_by_id(&id)
            .await
            .map_err(map_opportunity_error)?
            .ok_or_else(|| Error::not_found(format!("opportunity {id} not found")))
    }
}

#[async_trait]
impl<O, J, C> OpportunityPipeline for OpportunityService<O, J, C>
where
    O: OpportunityRepository,
    J: JobRepository,
    C: CustomerRepository,
{
    async fn create_opportunity(&self, draft: OpportunityDraft) -> Result<Opportunity, Error> {
        let customer = require_customer(self.customers.as_ref(), draft.customer_id).await?;
        if customer.archived {
            return Err(Error::conflict("cannot open opportunities for an archived customer"));
        }
        let now = self.clock.utc();
        let tier = self.loyalty.account(customer.id).await?.tier;
        let last_completed = self
            .jobs
            .last_completed_at(&customer.id)
            .await
            .map_err(map_job_error)?;
        let score = score_opportunity(ScoreInputs {
            kind: draft.kind,
            tier,
            estimated_value_cents: draft.estimated_value_cents,
            days_since_last_completed_job: last_completed.map(|at| (now - at).num_days()),
        });
        let opportunity =
            Opportunity::open(OpportunityId::random(), draft, score, now).map_err(map_rule_error)?;
        self.opportunities
            .create(&opportunity)
            .await
            .map_err(map_opportunity_error)?;
        tracing::info!(opportunity_id = %opportunity.id, score, "opportunity opened");
        Ok(opportunity)
    }

    async fn get_opportunity(&self, id: OpportunityId) -> Result<Opportunity, Error> {
        self.require_opportunity(id).await
    }

    async fn list_opportunities(
        &self,
        filter: OpportunityFilter,
    ) -> Result<Vec<Opportunity>, Error> {
        self.opportunities
            .list(&filter)
            .await
            .map_err(map_opportunity_error)
    }

    async fn transition_opportunity(
        &self,
        id: OpportunityId,
        status: OpportunityStatus,
    ) -> Result<Opportunity, Error> {
        let mut opportunity = self.require_opportunity(id).await?;
        opportunity
            .transition(status, self.clock.utc())
            .map_err(map_rule_error)?;
        self.opportunities
            .update(&opportunity)
            .await
            .map_err(map_opportunity_error)?;
        Ok(opportunity)
    }

    async fn expire_due(&self, limit: u32) -> Result<u32, Error> {
        let now = self.clock.utc();
        let expired = self
            .opportunities
            .list_expired(now, limit)
            .await
            .map_err(map_opportunity_error)?;
        let mut processed = 0;
        for mut opportunity in expired {
            if opportunity
                .transition(OpportunityStatus::Expired, now)
                .is_err()
            {
                continue;
            }
            self.opportunities
                .update(&opportunity)
                .await
                .map_err(map_opportunity_error)?;
            processed += 1;
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockCustomerRepository, MockJobRepository, MockLoyaltyProgram, MockOpportunityRepository,
    };
    use crate::domain::test_fixtures::{fixture_clock, fixture_now, sample_customer};
    use crate::domain::{CustomerId, ErrorCode, LoyaltyAccount, LoyaltyTier, OpportunityKind};
    use chrono::Duration;
    use rstest::rstest;

    type Service =
        OpportunityService<MockOpportunityRepository, MockJobRepository, MockCustomerRepository>;

    fn service(
        opportunities: MockOpportunityRepository,
        jobs: MockJobRepository,
        customers: MockCustomerRepository,
        loyalty: MockLoyaltyProgram,
    ) -> Service {
        OpportunityService::new(
            Arc::new(opportunities),
            Arc::new(jobs),
            Arc::new(customers),
            Arc::new(loyalty),
            fixture_clock(),
        )
    }

    fn open_opportunity(expires_at: Option<chrono::DateTime<chrono::Utc>>) -> Opportunity {
        Opportunity::open(
            OpportunityId::random(),
            OpportunityDraft {
                customer_id: CustomerId::random(),
                kind: OpportunityKind::Upsell,
                estimated_value_cents: 5_000,
                notes: None,
                expires_at,
            },
            30,
            fixture_now() - Duration::days(10),
        )
        .expect("valid opportunity")
    }

    #[rstest]
    #[case(Some(12), 40 + 10 + 5 + 10)]
    #[case(Some(45), 40 + 10 + 5)]
    #[case(None, 40 + 10 + 5)]
    #[tokio::test]
    async fn score_uses_tier_and_recency(#[case] days_ago: Option<i64>, #[case] expected: u8) {
        let customer = sample_customer();
        let customer_id = customer.id;
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(customer)));
        let mut loyalty = MockLoyaltyProgram::new();
        loyalty.expect_account().returning(|id| {
            let mut account = LoyaltyAccount::open(id, fixture_now());
            account.tier = LoyaltyTier::Silver;
            Ok(account)
        });
        let mut jobs = MockJobRepository::new();
        jobs.expect_last_completed_at()
            .return_once(move |_| Ok(days_ago.map(|days| fixture_now() - Duration::days(days))));
        let mut opportunities = MockOpportunityRepository::new();
        opportunities.expect_create().times(1).returning(|_| Ok(()));

        let opportunity = service(opportunities, jobs, customers, loyalty)
            .create_opportunity(OpportunityDraft {
                customer_id,
                kind: OpportunityKind::Rebook,
                estimated_value_cents: 50_000,
                notes: None,
                expires_at: None,
            })
            .await
            .expect("created");
        assert_eq!(opportunity.score, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn closed_opportunities_cannot_reopen() {
        let mut opportunity = open_opportunity(None);
        opportunity
            .transition(OpportunityStatus::Converted, fixture_now())
            .expect("converted");
        let id = opportunity.id;
        let mut opportunities = MockOpportunityRepository::new();
        opportunities
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(opportunity)));
        opportunities.expect_update().times(0);

        let err = service(
            opportunities,
            MockJobRepository::new(),
            MockCustomerRepository::new(),
            MockLoyaltyProgram::new(),
        )
        .transition_opportunity(id, OpportunityStatus::Contacted)
        .await
        .expect_err("closed");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn expiry_sweep_closes_due_opportunities() {
        let due = vec![
            open_opportunity(Some(fixture_now() - Duration::days(1))),
            open_opportunity(Some(fixture_now() - Duration::hours(1))),
        ];
        let mut opportunities = MockOpportunityRepository::new();
        opportunities
            .expect_list_expired()
            .return_once(move |_, _| Ok(due));
        opportunities
            .expect_update()
            .withf(|o| o.status == OpportunityStatus::Expired && o.closed_at == Some(fixture_now()))
            .times(2)
            .returning(|_| Ok(()));

        let processed = service(
            opportunities,
            MockJobRepository::new(),
            MockCustomerRepository::new(),
            MockLoyaltyProgram::new(),
        )
        .expire_due(100)
        .await
        .expect("swept");
        assert_eq!(processed, 2);
    }
}
