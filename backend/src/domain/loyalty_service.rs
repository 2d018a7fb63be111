//! Loyalty point accounting.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use uuid::Uuid;

use crate::domain::customer_service::require_customer;
use crate::domain::ports::{
    CustomerRepository, LoyaltyProgram, LoyaltyRepository, LoyaltyRepositoryError,
    PointsRedemption,
};
use crate::domain::{
    CustomerId, Error, LedgerEntry, LedgerReason, LoyaltyAccount, LoyaltyError, PageRequest,
    points_for_payment,
};

fn map_loyalty_error(error: LoyaltyRepositoryError) -> Error {
    match error {
        LoyaltyRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("loyalty repository unavailable: {message}"))
        }
        LoyaltyRepositoryError::Query { message } => {
            Error::internal(format!("loyalty repository error: {message}"))
        }
    }
}

fn map_rule_error(error: LoyaltyError) -> Error {
    match error {
        LoyaltyError::InsufficientPoints { balance, requested } => {
            Error::conflict(error.to_string()).with_details(json!({
                "code": "insufficient_points",
                "balance": balance,
                "requested": requested,
            }))
        }
        LoyaltyError::NegativeBalance { .. } => Error::conflict(error.to_string()),
        LoyaltyError::NonPositivePoints
        | LoyaltyError::InvalidRedemptionBlock { .. }
        | LoyaltyError::ZeroAdjustment
        | LoyaltyError::PointsOverflow => Error::invalid_request(error.to_string()),
    }
}

/// Loyalty service implementing the loyalty program port.
#[derive(Clone)]
pub struct LoyaltyService<L, C> {
    loyalty: Arc<L>,
    customers: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<L, C> LoyaltyService<L, C> {
    /// Create the service over its repositories.
    pub fn new(loyalty: Arc<L>, customers: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            loyalty,
            customers,
            clock,
        }
    }
}

impl<L, C> LoyaltyService<L, C>
where
    L: LoyaltyRepository,
    C: CustomerRepository,
{
    async fn load(&self, customer_id: CustomerId) -> Result<LoyaltyAccount, Error> {
        if let Some(account) = self
            .loyalty
            .find_account(&customer_id)
            .await
            .map_err(map_loyalty_error)?
        {
            return Ok(account);
        }
        require_customer(self.customers.as_ref(), customer_id).await?;
        Ok(LoyaltyAccount::open(customer_id, self.clock.utc()))
    }

    async fn record(&self, account: &LoyaltyAccount, entry: LedgerEntry) -> Result<(), Error> {
        self.loyalty
            .record(account, &entry)
            .await
            .map_err(map_loyalty_error)?;
        tracing::info!(
            customer_id = %account.customer_id,
            delta = entry.delta,
            reason = %entry.reason,
            balance = account.points_balance,
            tier = %account.tier,
            "loyalty points recorded"
        );
        Ok(())
    }
}

#[async_trait]
impl<L, C> LoyaltyProgram for LoyaltyService<L, C>
where
    L: LoyaltyRepository,
    C: CustomerRepository,
{
    async fn account(&self, customer_id: CustomerId) -> Result<LoyaltyAccount, Error> {
        self.load(customer_id).await
    }

    async fn ledger(
        &self,
        customer_id: CustomerId,
        page: PageRequest,
    ) -> Result<Vec<LedgerEntry>, Error> {
        self.loyalty
            .list_ledger(&customer_id, &page)
            .await
            .map_err(map_loyalty_error)
    }

    async fn award_payment(
        &self,
        customer_id: CustomerId,
        amount_cents: i64,
        reference_id: Uuid,
    ) -> Result<LoyaltyAccount, Error> {
        let mut account = self.load(customer_id).await?;
        let points = points_for_payment(amount_cents);
        if points == 0 {
            return Ok(account);
        }
        let now = self.clock.utc();
        account.award(points, now).map_err(map_rule_error)?;
        let entry = LedgerEntry::new(
            customer_id,
            points,
            LedgerReason::JobPayment,
            Some(reference_id),
            now,
        );
        self.record(&account, entry).await?;
        Ok(account)
    }

    async fn redeem_points(
        &self,
        customer_id: CustomerId,
        points: i64,
    ) -> Result<PointsRedemption, Error> {
        let mut account = self.load(customer_id).await?;
        let now = self.clock.utc();
        let credit_cents = account.redeem(points, now).map_err(map_rule_error)?;
        let entry = LedgerEntry::new(customer_id, -points, LedgerReason::Redemption, None, now);
        self.record(&account, entry).await?;
        Ok(PointsRedemption {
            account,
            points,
            credit_cents,
        })
    }

    async fn adjust_points(
        &self,
        customer_id: CustomerId,
        delta: i64,
        note: Option<String>,
    ) -> Result<LoyaltyAccount, Error> {
        let mut account = self.load(customer_id).await?;
        let now = self.clock.utc();
        account.adjust(delta, now).map_err(map_rule_error)?;
        let entry = LedgerEntry::new(customer_id, delta, LedgerReason::Adjustment, None, now)
            .with_note(note);
        self.record(&account, entry).await?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCustomerRepository, MockLoyaltyRepository};
    use crate::domain::test_fixtures::{fixture_clock, fixture_now, sample_customer};
    use crate::domain::{ErrorCode, LoyaltyTier};
    use rstest::rstest;

    fn service(
        loyalty: MockLoyaltyRepository,
        customers: MockCustomerRepository,
    ) -> LoyaltyService<MockLoyaltyRepository, MockCustomerRepository> {
        LoyaltyService::new(Arc::new(loyalty), Arc::new(customers), fixture_clock())
    }

    fn account_with(customer_id: CustomerId, balance: i64, lifetime: i64) -> LoyaltyAccount {
        LoyaltyAccount {
            customer_id,
            points_balance: balance,
            lifetime_points: lifetime,
            tier: LoyaltyTier::for_lifetime_points(lifetime),
            updated_at: fixture_now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn missing_account_opens_lazily_at_bronze() {
        let customer = sample_customer();
        let id = customer.id;
        let mut loyalty = MockLoyaltyRepository::new();
        loyalty.expect_find_account().return_once(|_| Ok(None));
        loyalty.expect_record().times(0);
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(customer)));

        let account = service(loyalty, customers).account(id).await.expect("account");
        assert_eq!(account.tier, LoyaltyTier::Bronze);
        assert_eq!(account.points_balance, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn payment_award_crosses_into_silver() {
        let id = CustomerId::random();
        let existing = account_with(id, 450, 450);
        let reference = Uuid::new_v4();
        let mut loyalty = MockLoyaltyRepository::new();
        loyalty
            .expect_find_account()
            .return_once(move |_| Ok(Some(existing)));
        loyalty
            .expect_record()
            .withf(move |account, entry| {
                account.tier == LoyaltyTier::Silver
                    && entry.delta == 120
                    && entry.reason == LedgerReason::JobPayment
                    && entry.reference_id == Some(reference)
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let account = service(loyalty, MockCustomerRepository::new())
            .award_payment(id, 12_099, reference)
            .await
            .expect("awarded");
        assert_eq!(account.lifetime_points, 570);
    }

    #[rstest]
    #[tokio::test]
    async fn sub_unit_payments_award_nothing() {
        let id = CustomerId::random();
        let existing = account_with(id, 10, 10);
        let mut loyalty = MockLoyaltyRepository::new();
        loyalty
            .expect_find_account()
            .return_once(move |_| Ok(Some(existing)));
        loyalty.expect_record().times(0);

        let account = service(loyalty, MockCustomerRepository::new())
            .award_payment(id, 99, Uuid::new_v4())
            .await
            .expect("no-op");
        assert_eq!(account.points_balance, 10);
    }

    #[rstest]
    #[tokio::test]
    async fn redeeming_more_than_balance_is_conflict() {
        let id = CustomerId::random();
        let existing = account_with(id, 150, 900);
        let mut loyalty = MockLoyaltyRepository::new();
        loyalty
            .expect_find_account()
            .return_once(move |_| Ok(Some(existing)));
        loyalty.expect_record().times(0);

        let err = service(loyalty, MockCustomerRepository::new())
            .redeem_points(id, 200)
            .await
            .expect_err("insufficient");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn redemption_converts_blocks_to_credit() {
        let id = CustomerId::random();
        let existing = account_with(id, 350, 900);
        let mut loyalty = MockLoyaltyRepository::new();
        loyalty
            .expect_find_account()
            .return_once(move |_| Ok(Some(existing)));
        loyalty
            .expect_record()
            .withf(|account, entry| account.points_balance == 150 && entry.delta == -200)
            .times(1)
            .return_once(|_, _| Ok(()));

        let redemption = service(loyalty, MockCustomerRepository::new())
            .redeem_points(id, 200)
            .await
            .expect("redeemed");
        assert_eq!(redemption.credit_cents, 1_000);
        assert_eq!(redemption.account.lifetime_points, 900);
    }

    #[rstest]
    #[tokio::test]
    async fn adjustments_carry_notes() {
        let id = CustomerId::random();
        let existing = account_with(id, 50, 50);
        let mut loyalty = MockLoyaltyRepository::new();
        loyalty
            .expect_find_account()
            .return_once(move |_| Ok(Some(existing)));
        loyalty
            .expect_record()
            .withf(|_, entry| {
                entry.reason == LedgerReason::Adjustment && entry.note.as_deref() == Some("goodwill")
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        service(loyalty, MockCustomerRepository::new())
            .adjust_points(id, 25, Some("goodwill".into()))
            .await
            .expect("adjusted");
    }
}
