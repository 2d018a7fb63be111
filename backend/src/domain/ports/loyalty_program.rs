//! Driving port for loyalty accounts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CustomerId, Error, LedgerEntry, LoyaltyAccount, PageRequest};

/// Outcome of spending points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsRedemption {
    /// Account after the points were deducted.
    pub account: LoyaltyAccount,
    /// Points spent.
    pub points: i64,
    /// Credit granted for the spent points.
    pub credit_cents: i64,
}

/// Driving port for loyalty accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoyaltyProgram: Send + Sync {
    /// Current account, or a fresh bronze account when none exists yet.
    async fn account(&self, customer_id: CustomerId) -> Result<LoyaltyAccount, Error>;

    /// Ledger entries for a customer, newest first.
    async fn ledger(
        &self,
        customer_id: CustomerId,
        page: PageRequest,
    ) -> Result<Vec<LedgerEntry>, Error>;

    /// Award points for a payment. Payments under one currency unit earn
    /// nothing and leave the account untouched.
    async fn award_payment(
        &self,
        customer_id: CustomerId,
        amount_cents: i64,
        reference_id: Uuid,
    ) -> Result<LoyaltyAccount, Error>;

    /// Spend points in whole blocks for account credit.
    async fn redeem_points(
        &self,
        customer_id: CustomerId,
        points: i64,
    ) -> Result<PointsRedemption, Error>;

    /// Apply a manual signed adjustment to the balance.
    async fn adjust_points(
        &self,
        customer_id: CustomerId,
        delta: i64,
        note: Option<String>,
    ) -> Result<LoyaltyAccount, Error>;
}
