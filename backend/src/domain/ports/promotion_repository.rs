//! Port for promotions and their redemptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, PageRequest, Promotion, PromotionCode, PromotionId, PromotionRedemption};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by promotion repository adapters.
    pub enum PromotionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "promotion repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "promotion repository query failed: {message}",
        /// Promotion code is already in use.
        DuplicateCode { code: String } => "promotion code {code} already exists",
        /// Customer has already redeemed the promotion.
        AlreadyRedeemed { customer_id: CustomerId } =>
            "customer {customer_id} already redeemed this promotion",
        /// Redemption limit was reached concurrently.
        Exhausted { code: String } => "promotion {code} has no redemptions left",
    }
}

/// Persistence port for promotions and redemptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionRepository: Send + Sync {
    /// Insert a new promotion.
    async fn create(&self, promotion: &Promotion) -> Result<(), PromotionRepositoryError>;

    /// Fetch a promotion by code.
    async fn find_by_code(
        &self,
        code: &PromotionCode,
    ) -> Result<Option<Promotion>, PromotionRepositoryError>;

    /// List promotions, newest first, optionally only active ones.
    async fn list(
        &self,
        active_only: bool,
        page: &PageRequest,
    ) -> Result<Vec<Promotion>, PromotionRepositoryError>;

    /// Clear the `active` flag without touching any other column.
    ///
    /// Returns `false` when the promotion was already inactive.
    async fn deactivate(&self, id: &PromotionId) -> Result<bool, PromotionRepositoryError>;

    /// Whether the customer already redeemed the promotion.
    async fn has_redeemed(
        &self,
        promotion_id: &PromotionId,
        customer_id: &CustomerId,
    ) -> Result<bool, PromotionRepositoryError>;

    /// Insert the redemption and bump the counter in one transaction.
    ///
    /// Fails with `Exhausted` when the counter already reached the limit and
    /// with `AlreadyRedeemed` when the customer has a redemption on file.
    async fn record_redemption(
        &self,
        promotion: &Promotion,
        redemption: &PromotionRedemption,
    ) -> Result<(), PromotionRepositoryError>;

    /// Active promotions whose window closed at or before `now`.
    async fn list_ended(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Promotion>, PromotionRepositoryError>;
}
