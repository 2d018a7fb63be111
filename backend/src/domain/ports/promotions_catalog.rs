//! Driving port for promotions.

use async_trait::async_trait;

use crate::domain::{
    Channel, CustomerId, Error, PageRequest, Promotion, PromotionDraft, PromotionQuote,
};

/// Driving port for promotions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionsCatalog: Send + Sync {
    /// Validate and store a new promotion.
    async fn create_promotion(&self, draft: PromotionDraft) -> Result<Promotion, Error>;

    /// List promotions, newest first, optionally only active ones.
    async fn list_promotions(
        &self,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Vec<Promotion>, Error>;

    /// Fetch a promotion by code.
    async fn get_promotion(&self, code: &str) -> Result<Promotion, Error>;

    /// Price `amount_cents` with the promotion without redeeming it.
    async fn quote(
        &self,
        code: &str,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<PromotionQuote, Error>;

    /// Apply the promotion to `amount_cents` and record the redemption.
    async fn redeem(
        &self,
        code: &str,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<PromotionQuote, Error>;

    /// Queue the promotion to every eligible customer on `channel`.
    async fn deliver(&self, code: &str, channel: Channel) -> Result<u32, Error>;

    /// Deactivate promotions whose window has closed.
    async fn expire_ended(&self, limit: u32) -> Result<u32, Error>;
}
