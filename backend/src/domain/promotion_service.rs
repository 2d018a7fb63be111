//! Promotions: catalogue, eligibility, redemption and campaign delivery.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use crate::domain::customer_service::map_customer_error;
use crate::domain::pagination::MAX_PAGE_LIMIT;
use crate::domain::ports::{
    Communications, CustomerRepository, LoyaltyProgram, PromotionRepository,
    PromotionRepositoryError, PromotionsCatalog,
};
use crate::domain::{
    Channel, Customer, CustomerId, Error, MAX_AMOUNT_CENTS, MessageDraft, MessagePurpose, MessageStatus,
    PageRequest, Promotion, PromotionCode, PromotionDraft, PromotionId, PromotionIneligibility,
    PromotionQuote, PromotionRedemption, PromotionValidationError,
};

fn map_promotion_error(error: PromotionRepositoryError) -> Error {
    match error {
        PromotionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("promotion repository unavailable: {message}"))
        }
        PromotionRepositoryError::Query { message } => {
            Error::internal(format!("promotion repository error: {message}"))
        }
        PromotionRepositoryError::DuplicateCode { code } => {
            Error::conflict(format!("promotion code {code} already exists")).with_details(json!({
                "field": "code",
                "code": "duplicate_code",
            }))
        }
        PromotionRepositoryError::AlreadyRedeemed { .. } => {
            ineligible(PromotionIneligibility::AlreadyRedeemed)
        }
        PromotionRepositoryError::Exhausted { .. } => ineligible(PromotionIneligibility::Exhausted),
    }
}

fn ineligible(reason: PromotionIneligibility) -> Error {
    Error::conflict(reason.to_string()).with_details(json!({ "code": reason.code() }))
}

fn map_validation_error(error: PromotionValidationError) -> Error {
    let field = match error {
        PromotionValidationError::InvalidCode => "code",
        PromotionValidationError::InvalidPercent
        | PromotionValidationError::InvalidFixedAmount => "discount",
        PromotionValidationError::InvalidWindow => "endsAt",
        PromotionValidationError::InvalidMaxRedemptions => "maxRedemptions",
        PromotionValidationError::EmptyDescription => "description",
    };
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": field, "code": "invalid" }))
}

fn campaign_message(promotion: &Promotion, customer: &Customer, channel: Channel) -> MessageDraft {
    MessageDraft {
        customer_id: customer.id,
        channel,
        purpose: MessagePurpose::Promotion,
        subject: Some(promotion.description.clone()),
        body: format!(
            "Hi {}, {} Use code {} before {}.",
            customer.name,
            promotion.description,
            promotion.code,
            promotion.ends_at.format("%-d %B"),
        ),
    }
}

/// Promotion service implementing the catalogue port.
#[derive(Clone)]
pub struct PromotionService<P, C> {
    promotions: Arc<P>,
    customers: Arc<C>,
    loyalty: Arc<dyn LoyaltyProgram>,
    messages: Arc<dyn Communications>,
    clock: Arc<dyn Clock>,
}

impl<P, C> PromotionService<P, C> {
    /// Create the service over its repositories and collaborators.
    pub fn new(
        promotions: Arc<P>,
        customers: Arc<C>,
        loyalty: Arc<dyn LoyaltyProgram>,
        messages: Arc<dyn Communications>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            promotions,
            customers,
            loyalty,
            messages,
            clock,
        }
    }
}

impl<P, C> PromotionService<P, C>
where
    P: PromotionRepository,
    C: CustomerRepository,
{
    async fn require_promotion(&self, raw: &str) -> Result<Promotion, Error> {
        let code = PromotionCode::new(raw).map_err(map_validation_error)?;
        self.promotions
            .find_by_code(&code)
            .await
            .map_err(map_promotion_error)?
            .ok_or_else(|| Error::not_found(format!("promotion {code} not found")))
    }

    /// Outer error for lookup failures, inner for rule failures.
    async fn eligibility_for(
        &self,
        promotion: &Promotion,
        customer_id: CustomerId,
    ) -> Result<Result<(), PromotionIneligibility>, Error> {
        let tier = self.loyalty.account(customer_id).await?.tier;
        let redeemed = self
            .promotions
            .has_redeemed(&promotion.id, &customer_id)
            .await
            .map_err(map_promotion_error)?;
        Ok(promotion.eligibility(self.clock.utc(), tier, redeemed))
    }

    async fn eligible_quote(
        &self,
        code: &str,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<(Promotion, PromotionQuote), Error> {
        if amount_cents < 0 {
            return Err(Error::invalid_request("amountCents must not be negative")
                .with_details(json!({ "field": "amountCents", "code": "negative" })));
        }
        if amount_cents > MAX_AMOUNT_CENTS {
            return Err(
                Error::invalid_request(format!("amountCents must not exceed {MAX_AMOUNT_CENTS}"))
                    .with_details(json!({ "field": "amountCents", "code": "too_large" })),
            );
        }
        let promotion = self.require_promotion(code).await?;
        self.eligibility_for(&promotion, customer_id)
            .await?
            .map_err(ineligible)?;
        let quote = PromotionQuote::new(&promotion, amount_cents);
        Ok((promotion, quote))
    }
}

#[async_trait]
impl<P, C> PromotionsCatalog for PromotionService<P, C>
where
    P: PromotionRepository,
    C: CustomerRepository,
{
    async fn create_promotion(&self, draft: PromotionDraft) -> Result<Promotion, Error> {
        let promotion = Promotion::create(PromotionId::random(), draft, self.clock.utc())
            .map_err(map_validation_error)?;
        self.promotions
            .create(&promotion)
            .await
            .map_err(map_promotion_error)?;
        tracing::info!(code = %promotion.code, "promotion created");
        Ok(promotion)
    }

    async fn list_promotions(
        &self,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Vec<Promotion>, Error> {
        self.promotions
            .list(active_only, &page)
            .await
            .map_err(map_promotion_error)
    }

    async fn get_promotion(&self, code: &str) -> Result<Promotion, Error> {
        self.require_promotion(code).await
    }

    async fn quote(
        &self,
        code: &str,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<PromotionQuote, Error> {
        let (_, quote) = self.eligible_quote(code, customer_id, amount_cents).await?;
        Ok(quote)
    }

    async fn redeem(
        &self,
        code: &str,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<PromotionQuote, Error> {
        let (promotion, quote) = self.eligible_quote(code, customer_id, amount_cents).await?;
        let redemption = PromotionRedemption {
            promotion_id: promotion.id,
            customer_id,
            amount_cents,
            discount_cents: quote.discount_cents,
            redeemed_at: self.clock.utc(),
        };
        self.promotions
            .record_redemption(&promotion, &redemption)
            .await
            .map_err(map_promotion_error)?;
        tracing::info!(code = %promotion.code, %customer_id, "promotion redeemed");
        Ok(quote)
    }

    async fn deliver(&self, code: &str, channel: Channel) -> Result<u32, Error> {
        let promotion = self.require_promotion(code).await?;
        promotion
            .availability(self.clock.utc())
            .map_err(ineligible)?;

        let mut delivered = 0;
        let mut offset = 0;
        loop {
            let page = PageRequest::new(Some(MAX_PAGE_LIMIT), Some(offset))
                .map_err(|error| Error::internal(error.to_string()))?;
            let batch = self
                .customers
                .list_contactable(channel, &page)
                .await
                .map_err(map_customer_error)?;
            let fetched = u32::try_from(batch.len()).unwrap_or(u32::MAX);
            for customer in batch {
                if let Err(reason) = self.eligibility_for(&promotion, customer.id).await? {
                    tracing::debug!(customer_id = %customer.id, reason = reason.code(), "promotion not offered");
                    continue;
                }
                let message = self
                    .messages
                    .enqueue(campaign_message(&promotion, &customer, channel))
                    .await?;
                if message.status != MessageStatus::Skipped {
                    delivered += 1;
                }
            }
            if fetched < MAX_PAGE_LIMIT {
                break;
            }
            offset += fetched;
        }
        tracing::info!(code = %promotion.code, %channel, delivered, "promotion delivered");
        Ok(delivered)
    }

    async fn expire_ended(&self, limit: u32) -> Result<u32, Error> {
        let ended = self
            .promotions
            .list_ended(self.clock.utc(), limit)
            .await
            .map_err(map_promotion_error)?;
        let mut processed = 0;
        for promotion in ended {
            let deactivated = self
                .promotions
                .deactivate(&promotion.id)
                .await
                .map_err(map_promotion_error)?;
            if deactivated {
                processed += 1;
            }
        }
        Ok(processed)
    }
}

#[cfg(test)]
#[path = "promotion_service_tests.rs"]
mod tests;
