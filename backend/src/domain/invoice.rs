//! Invoices, pricing and payment status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::money::MAX_AMOUNT_CENTS;
use super::text_enum::text_enum;
use super::{CustomerId, InvoiceId, JobId, LoyaltyTier, PageRequest, PromotionCode};

/// Payment terms applied when no due date is supplied.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 14;

text_enum! {
    /// Invoice lifecycle state.
    pub enum InvoiceStatus {
        /// Being prepared; not yet sent.
        Draft => "draft",
        /// Sent to the customer and awaiting payment.
        Sent => "sent",
        /// Paid in full.
        Paid => "paid",
        /// Sent and past its due date.
        Overdue => "overdue",
        /// Cancelled without payment.
        Void => "void",
    }
}

impl InvoiceStatus {
    /// Whether an invoice may move from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Sent | Self::Void)
                | (Self::Sent, Self::Paid | Self::Overdue | Self::Void)
                | (Self::Overdue, Self::Paid | Self::Void)
        )
    }
}

/// Errors raised by invoice rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvoiceError {
    /// Subtotal below zero.
    #[error("subtotalCents must not be negative")]
    NegativeSubtotal,
    /// Subtotal above the supported amount.
    #[error("subtotalCents must not exceed {max}")]
    SubtotalTooLarge {
        /// Largest accepted subtotal in cents.
        max: i64,
    },
    /// Status change not allowed from the current status.
    #[error("cannot move invoice from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Requested status.
        to: InvoiceStatus,
    },
}

/// Breakdown of an invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePricing {
    /// Amount before discounts.
    pub subtotal_cents: i64,
    /// Tier discount taken from the subtotal.
    pub loyalty_discount_cents: i64,
    /// Promotion discount taken after the tier discount.
    pub promotion_discount_cents: i64,
    /// Amount due.
    pub total_cents: i64,
}

impl InvoicePricing {
    /// Apply the tier discount, then a promotion discount computed on the
    /// remaining amount. The total never drops below zero.
    pub fn compute(
        subtotal_cents: i64,
        tier: LoyaltyTier,
        promotion_discount: impl FnOnce(i64) -> i64,
    ) -> Result<Self, InvoiceError> {
        if subtotal_cents < 0 {
            return Err(InvoiceError::NegativeSubtotal);
        }
        if subtotal_cents > MAX_AMOUNT_CENTS {
            return Err(InvoiceError::SubtotalTooLarge {
                max: MAX_AMOUNT_CENTS,
            });
        }
        let loyalty = tier.discount_for(subtotal_cents);
        let after_loyalty = subtotal_cents - loyalty;
        let promotion = promotion_discount(after_loyalty).clamp(0, after_loyalty);
        Ok(Self {
            subtotal_cents,
            loyalty_discount_cents: loyalty,
            promotion_discount_cents: promotion,
            total_cents: after_loyalty - promotion,
        })
    }

    /// Combined tier and promotion discount.
    pub fn discount_cents(&self) -> i64 {
        self.loyalty_discount_cents + self.promotion_discount_cents
    }
}

/// Customer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Invoice identifier.
    pub id: InvoiceId,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Job the invoice covers, if any.
    pub job_id: Option<JobId>,
    /// Amount before discounts.
    pub subtotal_cents: i64,
    /// Combined discount applied.
    pub discount_cents: i64,
    /// Amount due.
    pub total_cents: i64,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// Promotion redeemed on this invoice.
    pub promotion_code: Option<PromotionCode>,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// When the invoice was sent.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the invoice was paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build a draft invoice from a computed price.
    pub fn draft(
        id: InvoiceId,
        customer_id: CustomerId,
        job_id: Option<JobId>,
        pricing: InvoicePricing,
        promotion_code: Option<PromotionCode>,
        due_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            job_id,
            subtotal_cents: pricing.subtotal_cents,
            discount_cents: pricing.discount_cents(),
            total_cents: pricing.total_cents,
            status: InvoiceStatus::Draft,
            promotion_code,
            due_date,
            issued_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, stamping issue or payment time.
    pub fn transition(&mut self, next: InvoiceStatus, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        if !self.status.can_transition_to(next) {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        match next {
            InvoiceStatus::Sent => self.issued_at = Some(now),
            InvoiceStatus::Paid => self.paid_at = Some(now),
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Customer to bill.
    pub customer_id: CustomerId,
    /// Job to bill for.
    pub job_id: Option<JobId>,
    /// Falls back to the job price when omitted.
    pub subtotal_cents: Option<i64>,
    /// Promotion code to redeem.
    pub promotion_code: Option<String>,
    /// Due date; defaults to the configured payment term.
    pub due_date: Option<NaiveDate>,
}

/// List filter for invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    /// Restrict to one customer.
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    pub status: Option<InvoiceStatus>,
    /// Page to return.
    pub page: PageRequest,
}
