//! Promotions, discount codes and redemption eligibility.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::money::percent_of;
use super::{CustomerId, LoyaltyTier, PromotionId};

static CODE_RE: OnceLock<Regex> = OnceLock::new();

fn code_regex() -> &'static Regex {
    CODE_RE.get_or_init(|| {
        Regex::new("^[A-Z0-9-]{3,32}$")
            .unwrap_or_else(|error| panic!("promotion code regex failed to compile: {error}"))
    })
}

/// Validation failures for promotion input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromotionValidationError {
    /// Code outside the accepted shape.
    #[error("code must be 3-32 characters of A-Z, 0-9 or '-'")]
    InvalidCode,
    /// Percent outside 1 to 100.
    #[error("percent discounts must be between 1 and 100")]
    InvalidPercent,
    /// Fixed amount not positive.
    #[error("fixed discounts must be positive")]
    InvalidFixedAmount,
    /// Window ends before it starts.
    #[error("endsAt must be after startsAt")]
    InvalidWindow,
    /// Redemption limit not positive.
    #[error("maxRedemptions must be positive")]
    InvalidMaxRedemptions,
    /// Blank description.
    #[error("description must not be empty")]
    EmptyDescription,
}

/// Normalised promotion code.
///
/// # Examples
/// ```
/// use crm_backend::domain::PromotionCode;
///
/// let code = PromotionCode::new(" spring-25 ").expect("valid");
/// assert_eq!(code.as_ref(), "SPRING-25");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromotionCode(String);

impl PromotionCode {
    /// Trim and upper-case `raw`, rejecting codes outside the accepted shape.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PromotionValidationError> {
        let code = raw.as_ref().trim().to_uppercase();
        if code_regex().is_match(&code) {
            Ok(Self(code))
        } else {
            Err(PromotionValidationError::InvalidCode)
        }
    }
}

impl AsRef<str> for PromotionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromotionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PromotionCode> for String {
    fn from(value: PromotionCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for PromotionCode {
    type Error = PromotionValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Discount granted by a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the amount, 1-100.
    Percent(i64),
    /// Fixed amount in cents.
    Fixed(i64),
}

impl Discount {
    fn validate(self) -> Result<Self, PromotionValidationError> {
        match self {
            Self::Percent(p) if !(1..=100).contains(&p) => {
                Err(PromotionValidationError::InvalidPercent)
            }
            Self::Fixed(cents) if cents <= 0 => Err(PromotionValidationError::InvalidFixedAmount),
            other => Ok(other),
        }
    }

    /// Discount for `amount_cents`, never exceeding the amount.
    pub fn amount_off(self, amount_cents: i64) -> i64 {
        let amount = amount_cents.max(0);
        let off = match self {
            Self::Percent(p) => percent_of(amount, p),
            Self::Fixed(cents) => cents,
        };
        off.min(amount)
    }

    /// Storage form: (`kind`, `value`).
    pub fn parts(self) -> (&'static str, i64) {
        match self {
            Self::Percent(p) => ("percent", p),
            Self::Fixed(cents) => ("fixed", cents),
        }
    }

    /// Rebuild from storage form.
    pub fn from_parts(kind: &str, value: i64) -> Option<Self> {
        match kind {
            "percent" => Some(Self::Percent(value)),
            "fixed" => Some(Self::Fixed(value)),
            _ => None,
        }
    }
}

/// Reasons a promotion cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromotionIneligibility {
    /// Promotion was switched off.
    #[error("promotion is not active")]
    Inactive,
    /// Window has not opened.
    #[error("promotion has not started yet")]
    NotStarted,
    /// Window has closed.
    #[error("promotion has ended")]
    Ended,
    /// Redemption limit reached.
    #[error("promotion has reached its redemption limit")]
    Exhausted,
    /// Customer tier below the minimum.
    #[error("customer tier is below the promotion minimum")]
    TierTooLow,
    /// Customer used the promotion before.
    #[error("customer has already redeemed this promotion")]
    AlreadyRedeemed,
}

impl PromotionIneligibility {
    /// Stable machine-readable reason.
    pub fn code(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::NotStarted => "not_started",
            Self::Ended => "ended",
            Self::Exhausted => "exhausted",
            Self::TierTooLow => "tier_too_low",
            Self::AlreadyRedeemed => "already_redeemed",
        }
    }
}

/// Promotion definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Promotion identifier.
    pub id: PromotionId,
    /// Code customers enter.
    pub code: PromotionCode,
    /// Text shown to customers.
    pub description: String,
    /// Discount granted.
    pub discount: Discount,
    /// Start of the redemption window.
    pub starts_at: DateTime<Utc>,
    /// End of the redemption window.
    pub ends_at: DateTime<Utc>,
    /// Total redemptions allowed; unlimited when absent.
    pub max_redemptions: Option<i32>,
    /// Redemptions recorded so far.
    pub redemption_count: i32,
    /// Lowest loyalty tier that may redeem.
    pub min_tier: Option<LoyaltyTier>,
    /// Whether the promotion can still be redeemed.
    pub active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionDraft {
    /// Requested code, normalised on creation.
    pub code: String,
    /// Text shown to customers.
    pub description: String,
    /// Discount granted.
    pub discount: Discount,
    /// Start of the redemption window.
    pub starts_at: DateTime<Utc>,
    /// End of the redemption window.
    pub ends_at: DateTime<Utc>,
    /// Total redemptions allowed.
    pub max_redemptions: Option<i32>,
    /// Lowest loyalty tier that may redeem.
    pub min_tier: Option<LoyaltyTier>,
}

impl Promotion {
    /// Validate a draft into an active promotion.
    pub fn create(
        id: PromotionId,
        draft: PromotionDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PromotionValidationError> {
        let code = PromotionCode::new(&draft.code)?;
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(PromotionValidationError::EmptyDescription);
        }
        if draft.ends_at <= draft.starts_at {
            return Err(PromotionValidationError::InvalidWindow);
        }
        if matches!(draft.max_redemptions, Some(max) if max <= 0) {
            return Err(PromotionValidationError::InvalidMaxRedemptions);
        }
        Ok(Self {
            id,
            code,
            description: description.to_owned(),
            discount: draft.discount.validate()?,
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
            max_redemptions: draft.max_redemptions,
            redemption_count: 0,
            min_tier: draft.min_tier,
            active: true,
            created_at: now,
        })
    }

    /// Whether the promotion window and limits allow use at `now`, ignoring
    /// customer-specific checks.
    pub fn availability(&self, now: DateTime<Utc>) -> Result<(), PromotionIneligibility> {
        if !self.active {
            return Err(PromotionIneligibility::Inactive);
        }
        if now < self.starts_at {
            return Err(PromotionIneligibility::NotStarted);
        }
        if now >= self.ends_at {
            return Err(PromotionIneligibility::Ended);
        }
        if matches!(self.max_redemptions, Some(max) if self.redemption_count >= max) {
            return Err(PromotionIneligibility::Exhausted);
        }
        Ok(())
    }

    /// Full eligibility check for a customer.
    pub fn eligibility(
        &self,
        now: DateTime<Utc>,
        tier: LoyaltyTier,
        already_redeemed: bool,
    ) -> Result<(), PromotionIneligibility> {
        self.availability(now)?;
        if matches!(self.min_tier, Some(min) if tier < min) {
            return Err(PromotionIneligibility::TierTooLow);
        }
        if already_redeemed {
            return Err(PromotionIneligibility::AlreadyRedeemed);
        }
        Ok(())
    }
}

/// Record that a customer used a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRedemption {
    /// Promotion redeemed.
    pub promotion_id: PromotionId,
    /// Redeeming customer.
    pub customer_id: CustomerId,
    /// Amount the discount applied to.
    pub amount_cents: i64,
    /// Discount granted.
    pub discount_cents: i64,
    /// Redemption time.
    pub redeemed_at: DateTime<Utc>,
}

/// Discount quote returned by validation and redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionQuote {
    /// Promotion code.
    pub code: PromotionCode,
    /// Amount before the discount.
    pub amount_cents: i64,
    /// Discount granted.
    pub discount_cents: i64,
    /// Amount after the discount.
    pub total_cents: i64,
}

impl PromotionQuote {
    /// Price `amount_cents` with the promotion's discount.
    pub fn new(promotion: &Promotion, amount_cents: i64) -> Self {
        let discount_cents = promotion.discount.amount_off(amount_cents);
        Self {
            code: promotion.code.clone(),
            amount_cents,
            discount_cents,
            total_cents: amount_cents.max(0) - discount_cents,
        }
    }
}
