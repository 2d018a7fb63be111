//! Loyalty points, tiers and the points ledger.
//!
//! Customers earn one point per whole currency unit paid. Tiers are derived
//! from lifetime points, which never decrease; redemptions and adjustments
//! only move the spendable balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::percent_of;
use super::text_enum::text_enum;
use super::{CustomerId, LedgerEntryId};

/// Lifetime points required for silver.
pub const SILVER_THRESHOLD: i64 = 500;
/// Lifetime points required for gold.
pub const GOLD_THRESHOLD: i64 = 1500;
/// Points consumed per redemption block.
pub const POINTS_PER_REDEMPTION_BLOCK: i64 = 100;
/// Credit granted per redemption block, in cents.
pub const CREDIT_CENTS_PER_BLOCK: i64 = 500;

text_enum! {
    /// Loyalty tier, ordered from lowest to highest.
    #[derive(PartialOrd, Ord)]
    pub enum LoyaltyTier {
        /// Entry tier, no discount.
        Bronze => "bronze",
        /// From 500 lifetime points, 5 % off invoices.
        Silver => "silver",
        /// From 1500 lifetime points, 10 % off invoices.
        Gold => "gold",
    }
}

impl LoyaltyTier {
    /// Tier earned by `lifetime_points`.
    pub fn for_lifetime_points(lifetime_points: i64) -> Self {
        if lifetime_points >= GOLD_THRESHOLD {
            Self::Gold
        } else if lifetime_points >= SILVER_THRESHOLD {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    /// Invoice discount granted by the tier, in percent.
    pub fn discount_percent(self) -> i64 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 5,
            Self::Gold => 10,
        }
    }

    /// Tier discount applied to `amount_cents`, rounded down.
    pub fn discount_for(self, amount_cents: i64) -> i64 {
        percent_of(amount_cents, self.discount_percent())
    }
}

text_enum! {
    /// Why a ledger entry was written.
    pub enum LedgerReason {
        /// Points earned by paying an invoice.
        JobPayment => "job_payment",
        /// Points spent for account credit.
        Redemption => "redemption",
        /// Manual staff correction.
        Adjustment => "adjustment",
        /// Points granted by a promotion.
        Promotion => "promotion",
    }
}

/// Errors raised by point accounting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoyaltyError {
    /// Awards and redemptions must move at least one point.
    #[error("points must be positive")]
    NonPositivePoints,
    /// Redemption not a whole number of blocks.
    #[error("redemptions must be a multiple of {block} points")]
    InvalidRedemptionBlock {
        /// Points per redemption block.
        block: i64,
    },
    /// Balance does not cover the redemption.
    #[error("insufficient points: balance {balance}, requested {requested}")]
    InsufficientPoints {
        /// Spendable balance.
        balance: i64,
        /// Points asked for.
        requested: i64,
    },
    /// A negative adjustment larger than the balance.
    #[error("adjustment of {delta} would make the balance negative")]
    NegativeBalance {
        /// Requested adjustment.
        delta: i64,
    },
    /// Adjustments of zero points.
    #[error("adjustment must be non-zero")]
    ZeroAdjustment,
    /// Balance or lifetime points would leave the `i64` range.
    #[error("points total would exceed the supported maximum")]
    PointsOverflow,
}

/// Points earned for a payment of `amount_cents`.
pub fn points_for_payment(amount_cents: i64) -> i64 {
    amount_cents.max(0) / 100
}

/// Spendable balance and tier for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyAccount {
    /// Account owner.
    pub customer_id: CustomerId,
    /// Spendable points.
    pub points_balance: i64,
    /// Points ever earned; never decreases.
    pub lifetime_points: i64,
    /// Tier derived from lifetime points.
    pub tier: LoyaltyTier,
    /// Last change to the account.
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    /// Fresh bronze account with no points.
    pub fn open(customer_id: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            points_balance: 0,
            lifetime_points: 0,
            tier: LoyaltyTier::Bronze,
            updated_at: now,
        }
    }

    /// Credit earned points and recompute the tier.
    pub fn award(&mut self, points: i64, now: DateTime<Utc>) -> Result<(), LoyaltyError> {
        if points <= 0 {
            return Err(LoyaltyError::NonPositivePoints);
        }
        let balance = self
            .points_balance
            .checked_add(points)
            .ok_or(LoyaltyError::PointsOverflow)?;
        let lifetime = self
            .lifetime_points
            .checked_add(points)
            .ok_or(LoyaltyError::PointsOverflow)?;
        self.points_balance = balance;
        self.lifetime_points = lifetime;
        self.tier = LoyaltyTier::for_lifetime_points(self.lifetime_points);
        self.updated_at = now;
        Ok(())
    }

    /// Spend points for account credit, returning the credit in cents.
    pub fn redeem(&mut self, points: i64, now: DateTime<Utc>) -> Result<i64, LoyaltyError> {
        if points <= 0 {
            return Err(LoyaltyError::NonPositivePoints);
        }
        if points % POINTS_PER_REDEMPTION_BLOCK != 0 {
            return Err(LoyaltyError::InvalidRedemptionBlock {
                block: POINTS_PER_REDEMPTION_BLOCK,
            });
        }
        if points > self.points_balance {
            return Err(LoyaltyError::InsufficientPoints {
                balance: self.points_balance,
                requested: points,
            });
        }
        let credit = (points / POINTS_PER_REDEMPTION_BLOCK)
            .checked_mul(CREDIT_CENTS_PER_BLOCK)
            .ok_or(LoyaltyError::PointsOverflow)?;
        self.points_balance -= points;
        self.updated_at = now;
        Ok(credit)
    }

    /// Manual correction by staff. Positive deltas count towards lifetime
    /// points; negative deltas only reduce the balance.
    pub fn adjust(&mut self, delta: i64, now: DateTime<Utc>) -> Result<(), LoyaltyError> {
        if delta == 0 {
            return Err(LoyaltyError::ZeroAdjustment);
        }
        if delta > 0 {
            return self.award(delta, now);
        }
        if delta < -self.points_balance {
            return Err(LoyaltyError::NegativeBalance { delta });
        }
        self.points_balance += delta;
        self.updated_at = now;
        Ok(())
    }
}

/// Immutable record of a point movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// Account owner.
    pub customer_id: CustomerId,
    /// Signed point movement.
    pub delta: i64,
    /// Why the points moved.
    pub reason: LedgerReason,
    /// Invoice or promotion that caused the movement, when there is one.
    pub reference_id: Option<uuid::Uuid>,
    /// Free-text note, used by staff adjustments.
    pub note: Option<String>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Entry with a fresh identifier and no note.
    pub fn new(
        customer_id: CustomerId,
        delta: i64,
        reason: LedgerReason,
        reference_id: Option<uuid::Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::random(),
            customer_id,
            delta,
            reason,
            reference_id,
            note: None,
            created_at: now,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
