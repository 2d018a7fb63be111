//! Sales opportunity pipeline and lead scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::{CustomerId, LoyaltyTier, OpportunityId, PageRequest};

/// Completed jobs within this many days earn the recency bonus.
pub const RECENT_JOB_WINDOW_DAYS: i64 = 30;
const RECENCY_BONUS: u8 = 10;
const VALUE_BONUS_CAP: i64 = 20;
const VALUE_BONUS_STEP_CENTS: i64 = 10_000;
const MAX_SCORE: u8 = 100;

text_enum! {
    /// Kind of revenue opportunity.
    pub enum OpportunityKind {
        /// Book the customer again.
        Rebook => "rebook",
        /// Sell a larger service.
        Upsell => "upsell",
        /// Ask for a referral.
        Referral => "referral",
        /// Win back a lapsed customer.
        WinBack => "win_back",
    }
}

impl OpportunityKind {
    fn base_score(self) -> u8 {
        match self {
            Self::Rebook => 40,
            Self::Upsell => 30,
            Self::Referral => 50,
            Self::WinBack => 20,
        }
    }
}

text_enum! {
    /// Pipeline stage.
    pub enum OpportunityStatus {
        /// Not yet contacted.
        Open => "open",
        /// Customer contacted.
        Contacted => "contacted",
        /// Customer booked.
        Converted => "converted",
        /// Customer said no.
        Declined => "declined",
        /// Lapsed without an outcome.
        Expired => "expired",
    }
}

impl OpportunityStatus {
    /// Whether moving to `next` is allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Open,
                Self::Contacted | Self::Converted | Self::Declined | Self::Expired
            ) | (
                Self::Contacted,
                Self::Converted | Self::Declined | Self::Expired
            )
        )
    }

    /// Whether the opportunity reached a final outcome.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Converted | Self::Declined | Self::Expired)
    }
}

/// Inputs to the lead score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInputs {
    /// Opportunity kind.
    pub kind: OpportunityKind,
    /// Customer loyalty tier.
    pub tier: LoyaltyTier,
    /// Expected value.
    pub estimated_value_cents: i64,
    /// Days since the customer's last completed job.
    pub days_since_last_completed_job: Option<i64>,
}

/// Score an opportunity from 0 to 100.
///
/// # Examples
/// ```
/// use crm_backend::domain::{LoyaltyTier, OpportunityKind, ScoreInputs, score_opportunity};
///
/// let score = score_opportunity(ScoreInputs {
///     kind: OpportunityKind::Rebook,
///     tier: LoyaltyTier::Silver,
///     estimated_value_cents: 50_000,
///     days_since_last_completed_job: Some(12),
/// });
/// assert_eq!(score, 40 + 10 + 5 + 10);
/// ```
pub fn score_opportunity(inputs: ScoreInputs) -> u8 {
    let tier_bonus: u8 = match inputs.tier {
        LoyaltyTier::Bronze => 0,
        LoyaltyTier::Silver => 10,
        LoyaltyTier::Gold => 20,
    };
    let value_bonus = u8::try_from(
        (inputs.estimated_value_cents.max(0) / VALUE_BONUS_STEP_CENTS).min(VALUE_BONUS_CAP),
    )
    .unwrap_or(u8::MAX);
    let recency_bonus = match inputs.days_since_last_completed_job {
        Some(days) if (0..=RECENT_JOB_WINDOW_DAYS).contains(&days) => RECENCY_BONUS,
        _ => 0,
    };
    inputs
        .kind
        .base_score()
        .saturating_add(tier_bonus)
        .saturating_add(value_bonus)
        .saturating_add(recency_bonus)
        .min(MAX_SCORE)
}

/// Errors raised by opportunity rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpportunityError {
    /// Estimated value below zero.
    #[error("estimatedValueCents must not be negative")]
    NegativeValue,
    /// Expiry not after the current time.
    #[error("expiresAt must be in the future")]
    ExpiryInPast,
    /// Status change not allowed from the current status.
    #[error("cannot move opportunity from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OpportunityStatus,
        /// Requested status.
        to: OpportunityStatus,
    },
}

/// Opportunity in the sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    /// Opportunity identifier.
    pub id: OpportunityId,
    /// Customer the opportunity targets.
    pub customer_id: CustomerId,
    /// Opportunity kind.
    pub kind: OpportunityKind,
    /// Pipeline status.
    pub status: OpportunityStatus,
    /// Lead score from 0 to 100.
    pub score: u8,
    /// Expected value.
    pub estimated_value_cents: i64,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the opportunity lapses.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the customer was first contacted.
    pub contacted_at: Option<DateTime<Utc>>,
    /// When the opportunity closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Input for opening an opportunity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityDraft {
    /// Customer the opportunity targets.
    pub customer_id: CustomerId,
    /// Opportunity kind.
    pub kind: OpportunityKind,
    /// Expected value.
    pub estimated_value_cents: i64,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the opportunity lapses.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Opportunity {
    /// Open a scored opportunity.
    pub fn open(
        id: OpportunityId,
        draft: OpportunityDraft,
        score: u8,
        now: DateTime<Utc>,
    ) -> Result<Self, OpportunityError> {
        if draft.estimated_value_cents < 0 {
            return Err(OpportunityError::NegativeValue);
        }
        if matches!(draft.expires_at, Some(at) if at <= now) {
            return Err(OpportunityError::ExpiryInPast);
        }
        Ok(Self {
            id,
            customer_id: draft.customer_id,
            kind: draft.kind,
            status: OpportunityStatus::Open,
            score,
            estimated_value_cents: draft.estimated_value_cents,
            notes: draft.notes,
            expires_at: draft.expires_at,
            contacted_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Move to `next`, stamping contact and close times.
    pub fn transition(
        &mut self,
        next: OpportunityStatus,
        now: DateTime<Utc>,
    ) -> Result<(), OpportunityError> {
        if !self.status.can_transition_to(next) {
            return Err(OpportunityError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == OpportunityStatus::Contacted {
            self.contacted_at = Some(now);
        }
        if next.is_closed() {
            self.closed_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// List filter for opportunities; results are ordered by score descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityFilter {
    /// Restrict to one customer.
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    pub status: Option<OpportunityStatus>,
    /// Page to return.
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn inputs(kind: OpportunityKind) -> ScoreInputs {
        ScoreInputs {
            kind,
            tier: LoyaltyTier::Bronze,
            estimated_value_cents: 0,
            days_since_last_completed_job: None,
        }
    }

    #[rstest]
    #[case(OpportunityKind::Rebook, 40)]
    #[case(OpportunityKind::Upsell, 30)]
    #[case(OpportunityKind::Referral, 50)]
    #[case(OpportunityKind::WinBack, 20)]
    fn base_scores(#[case] kind: OpportunityKind, #[case] expected: u8) {
        assert_eq!(score_opportunity(inputs(kind)), expected);
    }

    #[rstest]
    #[case(Some(0), 10)]
    #[case(Some(30), 10)]
    #[case(Some(31), 0)]
    #[case(None, 0)]
    fn recency_bonus_window(#[case] days: Option<i64>, #[case] bonus: u8) {
        let score = score_opportunity(ScoreInputs {
            days_since_last_completed_job: days,
            ..inputs(OpportunityKind::Upsell)
        });
        assert_eq!(score, 30 + bonus);
    }

    #[rstest]
    fn score_is_clamped() {
        let score = score_opportunity(ScoreInputs {
            kind: OpportunityKind::Referral,
            tier: LoyaltyTier::Gold,
            estimated_value_cents: 10_000_000,
            days_since_last_completed_job: Some(1),
        });
        assert_eq!(score, 100);
    }

    #[rstest]
    fn value_bonus_is_capped_at_twenty() {
        let score = score_opportunity(ScoreInputs {
            estimated_value_cents: 5_000_000,
            ..inputs(OpportunityKind::WinBack)
        });
        assert_eq!(score, 40);
    }

    #[rstest]
    #[case(OpportunityStatus::Open, OpportunityStatus::Contacted, true)]
    #[case(OpportunityStatus::Contacted, OpportunityStatus::Open, false)]
    #[case(OpportunityStatus::Converted, OpportunityStatus::Declined, false)]
    #[case(OpportunityStatus::Contacted, OpportunityStatus::Expired, true)]
    fn transition_table(
        #[case] from: OpportunityStatus,
        #[case] to: OpportunityStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn closing_stamps_closed_at() {
        let now = Utc::now();
        let mut opportunity = Opportunity::open(
            OpportunityId::random(),
            OpportunityDraft {
                customer_id: CustomerId::random(),
                kind: OpportunityKind::Rebook,
                estimated_value_cents: 1_000,
                notes: None,
                expires_at: None,
            },
            40,
            now,
        )
        .expect("valid");
        opportunity
            .transition(OpportunityStatus::Converted, now)
            .expect("convert");
        assert_eq!(opportunity.closed_at, Some(now));
    }
}
