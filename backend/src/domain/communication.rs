//! Outbound customer messages and delivery planning.
//!
//! Every message is logged. Before delivery the planner checks opt-in and
//! contact details, then the quiet-hours gate in the customer's own zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::{Customer, CustomerId, MessageId, PageRequest, QuietHours, SendDecision};

/// Longest accepted message body.
pub const MESSAGE_BODY_MAX: usize = 5000;
/// Longest accepted subject line.
pub const MESSAGE_SUBJECT_MAX: usize = 200;

text_enum! {
    /// Delivery channel.
    pub enum Channel {
        /// Email to the customer's address.
        Email => "email",
        /// Text message to the customer's phone.
        Sms => "sms",
    }
}

text_enum! {
    /// Business reason for a message.
    pub enum MessagePurpose {
        /// Upcoming job reminder.
        JobReminder => "job_reminder",
        /// Review request or reminder after a completed job.
        ReviewRequest => "review_request",
        /// Promotion campaign.
        Promotion => "promotion",
        /// Invoice issued.
        Invoice => "invoice",
        /// Anything else, including manual staff messages.
        General => "general",
    }
}

text_enum! {
    /// Delivery state of a logged message.
    pub enum MessageStatus {
        /// Waiting for the quiet window to close; `scheduled_for` holds the resume time.
        Deferred => "deferred",
        /// Handed to the sender.
        Sent => "sent",
        /// The sender rejected the message; `error` holds the reason.
        Failed => "failed",
        /// Not delivered because of opt-out, missing address or archival.
        Skipped => "skipped",
    }
}

/// Validation errors for message drafts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageValidationError {
    /// Body is empty or too long.
    #[error("body must be 1-{max} characters")]
    InvalidBody {
        /// Longest accepted body.
        max: usize,
    },
    /// Subject exceeds the limit.
    #[error("subject must be at most {max} characters")]
    SubjectTooLong {
        /// Longest accepted subject.
        max: usize,
    },
}

/// Message to be planned and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    /// Recipient.
    pub customer_id: CustomerId,
    /// Delivery channel.
    pub channel: Channel,
    /// Business reason.
    pub purpose: MessagePurpose,
    /// Optional subject line; blank subjects are dropped.
    pub subject: Option<String>,
    /// Message text.
    pub body: String,
}

impl MessageDraft {
    /// Check body and subject lengths, trimming surrounding whitespace.
    pub fn validate(self) -> Result<Self, MessageValidationError> {
        let body = self.body.trim().to_owned();
        if body.is_empty() || body.chars().count() > MESSAGE_BODY_MAX {
            return Err(MessageValidationError::InvalidBody {
                max: MESSAGE_BODY_MAX,
            });
        }
        let subject = self
            .subject
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        if matches!(&subject, Some(s) if s.chars().count() > MESSAGE_SUBJECT_MAX) {
            return Err(MessageValidationError::SubjectTooLong {
                max: MESSAGE_SUBJECT_MAX,
            });
        }
        Ok(Self {
            body,
            subject,
            ..self
        })
    }
}

/// Logged outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Recipient.
    pub customer_id: CustomerId,
    /// Delivery channel.
    pub channel: Channel,
    /// Business reason.
    pub purpose: MessagePurpose,
    /// Email subject.
    pub subject: Option<String>,
    /// Message text.
    pub body: String,
    /// Current delivery state.
    pub status: MessageStatus,
    /// Next dispatch attempt for deferred messages.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When the sender accepted the message.
    pub sent_at: Option<DateTime<Utc>>,
    /// Skip or failure reason.
    pub error: Option<String>,
    /// When the message was logged.
    pub created_at: DateTime<Utc>,
}

impl OutboundMessage {
    /// Log entry for a validated draft, before planning.
    pub fn from_draft(draft: MessageDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::random(),
            customer_id: draft.customer_id,
            channel: draft.channel,
            purpose: draft.purpose,
            subject: draft.subject,
            body: draft.body,
            status: MessageStatus::Deferred,
            scheduled_for: Some(now),
            sent_at: None,
            error: None,
            created_at: now,
        }
    }

    /// Record that the message will not be delivered.
    pub fn mark_skipped(&mut self, reason: SkipReason) {
        self.status = MessageStatus::Skipped;
        self.scheduled_for = None;
        self.error = Some(reason.as_str().to_owned());
    }

    /// Hold the message until `until`.
    pub fn mark_deferred(&mut self, until: DateTime<Utc>) {
        self.status = MessageStatus::Deferred;
        self.scheduled_for = Some(until);
    }

    /// Record a successful hand-off to the sender.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.status = MessageStatus::Sent;
        self.sent_at = Some(now);
        self.scheduled_for = None;
        self.error = None;
    }

    /// Record a sender failure.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = MessageStatus::Failed;
        self.scheduled_for = None;
        self.error = Some(error.into());
    }
}

/// Why a message will not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The customer did not opt in to the channel.
    OptedOut,
    /// No email address or phone number on file.
    MissingAddress,
    /// The customer is archived.
    Archived,
}

impl SkipReason {
    /// Human-readable reason stored in the message log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OptedOut => "customer has not opted in to this channel",
            Self::MissingAddress => "customer has no address for this channel",
            Self::Archived => "customer is archived",
        }
    }
}

/// Outcome of planning delivery for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// Do not deliver.
    Skip(SkipReason),
    /// Retry at the given instant.
    Defer(DateTime<Utc>),
    /// Deliver now.
    Send {
        /// Email address or phone number to deliver to.
        address: String,
    },
}

/// Decide whether a message to `customer` may go out at `now`.
///
/// Opt-out wins over quiet hours so a deferred message never lands on a
/// channel the customer has since left.
pub fn plan_delivery(
    customer: &Customer,
    channel: Channel,
    quiet_hours: &QuietHours,
    now: DateTime<Utc>,
) -> DeliveryPlan {
    if customer.archived {
        return DeliveryPlan::Skip(SkipReason::Archived);
    }
    let opted_in = match channel {
        Channel::Email => customer.email_opt_in,
        Channel::Sms => customer.sms_opt_in,
    };
    if !opted_in {
        return DeliveryPlan::Skip(SkipReason::OptedOut);
    }
    let Some(address) = customer.reachable_address(channel) else {
        return DeliveryPlan::Skip(SkipReason::MissingAddress);
    };
    let gate = match customer.time_zone {
        Some(zone) => quiet_hours.in_zone(zone),
        None => *quiet_hours,
    };
    match gate.decide(now) {
        SendDecision::SendNow => DeliveryPlan::Send {
            address: address.to_owned(),
        },
        SendDecision::DeferUntil(until) => DeliveryPlan::Defer(until),
    }
}

/// List filter for the message log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Only messages for this customer.
    pub customer_id: Option<CustomerId>,
    /// Only messages in this state.
    pub status: Option<MessageStatus>,
    /// Page window.
    pub page: PageRequest,
}
