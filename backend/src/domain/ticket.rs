//! Support tickets with response SLAs and escalation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::{CustomerId, PageRequest, TicketId};

/// Longest accepted subject.
pub const TICKET_SUBJECT_MAX: usize = 200;
/// Longest accepted body or staff response.
pub const TICKET_BODY_MAX: usize = 10_000;

text_enum! {
    /// Ticket priority, lowest first.
    #[derive(PartialOrd, Ord)]
    pub enum TicketPriority {
        /// First response within 72 hours.
        Low => "low",
        /// First response within 24 hours; the default.
        Normal => "normal",
        /// First response within 4 hours.
        High => "high",
        /// First response within 1 hour.
        Urgent => "urgent",
    }
}

impl TicketPriority {
    /// Time allowed before a first response is due.
    pub fn response_sla(self) -> Duration {
        match self {
            Self::Urgent => Duration::hours(1),
            Self::High => Duration::hours(4),
            Self::Normal => Duration::hours(24),
            Self::Low => Duration::hours(72),
        }
    }

    /// One step up, saturating at urgent.
    pub fn raised(self) -> Self {
        match self {
            Self::Low => Self::Normal,
            Self::Normal => Self::High,
            Self::High | Self::Urgent => Self::Urgent,
        }
    }
}

text_enum! {
    /// Ticket workflow state.
    pub enum TicketStatus {
        /// Waiting for staff.
        Open => "open",
        /// Staff responded; waiting for the customer.
        Pending => "pending",
        /// Fixed; may be reopened.
        Resolved => "resolved",
        /// Final.
        Closed => "closed",
    }
}

impl TicketStatus {
    /// Whether a ticket may move from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Pending | Self::Resolved | Self::Closed)
                | (Self::Pending, Self::Open | Self::Resolved | Self::Closed)
                | (Self::Resolved, Self::Open | Self::Closed)
        )
    }
}

/// Ticket validation and workflow errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    /// Subject is empty or too long.
    #[error("subject must be 1-{max} characters")]
    InvalidSubject {
        /// Longest accepted subject.
        max: usize,
    },
    /// Body or response is empty or too long.
    #[error("body must be 1-{max} characters")]
    InvalidBody {
        /// Longest accepted body.
        max: usize,
    },
    /// The workflow does not allow the move.
    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: TicketStatus,
        /// Requested status.
        to: TicketStatus,
    },
    /// Closed tickets accept no responses.
    #[error("ticket is closed")]
    Closed,
}

/// Customer support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket identifier.
    pub id: TicketId,
    /// Customer who raised the ticket.
    pub customer_id: CustomerId,
    /// Short summary.
    pub subject: String,
    /// Customer's description.
    pub body: String,
    /// Current priority; raised on escalation.
    pub priority: TicketPriority,
    /// Workflow state.
    pub status: TicketStatus,
    /// Times the ticket has been escalated.
    pub escalation_level: i32,
    /// First response deadline; restarts at the raised priority on escalation.
    pub response_due_at: DateTime<Utc>,
    /// First staff response, if any.
    pub first_response_at: Option<DateTime<Utc>>,
    /// Most recent staff response.
    pub last_response: Option<String>,
    /// When the ticket was resolved or closed.
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the ticket was opened.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Ticket as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    /// Customer the ticket is for.
    pub customer_id: CustomerId,
    /// Short summary.
    pub subject: String,
    /// Description of the problem.
    pub body: String,
    /// Defaults to normal.
    pub priority: Option<TicketPriority>,
}

fn bounded(value: &str, max: usize) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty() && trimmed.chars().count() <= max).then(|| trimmed.to_owned())
}

impl Ticket {
    /// Validate a draft into an open ticket with its response deadline.
    pub fn open(draft: TicketDraft, now: DateTime<Utc>) -> Result<Self, TicketError> {
        let subject = bounded(&draft.subject, TICKET_SUBJECT_MAX).ok_or(
            TicketError::InvalidSubject {
                max: TICKET_SUBJECT_MAX,
            },
        )?;
        let body = bounded(&draft.body, TICKET_BODY_MAX).ok_or(TicketError::InvalidBody {
            max: TICKET_BODY_MAX,
        })?;
        let priority = draft.priority.unwrap_or(TicketPriority::Normal);
        Ok(Self {
            id: TicketId::random(),
            customer_id: draft.customer_id,
            subject,
            body,
            priority,
            status: TicketStatus::Open,
            escalation_level: 0,
            response_due_at: now + priority.response_sla(),
            first_response_at: None,
            last_response: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Record a staff response. The first one stops the SLA clock.
    pub fn respond(&mut self, body: &str, now: DateTime<Utc>) -> Result<(), TicketError> {
        if self.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }
        let body = bounded(body, TICKET_BODY_MAX).ok_or(TicketError::InvalidBody {
            max: TICKET_BODY_MAX,
        })?;
        self.first_response_at.get_or_insert(now);
        self.last_response = Some(body);
        self.status = TicketStatus::Pending;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `next`, stamping or clearing the resolution time.
    pub fn transition(&mut self, next: TicketStatus, now: DateTime<Utc>) -> Result<(), TicketError> {
        if !self.status.can_transition_to(next) {
            return Err(TicketError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.resolved_at = match next {
            TicketStatus::Resolved | TicketStatus::Closed => self.resolved_at.or(Some(now)),
            TicketStatus::Open | TicketStatus::Pending => None,
        };
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Open, unanswered and past its response deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TicketStatus::Open
            && self.first_response_at.is_none()
            && now > self.response_due_at
    }

    /// Escalate an overdue ticket. Returns `false` when nothing changed.
    pub fn escalate(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_overdue(now) {
            return false;
        }
        self.escalation_level += 1;
        self.priority = self.priority.raised();
        self.response_due_at = now + self.priority.response_sla();
        self.updated_at = now;
        true
    }
}

/// List filter for tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Only tickets for this customer.
    pub customer_id: Option<CustomerId>,
    /// Only tickets in this state.
    pub status: Option<TicketStatus>,
    /// Page window.
    pub page: PageRequest,
}
