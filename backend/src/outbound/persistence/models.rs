//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Enum-like columns are stored as their
//! snake_case text form and decoded back through `FromStr`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Account, ChatMessage, Conversation, Customer, Discount, Invoice, Job, LedgerEntry,
    LoyaltyAccount, Opportunity, OutboundMessage, Promotion, PromotionCode, PromotionRedemption,
    ReviewRequest, StoredCredentials, Ticket,
};

use super::schema::{
    accounts, chat_messages, conversations, customers, invoices, jobs, loyalty_accounts,
    loyalty_ledger, messages, opportunities, promotion_redemptions, promotions, review_requests,
    tickets,
};

/// A stored value that no longer decodes into its domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stored value {value:?} in {column}")]
pub(crate) struct RowDecodeError {
    column: &'static str,
    value: String,
}

impl RowDecodeError {
    pub(crate) fn new(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

fn decode<T: FromStr>(column: &'static str, raw: &str) -> Result<T, RowDecodeError> {
    raw.parse().map_err(|_| RowDecodeError::new(column, raw))
}

fn decode_opt<T: FromStr>(
    column: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, RowDecodeError> {
    raw.map(|value| decode(column, value)).transpose()
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub customer_id: Option<Uuid>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AccountRow {
    pub(crate) fn new(account: &Account, password_hash: &str) -> Self {
        Self {
            id: *account.id.as_uuid(),
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            role: account.role.as_str().to_owned(),
            customer_id: account.customer_id.map(|id| *id.as_uuid()),
            password_hash: password_hash.to_owned(),
            created_at: account.created_at,
        }
    }
}

impl TryFrom<AccountRow> for StoredCredentials {
    type Error = RowDecodeError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            account: Account {
                id: row.id.into(),
                username: row.username,
                display_name: row.display_name,
                role: decode("accounts.role", &row.role)?,
                customer_id: row.customer_id.map(Into::into),
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub time_zone: Option<String>,
    pub email_opt_in: bool,
    pub sms_opt_in: bool,
    pub notes: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerRow {
    fn from(customer: &Customer) -> Self {
        Self {
            id: *customer.id.as_uuid(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            time_zone: customer.time_zone.map(|zone| zone.name().to_owned()),
            email_opt_in: customer.email_opt_in,
            sms_opt_in: customer.sms_opt_in,
            notes: customer.notes.clone(),
            archived: customer.archived,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RowDecodeError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            time_zone: decode_opt::<Tz>("customers.time_zone", row.time_zone.as_deref())?,
            email_opt_in: row.email_opt_in,
            sms_opt_in: row.sms_opt_in,
            notes: row.notes,
            archived: row.archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct JobRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_type: String,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub status: String,
    pub assigned_cleaner: Option<String>,
    pub notes: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: *job.id.as_uuid(),
            customer_id: *job.customer_id.as_uuid(),
            service_type: job.service_type.as_str().to_owned(),
            scheduled_start: job.scheduled_start,
            duration_minutes: job.duration_minutes,
            price_cents: job.price_cents,
            status: job.status.as_str().to_owned(),
            assigned_cleaner: job.assigned_cleaner.clone(),
            notes: job.notes.clone(),
            reminder_sent_at: job.reminder_sent_at,
            completed_at: job.completed_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

impl TryFrom<JobRow> for Job {
    type Error = RowDecodeError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            service_type: decode("jobs.service_type", &row.service_type)?,
            scheduled_start: row.scheduled_start,
            duration_minutes: row.duration_minutes,
            price_cents: row.price_cents,
            status: decode("jobs.status", &row.status)?,
            assigned_cleaner: row.assigned_cleaner,
            notes: row.notes,
            reminder_sent_at: row.reminder_sent_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = invoices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct InvoiceRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub job_id: Option<Uuid>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: String,
    pub promotion_code: Option<String>,
    pub due_date: NaiveDate,
    pub issued_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceRow {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: *invoice.id.as_uuid(),
            customer_id: *invoice.customer_id.as_uuid(),
            job_id: invoice.job_id.map(|id| *id.as_uuid()),
            subtotal_cents: invoice.subtotal_cents,
            discount_cents: invoice.discount_cents,
            total_cents: invoice.total_cents,
            status: invoice.status.as_str().to_owned(),
            promotion_code: invoice.promotion_code.clone().map(String::from),
            due_date: invoice.due_date,
            issued_at: invoice.issued_at,
            paid_at: invoice.paid_at,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = RowDecodeError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let promotion_code = row
            .promotion_code
            .map(|code| {
                PromotionCode::new(&code)
                    .map_err(|_| RowDecodeError::new("invoices.promotion_code", code))
            })
            .transpose()?;
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            job_id: row.job_id.map(Into::into),
            subtotal_cents: row.subtotal_cents,
            discount_cents: row.discount_cents,
            total_cents: row.total_cents,
            status: decode("invoices.status", &row.status)?,
            promotion_code,
            due_date: row.due_date,
            issued_at: row.issued_at,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Loyalty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = loyalty_accounts)]
#[diesel(primary_key(customer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoyaltyAccountRow {
    pub customer_id: Uuid,
    pub points_balance: i64,
    pub lifetime_points: i64,
    pub tier: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&LoyaltyAccount> for LoyaltyAccountRow {
    fn from(account: &LoyaltyAccount) -> Self {
        Self {
            customer_id: *account.customer_id.as_uuid(),
            points_balance: account.points_balance,
            lifetime_points: account.lifetime_points,
            tier: account.tier.as_str().to_owned(),
            updated_at: account.updated_at,
        }
    }
}

impl TryFrom<LoyaltyAccountRow> for LoyaltyAccount {
    type Error = RowDecodeError;

    fn try_from(row: LoyaltyAccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            customer_id: row.customer_id.into(),
            points_balance: row.points_balance,
            lifetime_points: row.lifetime_points,
            tier: decode("loyalty_accounts.tier", &row.tier)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = loyalty_ledger)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LedgerEntryRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delta: i64,
    pub reason: String,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&LedgerEntry> for LedgerEntryRow {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            customer_id: *entry.customer_id.as_uuid(),
            delta: entry.delta,
            reason: entry.reason.as_str().to_owned(),
            reference_id: entry.reference_id,
            note: entry.note.clone(),
            created_at: entry.created_at,
        }
    }
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = RowDecodeError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            delta: row.delta,
            reason: decode("loyalty_ledger.reason", &row.reason)?,
            reference_id: row.reference_id,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OpportunityRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: String,
    pub status: String,
    pub score: i16,
    pub estimated_value_cents: i64,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub contacted_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Opportunity> for OpportunityRow {
    fn from(opportunity: &Opportunity) -> Self {
        Self {
            id: *opportunity.id.as_uuid(),
            customer_id: *opportunity.customer_id.as_uuid(),
            kind: opportunity.kind.as_str().to_owned(),
            status: opportunity.status.as_str().to_owned(),
            score: i16::from(opportunity.score),
            estimated_value_cents: opportunity.estimated_value_cents,
            notes: opportunity.notes.clone(),
            expires_at: opportunity.expires_at,
            contacted_at: opportunity.contacted_at,
            closed_at: opportunity.closed_at,
            created_at: opportunity.created_at,
            updated_at: opportunity.updated_at,
        }
    }
}

impl TryFrom<OpportunityRow> for Opportunity {
    type Error = RowDecodeError;

    fn try_from(row: OpportunityRow) -> Result<Self, Self::Error> {
        let score = u8::try_from(row.score)
            .map_err(|_| RowDecodeError::new("opportunities.score", row.score.to_string()))?;
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            kind: decode("opportunities.kind", &row.kind)?,
            status: decode("opportunities.status", &row.status)?,
            score,
            estimated_value_cents: row.estimated_value_cents,
            notes: row.notes,
            expires_at: row.expires_at,
            contacted_at: row.contacted_at,
            closed_at: row.closed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Review requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = review_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ReviewRequestRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub next_action_at: Option<DateTime<Utc>>,
    pub reminders_sent: i32,
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ReviewRequest> for ReviewRequestRow {
    fn from(review: &ReviewRequest) -> Self {
        Self {
            id: *review.id.as_uuid(),
            customer_id: *review.customer_id.as_uuid(),
            job_id: *review.job_id.as_uuid(),
            status: review.status.as_str().to_owned(),
            next_action_at: review.next_action_at,
            reminders_sent: review.reminders_sent,
            rating: review.rating,
            comment: review.comment.clone(),
            sent_at: review.sent_at,
            completed_at: review.completed_at,
            created_at: review.created_at,
        }
    }
}

impl TryFrom<ReviewRequestRow> for ReviewRequest {
    type Error = RowDecodeError;

    fn try_from(row: ReviewRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            job_id: row.job_id.into(),
            status: decode("review_requests.status", &row.status)?,
            next_action_at: row.next_action_at,
            reminders_sent: row.reminders_sent,
            rating: row.rating,
            comment: row.comment,
            sent_at: row.sent_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub channel: String,
    pub purpose: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&OutboundMessage> for MessageRow {
    fn from(message: &OutboundMessage) -> Self {
        Self {
            id: *message.id.as_uuid(),
            customer_id: *message.customer_id.as_uuid(),
            channel: message.channel.as_str().to_owned(),
            purpose: message.purpose.as_str().to_owned(),
            subject: message.subject.clone(),
            body: message.body.clone(),
            status: message.status.as_str().to_owned(),
            scheduled_for: message.scheduled_for,
            sent_at: message.sent_at,
            error: message.error.clone(),
            created_at: message.created_at,
        }
    }
}

impl TryFrom<MessageRow> for OutboundMessage {
    type Error = RowDecodeError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            channel: decode("messages.channel", &row.channel)?,
            purpose: decode("messages.purpose", &row.purpose)?,
            subject: row.subject,
            body: row.body,
            status: decode("messages.status", &row.status)?,
            scheduled_for: row.scheduled_for,
            sent_at: row.sent_at,
            error: row.error,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Promotions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = promotions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PromotionRow {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub discount_kind: String,
    pub discount_value: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_redemptions: Option<i32>,
    pub redemption_count: i32,
    pub min_tier: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Promotion> for PromotionRow {
    fn from(promotion: &Promotion) -> Self {
        let (discount_kind, discount_value) = promotion.discount.parts();
        Self {
            id: *promotion.id.as_uuid(),
            code: promotion.code.as_ref().to_owned(),
            description: promotion.description.clone(),
            discount_kind: discount_kind.to_owned(),
            discount_value,
            starts_at: promotion.starts_at,
            ends_at: promotion.ends_at,
            max_redemptions: promotion.max_redemptions,
            redemption_count: promotion.redemption_count,
            min_tier: promotion.min_tier.map(|tier| tier.as_str().to_owned()),
            active: promotion.active,
            created_at: promotion.created_at,
        }
    }
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = RowDecodeError;

    fn try_from(row: PromotionRow) -> Result<Self, Self::Error> {
        let code = PromotionCode::new(&row.code)
            .map_err(|_| RowDecodeError::new("promotions.code", row.code.as_str()))?;
        let discount = Discount::from_parts(&row.discount_kind, row.discount_value)
            .ok_or_else(|| RowDecodeError::new("promotions.discount_kind", row.discount_kind.as_str()))?;
        Ok(Self {
            id: row.id.into(),
            code,
            description: row.description,
            discount,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            max_redemptions: row.max_redemptions,
            redemption_count: row.redemption_count,
            min_tier: decode_opt("promotions.min_tier", row.min_tier.as_deref())?,
            active: row.active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = promotion_redemptions)]
pub(crate) struct NewRedemptionRow {
    pub promotion_id: Uuid,
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub discount_cents: i64,
    pub redeemed_at: DateTime<Utc>,
}

impl From<&PromotionRedemption> for NewRedemptionRow {
    fn from(redemption: &PromotionRedemption) -> Self {
        Self {
            promotion_id: *redemption.promotion_id.as_uuid(),
            customer_id: *redemption.customer_id.as_uuid(),
            amount_cents: redemption.amount_cents,
            discount_cents: redemption.discount_cents,
            redeemed_at: redemption.redeemed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub subject: String,
    pub body: String,
    pub priority: String,
    pub status: String,
    pub escalation_level: i32,
    pub response_due_at: DateTime<Utc>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub last_response: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: *ticket.id.as_uuid(),
            customer_id: *ticket.customer_id.as_uuid(),
            subject: ticket.subject.clone(),
            body: ticket.body.clone(),
            priority: ticket.priority.as_str().to_owned(),
            status: ticket.status.as_str().to_owned(),
            escalation_level: ticket.escalation_level,
            response_due_at: ticket.response_due_at,
            first_response_at: ticket.first_response_at,
            last_response: ticket.last_response.clone(),
            resolved_at: ticket.resolved_at,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = RowDecodeError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            subject: row.subject,
            body: row.body,
            priority: decode("tickets.priority", &row.priority)?,
            status: decode("tickets.status", &row.status)?,
            escalation_level: row.escalation_level,
            response_due_at: row.response_due_at,
            first_response_at: row.first_response_at,
            last_response: row.last_response,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ConversationRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub subject: Option<String>,
    pub status: String,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationRow {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: *conversation.id.as_uuid(),
            customer_id: *conversation.customer_id.as_uuid(),
            subject: conversation.subject.clone(),
            status: conversation.status.as_str().to_owned(),
            last_message_at: conversation.last_message_at,
            created_at: conversation.created_at,
        }
    }
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = RowDecodeError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            subject: row.subject,
            status: decode("conversations.status", &row.status)?,
            last_message_at: row.last_message_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChatMessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ChatMessage> for ChatMessageRow {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: *message.id.as_uuid(),
            conversation_id: *message.conversation_id.as_uuid(),
            sender: message.sender.as_str().to_owned(),
            body: message.body.clone(),
            created_at: message.created_at,
        }
    }
}

impl TryFrom<ChatMessageRow> for ChatMessage {
    type Error = RowDecodeError;

    fn try_from(row: ChatMessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            conversation_id: row.conversation_id.into(),
            sender: decode("chat_messages.sender", &row.sender)?,
            body: row.body,
            created_at: row.created_at,
        })
    }
}

/// Decode a batch of rows, failing on the first bad one.
pub(crate) fn decode_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, RowDecodeError>
where
    T: TryFrom<R, Error = RowDecodeError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
