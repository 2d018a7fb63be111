//! Domain primitives, aggregates, ports and services.
//!
//! Entities validate their own invariants and expose pure policies (quiet
//! hours, loyalty tiers, lead scoring, status transitions). Services
//! implement the driving ports on top of the driven repository ports and
//! map adapter failures into the transport-agnostic [`Error`].

pub mod account;
pub mod chat;
pub mod communication;
pub mod cron;
pub mod customer;
pub mod error;
pub mod ids;
pub mod invoice;
pub mod job;
pub mod loyalty;
pub mod money;
pub mod opportunity;
pub mod pagination;
pub mod password;
pub mod ports;
pub mod promotion;
pub mod quiet_hours;
pub mod review;
#[cfg(test)]
pub(crate) mod test_fixtures;
mod text_enum;
pub mod ticket;
pub mod trace_id;

mod account_service;
mod chat_service;
mod communication_service;
mod cron_service;
mod customer_service;
mod invoice_service;
mod job_service;
mod loyalty_service;
mod opportunity_service;
mod promotion_service;
mod review_service;
mod ticket_service;

pub use self::account::{
    Account, AccountValidationError, LoginCredentials, LoginValidationError, NewAccount,
    Principal, Role, StoredCredentials,
};
pub use self::chat::{
    ChatError, ChatMessage, ChatSender, Conversation, ConversationFilter, ConversationStatus,
};
pub use self::communication::{
    Channel, DeliveryPlan, MessageDraft, MessageFilter, MessagePurpose, MessageStatus,
    MessageValidationError, OutboundMessage, SkipReason, plan_delivery,
};
pub use self::cron::{CronJob, CronRun, batch_limit};
pub use self::customer::{
    Customer, CustomerDraft, CustomerFilter, CustomerUpdate, CustomerValidationError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    ChatMessageId, ConversationId, CustomerId, InvoiceId, JobId, LedgerEntryId, MessageId,
    OpportunityId, PromotionId, ReviewRequestId, TicketId, UserId,
};
pub use self::invoice::{
    Invoice, InvoiceDraft, InvoiceError, InvoiceFilter, InvoicePricing, InvoiceStatus,
};
pub use self::job::{Job, JobDraft, JobError, JobFilter, JobStatus, ServiceType};
pub use self::money::{MAX_AMOUNT_CENTS, percent_of};
pub use self::loyalty::{
    LedgerEntry, LedgerReason, LoyaltyAccount, LoyaltyError, LoyaltyTier, points_for_payment,
};
pub use self::opportunity::{
    Opportunity, OpportunityDraft, OpportunityError, OpportunityFilter, OpportunityKind,
    OpportunityStatus, ScoreInputs, score_opportunity,
};
pub use self::pagination::{PageRequest, PageRequestError};
pub use self::promotion::{
    Discount, Promotion, PromotionCode, PromotionDraft, PromotionIneligibility, PromotionQuote,
    PromotionRedemption, PromotionValidationError,
};
pub use self::quiet_hours::{QuietHours, QuietHoursError, SendDecision};
pub use self::review::{
    ReviewError, ReviewFilter, ReviewPolicy, ReviewRequest, ReviewStatus, ReviewStep,
    ReviewSubmission,
};
pub use self::text_enum::UnknownVariant;
pub use self::ticket::{
    Ticket, TicketDraft, TicketError, TicketFilter, TicketPriority, TicketStatus,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

pub use self::account_service::AccountService;
pub use self::chat_service::ChatService;
pub use self::communication_service::CommunicationService;
pub use self::cron_service::CronService;
pub use self::customer_service::CustomerService;
pub use self::invoice_service::InvoiceService;
pub use self::job_service::JobService;
pub use self::loyalty_service::LoyaltyService;
pub use self::opportunity_service::OpportunityService;
pub use self::promotion_service::PromotionService;
pub use self::review_service::ReviewService;
pub use self::ticket_service::TicketService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use crm_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
