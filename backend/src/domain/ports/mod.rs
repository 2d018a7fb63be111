//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the message sender) expose typed errors so
//! adapters map their failures into predictable variants. Driving ports are
//! what inbound adapters call; they speak the domain [`Error`].
//!
//! [`Error`]: crate::domain::Error

mod macros;
pub(crate) use macros::define_port_error;

mod account_directory;
mod account_repository;
mod chat_inbox;
mod chat_repository;
mod communications;
mod customer_directory;
mod customer_repository;
mod dependency_probe;
mod invoice_repository;
mod invoicing;
mod job_repository;
mod job_scheduling;
mod login_service;
mod loyalty_program;
mod loyalty_repository;
mod message_repository;
mod message_sender;
mod opportunity_pipeline;
mod opportunity_repository;
mod promotion_repository;
mod promotions_catalog;
mod review_repository;
mod review_requests;
mod scheduled_jobs;
mod support_desk;
mod ticket_repository;

pub use account_directory::AccountDirectory;
#[cfg(test)]
pub use account_directory::MockAccountDirectory;
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError};
#[cfg(test)]
pub use chat_inbox::MockChatInbox;
pub use chat_inbox::{ChatInbox, ConversationThread};
#[cfg(test)]
pub use chat_repository::MockChatRepository;
pub use chat_repository::{ChatRepository, ChatRepositoryError};
pub use communications::Communications;
#[cfg(test)]
pub use communications::MockCommunications;
pub use customer_directory::CustomerDirectory;
#[cfg(test)]
pub use customer_directory::MockCustomerDirectory;
#[cfg(test)]
pub use customer_repository::MockCustomerRepository;
pub use customer_repository::{CustomerRepository, CustomerRepositoryError};
#[cfg(test)]
pub use dependency_probe::MockDependencyProbe;
pub use dependency_probe::{DependencyProbe, ProbeError};
#[cfg(test)]
pub use invoice_repository::MockInvoiceRepository;
pub use invoice_repository::{InvoiceRepository, InvoiceRepositoryError};
pub use invoicing::Invoicing;
#[cfg(test)]
pub use invoicing::MockInvoicing;
#[cfg(test)]
pub use job_repository::MockJobRepository;
pub use job_repository::{JobRepository, JobRepositoryError};
pub use job_scheduling::JobScheduling;
#[cfg(test)]
pub use job_scheduling::MockJobScheduling;
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use loyalty_program::MockLoyaltyProgram;
pub use loyalty_program::{LoyaltyProgram, PointsRedemption};
#[cfg(test)]
pub use loyalty_repository::MockLoyaltyRepository;
pub use loyalty_repository::{LoyaltyRepository, LoyaltyRepositoryError};
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{MessageRepository, MessageRepositoryError};
#[cfg(test)]
pub use message_sender::MockMessageSender;
pub use message_sender::{Delivery, MessageSender, MessageSenderError};
#[cfg(test)]
pub use opportunity_pipeline::MockOpportunityPipeline;
pub use opportunity_pipeline::OpportunityPipeline;
#[cfg(test)]
pub use opportunity_repository::MockOpportunityRepository;
pub use opportunity_repository::{OpportunityRepository, OpportunityRepositoryError};
#[cfg(test)]
pub use promotion_repository::MockPromotionRepository;
pub use promotion_repository::{PromotionRepository, PromotionRepositoryError};
#[cfg(test)]
pub use promotions_catalog::MockPromotionsCatalog;
pub use promotions_catalog::PromotionsCatalog;
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewRepository, ReviewRepositoryError};
#[cfg(test)]
pub use review_requests::MockReviewRequests;
pub use review_requests::ReviewRequests;
#[cfg(test)]
pub use scheduled_jobs::MockScheduledJobs;
pub use scheduled_jobs::ScheduledJobs;
#[cfg(test)]
pub use support_desk::MockSupportDesk;
pub use support_desk::SupportDesk;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{TicketRepository, TicketRepositoryError};
