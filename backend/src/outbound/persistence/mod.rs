//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and the table
//!   definitions (`schema.rs`) never leave this module.
//! - **Typed errors**: pool, Diesel and row-decoding failures map onto each
//!   port's error enum; named unique constraints map onto the port's
//!   duplicate variants.
//!
//! # Example
//!
//! ```ignore
//! use crm_backend::outbound::persistence::{DbPool, DieselCustomerRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/crm")).await?;
//! let customers = DieselCustomerRepository::new(pool.clone());
//! ```

mod diesel_account_repository;
mod diesel_chat_repository;
mod diesel_customer_repository;
mod diesel_helpers;
mod diesel_invoice_repository;
mod diesel_job_repository;
mod diesel_loyalty_repository;
mod diesel_message_repository;
mod diesel_opportunity_repository;
mod diesel_promotion_repository;
mod diesel_review_repository;
mod diesel_ticket_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_chat_repository::DieselChatRepository;
pub use diesel_customer_repository::DieselCustomerRepository;
pub use diesel_invoice_repository::DieselInvoiceRepository;
pub use diesel_job_repository::DieselJobRepository;
pub use diesel_loyalty_repository::DieselLoyaltyRepository;
pub use diesel_message_repository::DieselMessageRepository;
pub use diesel_opportunity_repository::DieselOpportunityRepository;
pub use diesel_promotion_repository::DieselPromotionRepository;
pub use diesel_review_repository::DieselReviewRepository;
pub use diesel_ticket_repository::DieselTicketRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
