//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **messaging**: message senders (trace log and HTTP webhook relay)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod messaging;
pub mod persistence;
