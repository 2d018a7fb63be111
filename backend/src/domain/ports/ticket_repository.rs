//! Port for support ticket persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Ticket, TicketFilter, TicketId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ticket repository query failed: {message}",
    }
}

/// Persistence port for support tickets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a new ticket.
    async fn create(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Fetch a ticket by identifier.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// List tickets matching `filter`, most recently updated first.
    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Persist the ticket's current state.
    async fn update(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Open, unanswered tickets whose response deadline is before `now`.
    async fn list_overdue(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, TicketRepositoryError>;
}
