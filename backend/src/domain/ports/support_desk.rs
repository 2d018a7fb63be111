//! Driving port for support tickets.

use async_trait::async_trait;

use crate::domain::{Error, Ticket, TicketDraft, TicketFilter, TicketId, TicketStatus};

/// Driving port for support tickets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupportDesk: Send + Sync {
    /// Open a ticket with its SLA deadline.
    async fn open_ticket(&self, draft: TicketDraft) -> Result<Ticket, Error>;

    /// Fetch a ticket by identifier.
    async fn get_ticket(&self, id: TicketId) -> Result<Ticket, Error>;

    /// List tickets matching `filter`.
    async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>, Error>;

    /// Record a staff response and notify the customer.
    async fn respond(&self, id: TicketId, body: String) -> Result<Ticket, Error>;

    /// Move a ticket to `status`.
    async fn update_ticket_status(&self, id: TicketId, status: TicketStatus)
    -> Result<Ticket, Error>;

    /// Escalate open tickets past their SLA deadline.
    async fn escalate_overdue(&self, limit: u32) -> Result<u32, Error>;
}
