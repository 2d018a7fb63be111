//! Port for invoice persistence.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Invoice, InvoiceFilter, InvoiceId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by invoice repository adapters.
    pub enum InvoiceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "invoice repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "invoice repository query failed: {message}",
    }
}

/// Persistence port for invoices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Insert a new invoice.
    async fn create(&self, invoice: &Invoice) -> Result<(), InvoiceRepositoryError>;

    /// Fetch an invoice by identifier.
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, InvoiceRepositoryError>;

    /// List invoices matching `filter`, newest first.
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, InvoiceRepositoryError>;

    /// Persist the invoice's current state.
    async fn update(&self, invoice: &Invoice) -> Result<(), InvoiceRepositoryError>;

    /// Sent invoices whose due date is before `today`.
    async fn list_past_due(
        &self,
        today: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Invoice>, InvoiceRepositoryError>;
}
