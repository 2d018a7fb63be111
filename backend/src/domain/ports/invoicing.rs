//! Driving port for invoices.

use async_trait::async_trait;

use crate::domain::{Error, Invoice, InvoiceDraft, InvoiceFilter, InvoiceId};

/// Driving port for invoicing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Invoicing: Send + Sync {
    /// Price and store a draft invoice, redeeming any promotion code.
    async fn create_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, Error>;

    /// Fetch an invoice by identifier.
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, Error>;

    /// List invoices matching `filter`.
    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Vec<Invoice>, Error>;

    /// Issue a draft invoice and email it to the customer.
    async fn send_invoice(&self, id: InvoiceId) -> Result<Invoice, Error>;

    /// Record payment and award loyalty points for the amount paid.
    async fn mark_paid(&self, id: InvoiceId) -> Result<Invoice, Error>;

    /// Void an unpaid invoice.
    async fn void_invoice(&self, id: InvoiceId) -> Result<Invoice, Error>;

    /// Flag sent invoices whose due date has passed.
    async fn mark_overdue(&self, limit: u32) -> Result<u32, Error>;
}
