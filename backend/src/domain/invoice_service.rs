//! Invoicing: pricing with loyalty and promotion discounts, sending,
//! payment and the overdue sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;

use crate::domain::customer_service::require_customer;
use crate::domain::invoice::DEFAULT_PAYMENT_TERMS_DAYS;
use crate::domain::job_service::require_job;
use crate::domain::ports::{
    Communications, CustomerRepository, InvoiceRepository, InvoiceRepositoryError, Invoicing,
    JobRepository, LoyaltyProgram, PromotionsCatalog,
};
use crate::domain::{
    Customer, Error, Invoice, InvoiceDraft, InvoiceError, InvoiceFilter, InvoiceId,
    InvoicePricing, InvoiceStatus, MessageDraft, MessagePurpose,
};

fn map_invoice_error(error: InvoiceRepositoryError) -> Error {
    match error {
        InvoiceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("invoice repository unavailable: {message}"))
        }
        InvoiceRepositoryError::Query { message } => {
            Error::internal(format!("invoice repository error: {message}"))
        }
    }
}

fn map_rule_error(error: InvoiceError) -> Error {
    match error {
        InvoiceError::NegativeSubtotal => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "subtotalCents", "code": "negative" })),
        InvoiceError::SubtotalTooLarge { .. } => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "subtotalCents", "code": "too_large" })),
        InvoiceError::InvalidTransition { .. } => Error::conflict(error.to_string()),
    }
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

fn invoice_message(invoice: &Invoice, customer: &Customer) -> MessageDraft {
    MessageDraft {
        customer_id: customer.id,
        channel: customer.preferred_channel(),
        purpose: MessagePurpose::Invoice,
        subject: Some(format!("Invoice {}", invoice.id)),
        body: format!(
            "Hi {}, your invoice for ${} is ready and due on {}.",
            customer.name,
            format_cents(invoice.total_cents),
            invoice.due_date.format("%-d %B %Y"),
        ),
    }
}

/// Invoice service implementing the invoicing port.
#[derive(Clone)]
pub struct InvoiceService<I, J, C> {
    invoices: Arc<I>,
    jobs: Arc<J>,
    customers: Arc<C>,
    loyalty: Arc<dyn LoyaltyProgram>,
    promotions: Arc<dyn PromotionsCatalog>,
    messages: Arc<dyn Communications>,
    clock: Arc<dyn Clock>,
    payment_terms: Duration,
}

impl<I, J, C> InvoiceService<I, J, C> {
    /// Create the service over its repositories and collaborators.
    pub fn new(
        invoices: Arc<I>,
        jobs: Arc<J>,
        customers: Arc<C>,
        loyalty: Arc<dyn LoyaltyProgram>,
        promotions: Arc<dyn PromotionsCatalog>,
        messages: Arc<dyn Communications>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invoices,
            jobs,
            customers,
            loyalty,
            promotions,
            messages,
            clock,
            payment_terms: Duration::days(DEFAULT_PAYMENT_TERMS_DAYS),
        }
    }

    /// Override the default payment terms.
    pub fn with_payment_terms(mut self, terms: Duration) -> Self {
        self.payment_terms = terms;
        self
    }
}

impl<I, J, C> InvoiceService<I, J, C>
where
    I: InvoiceRepository,
    J: JobRepository,
    C: CustomerRepository,
{
    async fn require_invoice(&self, id: InvoiceId) -> Result<Invoice, Error> {
        self.invoices
            .find_by_id(&id)
            .await
            .map_err(map_invoice_error)?
            .ok_or_else(|| Error::not_found(format!("invoice {id} not found")))
    }

    async fn transition(&self, id: InvoiceId, next: InvoiceStatus) -> Result<Invoice, Error> {
        let mut invoice = self.require_invoice(id).await?;
        invoice
            .transition(next, self.clock.utc())
            .map_err(map_rule_error)?;
        self.invoices
            .update(&invoice)
            .await
            .map_err(map_invoice_error)?;
        tracing::info!(invoice_id = %invoice.id, status = %invoice.status, "invoice status changed");
        Ok(invoice)
    }

    async fn subtotal_for(&self, draft: &InvoiceDraft) -> Result<i64, Error> {
        let job = match draft.job_id {
            Some(job_id) => Some(require_job(self.jobs.as_ref(), job_id).await?),
            None => None,
        };
        if let Some(job) = &job {
            if job.customer_id != draft.customer_id {
                return Err(Error::invalid_request("job belongs to a different customer")
                    .with_details(json!({ "field": "jobId", "code": "customer_mismatch" })));
            }
        }
        draft
            .subtotal_cents
            .or(job.map(|job| job.price_cents))
            .ok_or_else(|| {
                Error::invalid_request("subtotalCents is required without a job")
                    .with_details(json!({ "field": "subtotalCents", "code": "required" }))
            })
    }
}

#[async_trait]
impl<I, J, C> Invoicing for InvoiceService<I, J, C>
where
    I: InvoiceRepository,
    J: JobRepository,
    C: CustomerRepository,
{
    async fn create_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, Error> {
        let customer = require_customer(self.customers.as_ref(), draft.customer_id).await?;
        if customer.archived {
            return Err(Error::conflict("cannot invoice an archived customer"));
        }
        let subtotal = self.subtotal_for(&draft).await?;
        let tier = self.loyalty.account(customer.id).await?.tier;
        let base = InvoicePricing::compute(subtotal, tier, |_| 0).map_err(map_rule_error)?;

        let (pricing, promotion_code) = match draft.promotion_code.as_deref() {
            Some(code) => {
                let quote = self
                    .promotions
                    .redeem(code, customer.id, base.total_cents)
                    .await?;
                let pricing = InvoicePricing::compute(subtotal, tier, |_| quote.discount_cents)
                    .map_err(map_rule_error)?;
                (pricing, Some(quote.code))
            }
            None => (base, None),
        };

        let now = self.clock.utc();
        let due_date = draft
            .due_date
            .unwrap_or_else(|| (now + self.payment_terms).date_naive());
        let invoice = Invoice::draft(
            InvoiceId::random(),
            customer.id,
            draft.job_id,
            pricing,
            promotion_code,
            due_date,
            now,
        );
        self.invoices
            .create(&invoice)
            .await
            .map_err(map_invoice_error)?;
        tracing::info!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            total_cents = invoice.total_cents,
            "invoice created"
        );
        Ok(invoice)
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, Error> {
        self.require_invoice(id).await
    }

    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Vec<Invoice>, Error> {
        self.invoices.list(&filter).await.map_err(map_invoice_error)
    }

    async fn send_invoice(&self, id: InvoiceId) -> Result<Invoice, Error> {
        let invoice = self.transition(id, InvoiceStatus::Sent).await?;
        let customer = require_customer(self.customers.as_ref(), invoice.customer_id).await?;
        self.messages
            .enqueue(invoice_message(&invoice, &customer))
            .await?;
        Ok(invoice)
    }

    async fn mark_paid(&self, id: InvoiceId) -> Result<Invoice, Error> {
        let invoice = self.transition(id, InvoiceStatus::Paid).await?;
        self.loyalty
            .award_payment(
                invoice.customer_id,
                invoice.total_cents,
                *invoice.id.as_uuid(),
            )
            .await?;
        Ok(invoice)
    }

    async fn void_invoice(&self, id: InvoiceId) -> Result<Invoice, Error> {
        self.transition(id, InvoiceStatus::Void).await
    }

    async fn mark_overdue(&self, limit: u32) -> Result<u32, Error> {
        let now = self.clock.utc();
        let due = self
            .invoices
            .list_past_due(now.date_naive(), limit)
            .await
            .map_err(map_invoice_error)?;
        let mut processed = 0;
        for mut invoice in due {
            if invoice.transition(InvoiceStatus::Overdue, now).is_err() {
                continue;
            }
            self.invoices
                .update(&invoice)
                .await
                .map_err(map_invoice_error)?;
            processed += 1;
        }
        Ok(processed)
    }
}

#[cfg(test)]
#[path = "invoice_service_tests.rs"]
mod tests;
