//! PostgreSQL-backed `InvoiceRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{InvoiceRepository, InvoiceRepositoryError};
use crate::domain::{Invoice, InvoiceFilter, InvoiceId, InvoiceStatus};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::models::{InvoiceRow, decode_rows};
use super::pool::DbPool;
use super::schema::invoices;

/// Diesel-backed implementation of the `InvoiceRepository` port.
#[derive(Clone)]
pub struct DieselInvoiceRepository {
    pool: DbPool,
}

impl DieselInvoiceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(InvoiceRepositoryError);

#[async_trait]
impl InvoiceRepository for DieselInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<(), InvoiceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(invoices::table)
            .values(InvoiceRow::from(invoice))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, InvoiceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<InvoiceRow> = invoices::table
            .find(*id.as_uuid())
            .select(InvoiceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Invoice::try_from).transpose().map_err(decode_error)
    }

    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, InvoiceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = invoices::table
            .select(InvoiceRow::as_select())
            .order((invoices::created_at.desc(), invoices::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoices::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::status.eq(status.as_str()));
        }

        let rows: Vec<InvoiceRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), InvoiceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(invoices::table.find(*invoice.id.as_uuid()))
            .set(InvoiceRow::from(invoice))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(InvoiceRepositoryError::query("invoice not found for update"));
        }
        Ok(())
    }

    async fn list_past_due(
        &self,
        today: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Invoice>, InvoiceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<InvoiceRow> = invoices::table
            .filter(invoices::status.eq(InvoiceStatus::Sent.as_str()))
            .filter(invoices::due_date.lt(today))
            .select(InvoiceRow::as_select())
            .order(invoices::due_date.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
