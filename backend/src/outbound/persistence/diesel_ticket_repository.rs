//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TicketRepository, TicketRepositoryError};
use crate::domain::{Ticket, TicketFilter, TicketId, TicketStatus};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::models::{TicketRow, decode_rows};
use super::pool::DbPool;
use super::schema::tickets;

/// Diesel-backed implementation of the `TicketRepository` port.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(TicketRepositoryError);

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn create(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(tickets::table)
            .values(TicketRow::from(ticket))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<TicketRow> = tickets::table
            .find(*id.as_uuid())
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Ticket::try_from).transpose().map_err(decode_error)
    }

    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = tickets::table
            .select(TicketRow::as_select())
            .order((tickets::response_due_at.asc(), tickets::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(tickets::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(tickets::status.eq(status.as_str()));
        }

        let rows: Vec<TicketRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(tickets::table.find(*ticket.id.as_uuid()))
            .set(TicketRow::from(ticket))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(TicketRepositoryError::query("ticket not found for update"));
        }
        Ok(())
    }

    async fn list_overdue(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<TicketRow> = tickets::table
            .filter(tickets::status.eq(TicketStatus::Open.as_str()))
            .filter(tickets::first_response_at.is_null())
            .filter(tickets::response_due_at.lt(now))
            .select(TicketRow::as_select())
            .order(tickets::response_due_at.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
