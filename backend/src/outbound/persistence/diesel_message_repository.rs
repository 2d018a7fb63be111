//! PostgreSQL-backed `MessageRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MessageRepository, MessageRepositoryError};
use crate::domain::{MessageFilter, MessageStatus, OutboundMessage};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::models::{MessageRow, decode_rows};
use super::pool::DbPool;
use super::schema::messages;

/// Diesel-backed implementation of the `MessageRepository` port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(MessageRepositoryError);

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn create(&self, message: &OutboundMessage) -> Result<(), MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(messages::table)
            .values(MessageRow::from(message))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn update(&self, message: &OutboundMessage) -> Result<(), MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(messages::table.find(*message.id.as_uuid()))
            .set(MessageRow::from(message))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(MessageRepositoryError::query("message not found for update"));
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &MessageFilter,
    ) -> Result<Vec<OutboundMessage>, MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = messages::table
            .select(MessageRow::as_select())
            .order((messages::created_at.desc(), messages::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(messages::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(messages::status.eq(status.as_str()));
        }

        let rows: Vec<MessageRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<OutboundMessage>, MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<MessageRow> = messages::table
            .filter(messages::status.eq(MessageStatus::Deferred.as_str()))
            .filter(messages::scheduled_for.le(now))
            .select(MessageRow::as_select())
            .order(messages::scheduled_for.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
