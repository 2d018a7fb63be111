//! PostgreSQL-backed `ChatRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{ChatRepository, ChatRepositoryError};
use crate::domain::{ChatMessage, Conversation, ConversationFilter, ConversationId, PageRequest};

use super::diesel_helpers::{page_window, repository_error_mapping};
use super::models::{ChatMessageRow, ConversationRow, decode_rows};
use super::pool::DbPool;
use super::schema::{chat_messages, conversations};

/// Diesel-backed implementation of the `ChatRepository` port.
#[derive(Clone)]
pub struct DieselChatRepository {
    pool: DbPool,
}

impl DieselChatRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(ChatRepositoryError);

#[async_trait]
impl ChatRepository for DieselChatRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
        first_message: &ChatMessage,
    ) -> Result<(), ChatRepositoryError> {
        let conversation_row = ConversationRow::from(conversation);
        let message_row = ChatMessageRow::from(first_message);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(conversations::table)
                    .values(&conversation_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(chat_messages::table)
                    .values(&message_row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<ConversationRow> = conversations::table
            .find(*id.as_uuid())
            .select(ConversationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Conversation::try_from)
            .transpose()
            .map_err(decode_error)
    }

    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = conversations::table
            .select(ConversationRow::as_select())
            .order((conversations::last_message_at.desc(), conversations::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(conversations::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(conversations::status.eq(status.as_str()));
        }

        let rows: Vec<ConversationRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn append_message(
        &self,
        conversation: &Conversation,
        message: &ChatMessage,
    ) -> Result<(), ChatRepositoryError> {
        let conversation_row = ConversationRow::from(conversation);
        let message_row = ChatMessageRow::from(message);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(chat_messages::table)
                    .values(&message_row)
                    .execute(conn)
                    .await?;
                diesel::update(conversations::table.find(conversation_row.id))
                    .set(&conversation_row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(conversations::table.find(*conversation.id.as_uuid()))
            .set(ConversationRow::from(conversation))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(ChatRepositoryError::query("conversation not found for update"));
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        page: &PageRequest,
    ) -> Result<Vec<ChatMessage>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(page);

        let rows: Vec<ChatMessageRow> = chat_messages::table
            .filter(chat_messages::conversation_id.eq(*conversation_id.as_uuid()))
            .select(ChatMessageRow::as_select())
            .order((chat_messages::created_at.asc(), chat_messages::id.asc()))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
