//! Port for chat conversations and messages.

use async_trait::async_trait;

use crate::domain::{ChatMessage, Conversation, ConversationFilter, ConversationId, PageRequest};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by chat repository adapters.
    pub enum ChatRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "chat repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "chat repository query failed: {message}",
    }
}

/// Persistence port for conversations and their messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Insert a conversation together with its opening message.
    async fn create_conversation(
        &self,
        conversation: &Conversation,
        first_message: &ChatMessage,
    ) -> Result<(), ChatRepositoryError>;

    /// Fetch a conversation by identifier.
    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ChatRepositoryError>;

    /// List conversations matching `filter`, most recent activity first.
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, ChatRepositoryError>;

    /// Append `message` and store the conversation's new activity time.
    async fn append_message(
        &self,
        conversation: &Conversation,
        message: &ChatMessage,
    ) -> Result<(), ChatRepositoryError>;

    /// Persist the conversation status.
    async fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), ChatRepositoryError>;

    /// Messages in a conversation, oldest first.
    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        page: &PageRequest,
    ) -> Result<Vec<ChatMessage>, ChatRepositoryError>;
}
