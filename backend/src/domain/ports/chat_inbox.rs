//! Driving port for chat conversations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ChatMessage, ChatSender, Conversation, ConversationFilter, ConversationId, CustomerId, Error,
    PageRequest,
};

/// Conversation together with a page of its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationThread {
    /// Conversation metadata.
    pub conversation: Conversation,
    /// Messages on the requested page, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// Driving port for chat conversations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatInbox: Send + Sync {
    /// Open a conversation for a customer with its first message.
    async fn start_conversation(
        &self,
        customer_id: CustomerId,
        subject: Option<String>,
        sender: ChatSender,
        body: String,
    ) -> Result<ConversationThread, Error>;

    /// Fetch a conversation by identifier.
    async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, Error>;

    /// List conversations, most recent activity first.
    async fn list_conversations(
        &self,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, Error>;

    /// Page through the messages of a conversation.
    async fn list_chat_messages(
        &self,
        id: ConversationId,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, Error>;

    /// Append a message to an open conversation.
    async fn post_message(
        &self,
        id: ConversationId,
        sender: ChatSender,
        body: String,
    ) -> Result<ChatMessage, Error>;

    /// Close a conversation so it accepts no further messages.
    async fn close_conversation(&self, id: ConversationId) -> Result<Conversation, Error>;
}
