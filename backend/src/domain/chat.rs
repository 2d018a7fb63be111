//! Customer chat conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::{ChatMessageId, ConversationId, CustomerId, PageRequest};

/// Longest accepted message body.
pub const CHAT_BODY_MAX: usize = 4000;
/// Longest accepted subject.
pub const CHAT_SUBJECT_MAX: usize = 200;

text_enum! {
    /// Whether a conversation accepts new messages.
    pub enum ConversationStatus {
        /// Accepting messages.
        Open => "open",
        /// Read-only.
        Closed => "closed",
    }
}

text_enum! {
    /// Who wrote a chat message.
    pub enum ChatSender {
        /// Written by the customer.
        Customer => "customer",
        /// Written by staff.
        Staff => "staff",
    }
}

/// Chat validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Message body is empty or too long.
    #[error("message body must be 1-{max} characters")]
    InvalidBody {
        /// Longest accepted body.
        max: usize,
    },
    /// Subject exceeds the limit.
    #[error("subject must be at most {max} characters")]
    SubjectTooLong {
        /// Longest accepted subject.
        max: usize,
    },
    /// Posting to a closed conversation.
    #[error("conversation is closed")]
    Closed,
}

/// Chat thread between a customer and staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Customer the thread belongs to.
    pub customer_id: CustomerId,
    /// Optional topic.
    pub subject: Option<String>,
    /// Open or closed.
    pub status: ConversationStatus,
    /// Time of the newest message; drives list ordering.
    pub last_message_at: DateTime<Utc>,
    /// When the thread was started.
    pub created_at: DateTime<Utc>,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message identifier.
    pub id: ChatMessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author side.
    pub sender: ChatSender,
    /// Message text.
    pub body: String,
    /// When the message was posted.
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a conversation together with its first message.
    pub fn start(
        customer_id: CustomerId,
        subject: Option<String>,
        sender: ChatSender,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<(Self, ChatMessage), ChatError> {
        let subject = subject
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        if matches!(&subject, Some(s) if s.chars().count() > CHAT_SUBJECT_MAX) {
            return Err(ChatError::SubjectTooLong {
                max: CHAT_SUBJECT_MAX,
            });
        }
        let mut conversation = Self {
            id: ConversationId::random(),
            customer_id,
            subject,
            status: ConversationStatus::Open,
            last_message_at: now,
            created_at: now,
        };
        let message = conversation.post(sender, body, now)?;
        Ok((conversation, message))
    }

    /// Append a message, bumping `last_message_at`.
    pub fn post(
        &mut self,
        sender: ChatSender,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, ChatError> {
        if self.status == ConversationStatus::Closed {
            return Err(ChatError::Closed);
        }
        let body = body.trim();
        if body.is_empty() || body.chars().count() > CHAT_BODY_MAX {
            return Err(ChatError::InvalidBody { max: CHAT_BODY_MAX });
        }
        self.last_message_at = now;
        Ok(ChatMessage {
            id: ChatMessageId::random(),
            conversation_id: self.id,
            sender,
            body: body.to_owned(),
            created_at: now,
        })
    }

    /// Close the conversation. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.status = ConversationStatus::Closed;
    }
}

/// List filter for conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationFilter {
    /// Only conversations for this customer.
    pub customer_id: Option<CustomerId>,
    /// Only conversations in this state.
    pub status: Option<ConversationStatus>,
    /// Page window.
    pub page: PageRequest,
}
