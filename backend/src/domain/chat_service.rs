//! Customer chat inbox.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::customer_service::require_customer;
use crate::domain::ports::{
    ChatInbox, ChatRepository, ChatRepositoryError, ConversationThread, CustomerRepository,
};
use crate::domain::{
    ChatError, ChatMessage, ChatSender, Conversation, ConversationFilter, ConversationId,
    CustomerId, Error, PageRequest,
};

fn map_chat_error(error: ChatRepositoryError) -> Error {
    match error {
        ChatRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("chat repository unavailable: {message}"))
        }
        ChatRepositoryError::Query { message } => {
            Error::internal(format!("chat repository error: {message}"))
        }
    }
}

fn map_rule_error(error: ChatError) -> Error {
    match error {
        ChatError::Closed => Error::conflict(error.to_string()),
        ChatError::InvalidBody { .. } | ChatError::SubjectTooLong { .. } => {
            Error::invalid_request(error.to_string())
        }
    }
}

/// Chat service implementing the inbox port.
#[derive(Clone)]
pub struct ChatService<R, C> {
    chats: Arc<R>,
    customers: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<R, C> ChatService<R, C> {
    /// Create the service over its repositories.
    pub fn new(chats: Arc<R>, customers: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            chats,
            customers,
            clock,
        }
    }
}

impl<R, C> ChatService<R, C>
where
    R: ChatRepository,
    C: CustomerRepository,
{
    async fn require_conversation(&self, id: ConversationId) -> Result<Conversation, Error> {
        self.chats
            .find_conversation(&id)
            .await
            .map_err(map_chat_error)?
            .ok_or_else(|| Error::not_found(format!("conversation {id} not found")))
    }
}

#[async_trait]
impl<R, C> ChatInbox for ChatService<R, C>
where
    R: ChatRepository,
    C: CustomerRepository,
{
    async fn start_conversation(
        &self,
        customer_id: CustomerId,
        subject: Option<String>,
        sender: ChatSender,
        body: String,
    ) -> Result<ConversationThread, Error> {
        require_customer(self.customers.as_ref(), customer_id).await?;
        let (conversation, message) =
            Conversation::start(customer_id, subject, sender, &body, self.clock.utc())
                .map_err(map_rule_error)?;
        self.chats
            .create_conversation(&conversation, &message)
            .await
            .map_err(map_chat_error)?;
        Ok(ConversationThread {
            conversation,
            messages: vec![message],
        })
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, Error> {
        self.require_conversation(id).await
    }

    async fn list_conversations(
        &self,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, Error> {
        self.chats
            .list_conversations(&filter)
            .await
            .map_err(map_chat_error)
    }

    async fn list_chat_messages(
        &self,
        id: ConversationId,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, Error> {
        self.require_conversation(id).await?;
        self.chats
            .list_messages(&id, &page)
            .await
            .map_err(map_chat_error)
    }

    async fn post_message(
        &self,
        id: ConversationId,
        sender: ChatSender,
        body: String,
    ) -> Result<ChatMessage, Error> {
        let mut conversation = self.require_conversation(id).await?;
        let message = conversation
            .post(sender, &body, self.clock.utc())
            .map_err(map_rule_error)?;
        self.chats
            .append_message(&conversation, &message)
            .await
            .map_err(map_chat_error)?;
        Ok(message)
    }

    async fn close_conversation(&self, id: ConversationId) -> Result<Conversation, Error> {
        let mut conversation = self.require_conversation(id).await?;
        conversation.close();
        self.chats
            .update_conversation(&conversation)
            .await
            .map_err(map_chat_error)?;
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockChatRepository, MockCustomerRepository};
    use crate::domain::test_fixtures::{fixture_clock, fixture_now, sample_customer};
    use crate::domain::{ConversationStatus, ErrorCode};
    use chrono::Duration;
    use rstest::rstest;

    fn service(
        chats: MockChatRepository,
        customers: MockCustomerRepository,
    ) -> ChatService<MockChatRepository, MockCustomerRepository> {
        ChatService::new(Arc::new(chats), Arc::new(customers), fixture_clock())
    }

    fn existing() -> Conversation {
        let (conversation, _) = Conversation::start(
            CustomerId::random(),
            Some("Keys".into()),
            ChatSender::Customer,
            "Where should I leave the keys?",
            fixture_now() - Duration::hours(2),
        )
        .expect("valid conversation");
        conversation
    }

    #[rstest]
    #[tokio::test]
    async fn starting_stores_the_first_message() {
        let customer = sample_customer();
        let customer_id = customer.id;
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(customer)));
        let mut chats = MockChatRepository::new();
        chats
            .expect_create_conversation()
            .withf(|conversation, message| {
                message.conversation_id == conversation.id && message.body == "Hello there"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let thread = service(chats, customers)
            .start_conversation(customer_id, None, ChatSender::Customer, "  Hello there ".into())
            .await
            .expect("started");
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.conversation.status, ConversationStatus::Open);
    }

    #[rstest]
    #[tokio::test]
    async fn posting_bumps_last_message_time() {
        let conversation = existing();
        let id = conversation.id;
        let mut chats = MockChatRepository::new();
        chats
            .expect_find_conversation()
            .return_once(move |_| Ok(Some(conversation)));
        chats
            .expect_append_message()
            .withf(|conversation, _| conversation.last_message_at == fixture_now())
            .times(1)
            .returning(|_, _| Ok(()));

        let message = service(chats, MockCustomerRepository::new())
            .post_message(id, ChatSender::Staff, "Under the mat is fine.".into())
            .await
            .expect("posted");
        assert_eq!(message.sender, ChatSender::Staff);
    }

    #[rstest]
    #[tokio::test]
    async fn closed_conversations_reject_messages() {
        let mut conversation = existing();
        conversation.close();
        let id = conversation.id;
        let mut chats = MockChatRepository::new();
        chats
            .expect_find_conversation()
            .return_once(move |_| Ok(Some(conversation)));
        chats.expect_append_message().times(0);

        let err = service(chats, MockCustomerRepository::new())
            .post_message(id, ChatSender::Customer, "hello?".into())
            .await
            .expect_err("closed");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let mut chats = MockChatRepository::new();
        chats.expect_find_conversation().return_once(|_| Ok(None));

        let err = service(chats, MockCustomerRepository::new())
            .close_conversation(ConversationId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
