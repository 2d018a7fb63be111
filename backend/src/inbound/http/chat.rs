//! Chat conversations between customers and staff.
//!
//! ```text
//! POST /api/v1/conversations {"customerId":"..","subject":"Keys","body":"..."}
//! GET  /api/v1/conversations?customerId=..&status=open
//! GET  /api/v1/conversations/{id}
//! GET  /api/v1/conversations/{id}/messages
//! POST /api/v1/conversations/{id}/messages {"body":"..."}
//! POST /api/v1/conversations/{id}/close
//! ```
//!
//! The message sender is derived from the caller's role, never from the
//! request body.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ChatSender, Conversation, ConversationFilter, ConversationId, ConversationStatus, CustomerId,
    Error, Principal,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};

const CONVERSATION_ID: FieldName = FieldName::new("conversationId");

/// Body for `POST /api/v1/conversations`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    /// Customer the conversation is with.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// Optional topic line.
    pub subject: Option<String>,
    /// Opening message.
    pub body: String,
}

/// Body for posting a chat message.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PostMessageRequest {
    /// Message text.
    pub body: String,
}

/// Filters for listing conversations.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConversationQuery {
    /// Restrict to one customer; customers may only name themselves.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to `open` or `closed`.
    #[param(value_type = Option<String>)]
    pub status: Option<ConversationStatus>,
}

fn sender_for(principal: &Principal) -> ChatSender {
    if principal.role.is_staff() {
        ChatSender::Staff
    } else {
        ChatSender::Customer
    }
}

async fn accessible_conversation(
    state: &HttpState,
    principal: &Principal,
    raw_id: &str,
) -> Result<Conversation, Error> {
    let id: ConversationId = parse_id(raw_id, CONVERSATION_ID)?;
    let conversation = state.chat.get_conversation(id).await?;
    principal.require_customer_access(conversation.customer_id)?;
    Ok(conversation)
}

/// Open a conversation with its first message.
#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    request_body = StartConversationRequest,
    responses(
        (status = 201, description = "Conversation started", body = EnvelopeSchema),
        (status = 400, description = "Invalid message", body = ErrorEnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["chat"],
    operation_id = "startConversation"
)]
#[post("/conversations")]
pub async fn start_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<StartConversationRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let StartConversationRequest {
        customer_id,
        subject,
        body,
    } = payload.into_inner();
    principal.require_customer_access(customer_id)?;
    let thread = state
        .chat
        .start_conversation(customer_id, subject, sender_for(&principal), body)
        .await?;
    Ok(envelope::created("conversation started", thread))
}

/// List conversations, most recent activity first.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    params(ConversationQuery, PageQuery),
    responses(
        (status = 200, description = "Conversations, most recent activity first", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["chat"],
    operation_id = "listConversations"
)]
#[get("/conversations")]
pub async fn list_conversations(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ConversationQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let query = query.into_inner();
    let filter = ConversationFilter {
        customer_id: principal.scope_customer(query.customer_id)?,
        status: query.status,
        page: page.into_inner().to_page()?,
    };
    let conversations = state.chat.list_conversations(filter).await?;
    Ok(envelope::ok("conversations", conversations))
}

/// Fetch one conversation.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["chat"],
    operation_id = "getConversation"
)]
#[get("/conversations/{id}")]
pub async fn get_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let conversation = accessible_conversation(&state, &principal, &path).await?;
    Ok(envelope::ok("conversation", conversation))
}

/// Page through a conversation's messages.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/messages",
    params(("id" = String, Path, description = "Conversation id"), PageQuery),
    responses(
        (status = 200, description = "Messages, oldest first", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["chat"],
    operation_id = "listChatMessages"
)]
#[get("/conversations/{id}/messages")]
pub async fn list_chat_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let conversation = accessible_conversation(&state, &principal, &path).await?;
    let messages = state
        .chat
        .list_chat_messages(conversation.id, page.into_inner().to_page()?)
        .await?;
    Ok(envelope::ok("messages", messages))
}

/// Post a message to an open conversation.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/messages",
    params(("id" = String, Path, description = "Conversation id")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 409, description = "Conversation closed", body = ErrorEnvelopeSchema)
    ),
    tags = ["chat"],
    operation_id = "postChatMessage"
)]
#[post("/conversations/{id}/messages")]
pub async fn post_chat_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PostMessageRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let conversation = accessible_conversation(&state, &principal, &path).await?;
    let message = state
        .chat
        .post_message(
            conversation.id,
            sender_for(&principal),
            payload.into_inner().body,
        )
        .await?;
    Ok(envelope::created("message posted", message))
}

/// Close a conversation.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/close",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation closed", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["chat"],
    operation_id = "closeConversation"
)]
#[post("/conversations/{id}/close")]
pub async fn close_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let conversation = accessible_conversation(&state, &principal, &path).await?;
    let closed = state.chat.close_conversation(conversation.id).await?;
    Ok(envelope::ok("conversation closed", closed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ConversationThread, MockChatInbox};
    use crate::domain::test_fixtures::sample_conversation;
    use crate::inbound::http::test_utils::{
        customer, read_json, session_cookie, staff, test_app, test_state,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(chat: MockChatInbox) -> HttpState {
        HttpState {
            chat: Arc::new(chat),
            ..test_state()
        }
    }

    #[actix_web::test]
    async fn customer_starts_conversation_as_customer() {
        let own = CustomerId::random();
        let mut chat = MockChatInbox::new();
        chat.expect_start_conversation()
            .withf(move |id, subject, sender, body| {
                *id == own
                    && subject.as_deref() == Some("Keys")
                    && *sender == ChatSender::Customer
                    && body == "Where should I leave the keys?"
            })
            .times(1)
            .returning(|id, _, _, _| {
                let (conversation, message) = sample_conversation(id);
                Ok(ConversationThread {
                    conversation,
                    messages: vec![message],
                })
            });
        let app = actix_test::init_service(test_app(state_with(chat))).await;
        let cookie = session_cookie(&app, &customer(own)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/conversations")
                .cookie(cookie)
                .set_json(json!({
                    "customerId": own,
                    "subject": "Keys",
                    "body": "Where should I leave the keys?",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["data"]["conversation"]["status"], "open");
        assert_eq!(body["data"]["messages"][0]["sender"], "customer");
    }

    #[rstest]
    #[case::staff(true)]
    #[case::customer(false)]
    #[actix_web::test]
    async fn reply_sender_follows_role(#[case] as_staff: bool) {
        let own = CustomerId::random();
        let expected = if as_staff {
            ChatSender::Staff
        } else {
            ChatSender::Customer
        };
        let mut chat = MockChatInbox::new();
        chat.expect_get_conversation()
            .returning(move |_| Ok(sample_conversation(own).0));
        chat.expect_post_message()
            .withf(move |_, sender, _| *sender == expected)
            .times(1)
            .returning(move |_, sender, body| {
                let (conversation, mut message) = sample_conversation(own);
                message.conversation_id = conversation.id;
                message.sender = sender;
                message.body = body;
                Ok(message)
            });
        let app = actix_test::init_service(test_app(state_with(chat))).await;
        let principal = if as_staff { staff() } else { customer(own) };
        let cookie = session_cookie(&app, &principal).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/conversations/{}/messages", ConversationId::random()))
                .cookie(cookie)
                .set_json(json!({"body": "Under the mat"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn other_customers_conversation_is_forbidden() {
        let mut chat = MockChatInbox::new();
        chat.expect_get_conversation()
            .returning(|_| Ok(sample_conversation(CustomerId::random()).0));
        chat.expect_list_chat_messages().never();
        let app = actix_test::init_service(test_app(state_with(chat))).await;
        let cookie = session_cookie(&app, &customer(CustomerId::random())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/conversations/{}/messages", ConversationId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn posting_to_closed_conversation_is_conflict() {
        let own = CustomerId::random();
        let mut chat = MockChatInbox::new();
        chat.expect_get_conversation()
            .returning(move |_| Ok(sample_conversation(own).0));
        chat.expect_post_message()
            .returning(|_, _, _| Err(Error::conflict("conversation is closed")));
        let app = actix_test::init_service(test_app(state_with(chat))).await;
        let cookie = session_cookie(&app, &customer(own)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/conversations/{}/messages", ConversationId::random()))
                .cookie(cookie)
                .set_json(json!({"body": "hello?"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
