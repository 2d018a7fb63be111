//! Outbound message log and manual sends.
//!
//! ```text
//! GET  /api/v1/messages?customerId=..&status=deferred
//! POST /api/v1/messages
//! ```
//!
//! A manual send goes through the same consent and quiet-hours planning as
//! automated messages, so the returned row may be `deferred` or `skipped`.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Channel, CustomerId, MessageDraft, MessageFilter, MessagePurpose, MessageStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::PageQuery;

/// Body for `POST /api/v1/messages`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Recipient customer.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// `email` or `sms`.
    #[schema(value_type = String, example = "sms")]
    pub channel: Channel,
    /// Defaults to `general`.
    #[schema(value_type = Option<String>, example = "general")]
    pub purpose: Option<MessagePurpose>,
    /// Subject line for email.
    pub subject: Option<String>,
    /// Message text.
    pub body: String,
}

impl From<SendMessageRequest> for MessageDraft {
    fn from(value: SendMessageRequest) -> Self {
        Self {
            customer_id: value.customer_id,
            channel: value.channel,
            purpose: value.purpose.unwrap_or(MessagePurpose::General),
            subject: value.subject,
            body: value.body,
        }
    }
}

/// Filters for listing messages.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    /// Restrict to one customer.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to one delivery status.
    #[param(value_type = Option<String>)]
    pub status: Option<MessageStatus>,
}

/// List recorded outbound messages.
#[utoipa::path(
    get,
    path = "/api/v1/messages",
    params(MessageQuery, PageQuery),
    responses(
        (status = 200, description = "Logged messages, newest first", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["messages"],
    operation_id = "listMessages"
)]
#[get("/messages")]
pub async fn list_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<MessageQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let query = query.into_inner();
    let filter = MessageFilter {
        customer_id: principal.scope_customer(query.customer_id)?,
        status: query.status,
        page: page.into_inner().to_page()?,
    };
    let messages = state.communications.list_messages(filter).await?;
    Ok(envelope::ok("messages", messages))
}

/// Queue a message, subject to consent and quiet hours.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message logged", body = EnvelopeSchema),
        (status = 400, description = "Invalid message", body = ErrorEnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema),
        (status = 404, description = "Customer not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["messages"],
    operation_id = "sendMessage"
)]
#[post("/messages")]
pub async fn send_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendMessageRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let message = state
        .communications
        .enqueue(payload.into_inner().into())
        .await?;
    Ok(envelope::created(
        format!("message {}", message.status),
        message,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockCommunications;
    use crate::domain::test_fixtures::logged;
    use crate::inbound::http::test_utils::{
        customer, read_json, session_cookie, staff, test_app, test_state,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(communications: MockCommunications) -> HttpState {
        HttpState {
            communications: Arc::new(communications),
            ..test_state()
        }
    }

    #[actix_web::test]
    async fn manual_send_defaults_to_general_purpose() {
        let customer_id = CustomerId::random();
        let mut communications = MockCommunications::new();
        communications
            .expect_enqueue()
            .withf(move |draft| {
                draft.customer_id == customer_id
                    && draft.channel == Channel::Sms
                    && draft.purpose == MessagePurpose::General
            })
            .times(1)
            .returning(|draft| Ok(logged(draft, MessageStatus::Deferred)));
        let app = actix_test::init_service(test_app(state_with(communications))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/messages")
                .cookie(cookie)
                .set_json(json!({
                    "customerId": customer_id,
                    "channel": "sms",
                    "body": "Running ten minutes late",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["message"], "message deferred");
        assert_eq!(body["data"]["status"], "deferred");
    }

    #[actix_web::test]
    async fn customers_cannot_send() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let own = CustomerId::random();
        let cookie = session_cookie(&app, &customer(own)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/messages")
                .cookie(cookie)
                .set_json(json!({"customerId": own, "channel": "email", "body": "hi"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn customer_log_is_scoped() {
        let own = CustomerId::random();
        let mut communications = MockCommunications::new();
        communications
            .expect_list_messages()
            .withf(move |filter| filter.customer_id == Some(own))
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let app = actix_test::init_service(test_app(state_with(communications))).await;
        let cookie = session_cookie(&app, &customer(own)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/messages")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
