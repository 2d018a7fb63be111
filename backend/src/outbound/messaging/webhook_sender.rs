//! Reqwest-backed webhook sender.
//!
//! Posts each delivery as JSON to one relay endpoint. Timeouts, transport
//! failures and 5xx/429 responses are `Unavailable`; other non-success
//! statuses are `Rejected`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::ports::{Delivery, MessageSender, MessageSenderError};

const DEFAULT_USER_AGENT: &str = "crm-backend-messaging/0.1";
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Headers identifying this service to the relay.
pub struct WebhookIdentity {
    /// Value sent as `User-Agent`.
    pub user_agent: String,
    /// Optional bearer token sent in `Authorization`.
    pub token: Option<String>,
}

impl Default for WebhookIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            token: None,
        }
    }
}

/// `MessageSender` that posts deliveries to an HTTP relay.
pub struct WebhookMessageSender {
    client: Client,
    endpoint: Url,
    identity: WebhookIdentity,
}

impl WebhookMessageSender {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        identity: WebhookIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            identity,
        })
    }
}

#[async_trait]
impl MessageSender for WebhookMessageSender {
    async fn send(&self, delivery: &Delivery) -> Result<(), MessageSenderError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::USER_AGENT, self.identity.user_agent.as_str())
            .json(delivery);
        if let Some(token) = &self.identity.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(message_id = %delivery.message_id, "webhook accepted message");
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(map_status_error(status, body.as_ref()))
    }
}

fn map_transport_error(error: reqwest::Error) -> MessageSenderError {
    MessageSenderError::unavailable(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MessageSenderError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        MessageSenderError::unavailable(message)
    } else {
        MessageSenderError::rejected(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
