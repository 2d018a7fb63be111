//! Driven port for handing a message to a delivery provider.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Channel, MessageId, MessagePurpose};

use super::define_port_error;

define_port_error! {
    /// Failures reported by delivery adapters.
    pub enum MessageSenderError {
        /// Provider could not be reached.
        Unavailable { message: String } => "message provider unavailable: {message}",
        /// Provider refused the message.
        Rejected { message: String } => "message rejected by provider: {message}",
    }
}

/// Fully resolved message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Record the delivery belongs to.
    pub message_id: MessageId,
    /// Delivery channel.
    pub channel: Channel,
    /// Why the message is sent.
    pub purpose: MessagePurpose,
    /// Email address or phone number.
    pub address: String,
    /// Subject line for email.
    pub subject: Option<String>,
    /// Rendered message body.
    pub body: String,
}

/// Driven port for delivery providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Hand `delivery` to the provider.
    async fn send(&self, delivery: &Delivery) -> Result<(), MessageSenderError>;
}
