//! Driving port for outbound customer messages.

use async_trait::async_trait;

use crate::domain::{Error, MessageDraft, MessageFilter, OutboundMessage};

/// Driving port for outbound customer messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Communications: Send + Sync {
    /// Log a message and deliver, defer or skip it.
    async fn enqueue(&self, draft: MessageDraft) -> Result<OutboundMessage, Error>;

    /// List recorded messages matching `filter`, newest first.
    async fn list_messages(&self, filter: MessageFilter) -> Result<Vec<OutboundMessage>, Error>;

    /// Re-gate and deliver deferred messages whose time has come.
    async fn dispatch_due(&self, limit: u32) -> Result<u32, Error>;
}
