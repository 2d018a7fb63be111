//! Port for the outbound message log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{MessageFilter, OutboundMessage};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by message log adapters.
    pub enum MessageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "message repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "message repository query failed: {message}",
    }
}

/// Persistence port for outbound messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a new message record.
    async fn create(&self, message: &OutboundMessage) -> Result<(), MessageRepositoryError>;

    /// Persist status, schedule and error columns.
    async fn update(&self, message: &OutboundMessage) -> Result<(), MessageRepositoryError>;

    /// List logged messages matching `filter`, newest first.
    async fn list(&self, filter: &MessageFilter) -> Result<Vec<OutboundMessage>, MessageRepositoryError>;

    /// Deferred messages scheduled at or before `now`, oldest first.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<OutboundMessage>, MessageRepositoryError>;
}
