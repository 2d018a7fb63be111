//! Message delivery adapters.
//!
//! Both implement the `MessageSender` port. The logging sender is the
//! default for local runs; the webhook sender hands deliveries to an
//! external relay that owns the email and SMS provider integrations.

mod logging_sender;
mod webhook_sender;

pub use logging_sender::LoggingMessageSender;
pub use webhook_sender::{WebhookIdentity, WebhookMessageSender};
