//! Sender that records deliveries in the trace log and reports success.

use async_trait::async_trait;

use crate::domain::ports::{Delivery, MessageSender, MessageSenderError};

/// `MessageSender` that only logs. Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMessageSender;

#[async_trait]
impl MessageSender for LoggingMessageSender {
    async fn send(&self, delivery: &Delivery) -> Result<(), MessageSenderError> {
        tracing::info!(
            message_id = %delivery.message_id,
            channel = %delivery.channel,
            purpose = %delivery.purpose,
            address = %delivery.address,
            body_len = delivery.body.len(),
            "message delivered to log sender"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, MessageId, MessagePurpose};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn always_accepts() {
        let delivery = Delivery {
            message_id: MessageId::random(),
            channel: Channel::Sms,
            purpose: MessagePurpose::General,
            address: "+15550100001".into(),
            subject: None,
            body: "hello".into(),
        };
        assert!(LoggingMessageSender.send(&delivery).await.is_ok());
    }
}
