//! Outbound messaging: logging, opt-out, quiet hours and delivery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::customer_service::require_customer;
use crate::domain::ports::{
    Communications, CustomerRepository, Delivery, MessageRepository, MessageRepositoryError,
    MessageSender,
};
use crate::domain::{
    Customer, DeliveryPlan, Error, MessageDraft, MessageFilter, OutboundMessage, QuietHours,
    plan_delivery,
};

fn map_message_error(error: MessageRepositoryError) -> Error {
    match error {
        MessageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("message repository unavailable: {message}"))
        }
        MessageRepositoryError::Query { message } => {
            Error::internal(format!("message repository error: {message}"))
        }
    }
}

/// Communications service implementing the messaging port.
#[derive(Clone)]
pub struct CommunicationService<M, C, S> {
    messages: Arc<M>,
    customers: Arc<C>,
    sender: Arc<S>,
    quiet_hours: QuietHours,
    clock: Arc<dyn Clock>,
}

impl<M, C, S> CommunicationService<M, C, S> {
    /// `quiet_hours` carries the default zone; customers with their own
    /// zone are gated in that zone instead.
    pub fn new(
        messages: Arc<M>,
        customers: Arc<C>,
        sender: Arc<S>,
        quiet_hours: QuietHours,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            customers,
            sender,
            quiet_hours,
            clock,
        }
    }
}

impl<M, C, S> CommunicationService<M, C, S>
where
    M: MessageRepository,
    C: CustomerRepository,
    S: MessageSender,
{
    /// Apply the delivery plan to `message`, calling the sender when allowed.
    async fn settle(&self, message: &mut OutboundMessage, customer: &Customer, now: DateTime<Utc>) {
        match plan_delivery(customer, message.channel, &self.quiet_hours, now) {
            DeliveryPlan::Skip(reason) => {
                tracing::info!(message_id = %message.id, reason = reason.as_str(), "message skipped");
                message.mark_skipped(reason);
            }
            DeliveryPlan::Defer(until) => {
                tracing::info!(message_id = %message.id, %until, "message deferred by quiet hours");
                message.mark_deferred(until);
            }
            DeliveryPlan::Send { address } => {
                let delivery = Delivery {
                    message_id: message.id,
                    channel: message.channel,
                    purpose: message.purpose,
                    address,
                    subject: message.subject.clone(),
                    body: message.body.clone(),
                };
                match self.sender.send(&delivery).await {
                    Ok(()) => message.mark_sent(now),
                    Err(error) => {
                        tracing::warn!(message_id = %message.id, %error, "message delivery failed");
                        message.mark_failed(error.to_string());
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<M, C, S> Communications for CommunicationService<M, C, S>
where
    M: MessageRepository,
    C: CustomerRepository,
    S: MessageSender,
{
    async fn enqueue(&self, draft: MessageDraft) -> Result<OutboundMessage, Error> {
        let draft = draft
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let customer = require_customer(self.customers.as_ref(), draft.customer_id).await?;
        let now = self.clock.utc();
        let mut message = OutboundMessage::from_draft(draft, now);

        // Logged before delivery so a crash leaves a deferred row for the
        // dispatch run to pick up.
        self.messages
            .create(&message)
            .await
            .map_err(map_message_error)?;
        self.settle(&mut message, &customer, now).await;
        self.messages
            .update(&message)
            .await
            .map_err(map_message_error)?;
        Ok(message)
    }

    async fn list_messages(&self, filter: MessageFilter) -> Result<Vec<OutboundMessage>, Error> {
        self.messages.list(&filter).await.map_err(map_message_error)
    }

    async fn dispatch_due(&self, limit: u32) -> Result<u32, Error> {
        let now = self.clock.utc();
        let due = self
            .messages
            .list_due(now, limit)
            .await
            .map_err(map_message_error)?;
        let mut processed = 0;
        for mut message in due {
            let customer = require_customer(self.customers.as_ref(), message.customer_id).await?;
            self.settle(&mut message, &customer, now).await;
            self.messages
                .update(&message)
                .await
                .map_err(map_message_error)?;
            processed += 1;
        }
        Ok(processed)
    }
}

#[cfg(test)]
#[path = "communication_service_tests.rs"]
mod tests;
