//! Support desk: tickets, staff responses and SLA escalation.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use crate::domain::customer_service::require_customer;
use crate::domain::ports::{
    Communications, CustomerRepository, SupportDesk, TicketRepository, TicketRepositoryError,
};
use crate::domain::{
    Error, MessageDraft, MessagePurpose, Ticket, TicketDraft, TicketError, TicketFilter,
    TicketId, TicketStatus,
};

fn map_ticket_error(error: TicketRepositoryError) -> Error {
    match error {
        TicketRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ticket repository unavailable: {message}"))
        }
        TicketRepositoryError::Query { message } => {
            Error::internal(format!("ticket repository error: {message}"))
        }
    }
}

fn map_rule_error(error: TicketError) -> Error {
    match error {
        TicketError::InvalidSubject { .. } => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "subject", "code": "invalid_length" })),
        TicketError::InvalidBody { .. } => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "body", "code": "invalid_length" })),
        TicketError::InvalidTransition { .. } | TicketError::Closed => {
            Error::conflict(error.to_string())
        }
    }
}

/// Ticket service implementing the support desk port.
#[derive(Clone)]
pub struct TicketService<T, C> {
    tickets: Arc<T>,
    customers: Arc<C>,
    messages: Arc<dyn Communications>,
    clock: Arc<dyn Clock>,
}

impl<T, C> TicketService<T, C> {
    /// Create the service over its repositories and collaborators.
    pub fn new(
        tickets: Arc<T>,
        customers: Arc<C>,
        messages: Arc<dyn Communications>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            customers,
            messages,
            clock,
        }
    }
}

impl<T, C> TicketService<T, C>
where
    T: TicketRepository,
    C: CustomerRepository,
{
    async fn require_ticket(&self, id: TicketId) -> Result<Ticket, Error> {
        self.tickets
            .find_by_id(&id)
            .await
            .map_err(map_ticket_error)?
            .ok_or_else(|| Error::not_found(format!("ticket {id} not found")))
    }

    async fn notify_response(&self, ticket: &Ticket, body: &str) -> Result<(), Error> {
        let customer = require_customer(self.customers.as_ref(), ticket.customer_id).await?;
        self.messages
            .enqueue(MessageDraft {
                customer_id: customer.id,
                channel: customer.preferred_channel(),
                purpose: MessagePurpose::General,
                subject: Some(format!("Re: {}", ticket.subject)),
                body: body.to_owned(),
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<T, C> SupportDesk for TicketService<T, C>
where
    T: TicketRepository,
    C: CustomerRepository,
{
    async fn open_ticket(&self, draft: TicketDraft) -> Result<Ticket, Error> {
        require_customer(self.customers.as_ref(), draft.customer_id).await?;
        let ticket = Ticket::open(draft, self.clock.utc()).map_err(map_rule_error)?;
        self.tickets
            .create(&ticket)
            .await
            .map_err(map_ticket_error)?;
        tracing::info!(ticket_id = %ticket.id, priority = %ticket.priority, "ticket opened");
        Ok(ticket)
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Ticket, Error> {
        self.require_ticket(id).await
    }

    async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>, Error> {
        self.tickets.list(&filter).await.map_err(map_ticket_error)
    }

    async fn respond(&self, id: TicketId, body: String) -> Result<Ticket, Error> {
        let mut ticket = self.require_ticket(id).await?;
        ticket
            .respond(&body, self.clock.utc())
            .map_err(map_rule_error)?;
        self.tickets
            .update(&ticket)
            .await
            .map_err(map_ticket_error)?;
        if let Err(error) = self.notify_response(&ticket, &body).await {
            tracing::warn!(ticket_id = %ticket.id, %error, "ticket response not delivered");
        }
        Ok(ticket)
    }

    async fn update_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<Ticket, Error> {
        let mut ticket = self.require_ticket(id).await?;
        ticket
            .transition(status, self.clock.utc())
            .map_err(map_rule_error)?;
        self.tickets
            .update(&ticket)
            .await
            .map_err(map_ticket_error)?;
        Ok(ticket)
    }

    async fn escalate_overdue(&self, limit: u32) -> Result<u32, Error> {
        let now = self.clock.utc();
        let overdue = self
            .tickets
            .list_overdue(now, limit)
            .await
            .map_err(map_ticket_error)?;
        let mut processed = 0;
        for mut ticket in overdue {
            if !ticket.escalate(now) {
                continue;
            }
            self.tickets
                .update(&ticket)
                .await
                .map_err(map_ticket_error)?;
            tracing::warn!(
                ticket_id = %ticket.id,
                level = ticket.escalation_level,
                priority = %ticket.priority,
                "ticket escalated"
            );
            processed += 1;
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCommunications, MockCustomerRepository, MockTicketRepository};
    use crate::domain::test_fixtures::{fixture_clock, fixture_now, logged, sample_customer};
    use crate::domain::{CustomerId, ErrorCode, MessageStatus, TicketPriority};
    use chrono::Duration;
    use rstest::rstest;

    fn service(
        tickets: MockTicketRepository,
        customers: MockCustomerRepository,
        messages: MockCommunications,
    ) -> TicketService<MockTicketRepository, MockCustomerRepository> {
        TicketService::new(
            Arc::new(tickets),
            Arc::new(customers),
            Arc::new(messages),
            fixture_clock(),
        )
    }

    fn ticket(customer_id: CustomerId, priority: TicketPriority, age: Duration) -> Ticket {
        Ticket::open(
            TicketDraft {
                customer_id,
                subject: "Streaky windows".into(),
                body: "The living room windows still have streaks.".into(),
                priority: Some(priority),
            },
            fixture_now() - age,
        )
        .expect("valid ticket")
    }

    #[rstest]
    #[tokio::test]
    async fn opening_starts_the_sla_clock() {
        let customer = sample_customer();
        let customer_id = customer.id;
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(customer)));
        let mut tickets = MockTicketRepository::new();
        tickets.expect_create().times(1).returning(|_| Ok(()));

        let ticket = service(tickets, customers, MockCommunications::new())
            .open_ticket(TicketDraft {
                customer_id,
                subject: "Broken vase".into(),
                body: "Found it in pieces after the clean.".into(),
                priority: Some(TicketPriority::High),
            })
            .await
            .expect("opened");
        assert_eq!(ticket.response_due_at, fixture_now() + Duration::hours(4));
    }

    #[rstest]
    #[tokio::test]
    async fn response_is_sent_to_the_customer() {
        let customer = sample_customer();
        let existing = ticket(customer.id, TicketPriority::Normal, Duration::hours(1));
        let id = existing.id;
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(existing)));
        tickets
            .expect_update()
            .withf(|t| t.status == TicketStatus::Pending && t.first_response_at.is_some())
            .times(1)
            .returning(|_| Ok(()));
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(customer)));
        let mut messages = MockCommunications::new();
        messages
            .expect_enqueue()
            .withf(|draft| draft.subject.as_deref() == Some("Re: Streaky windows"))
            .times(1)
            .returning(|draft| Ok(logged(draft, MessageStatus::Sent)));

        let ticket = service(tickets, customers, messages)
            .respond(id, "We will send someone tomorrow.".into())
            .await
            .expect("responded");
        assert_eq!(ticket.first_response_at, Some(fixture_now()));
    }

    #[rstest]
    #[tokio::test]
    async fn closed_tickets_reject_responses() {
        let mut existing = ticket(CustomerId::random(), TicketPriority::Low, Duration::hours(1));
        existing
            .transition(TicketStatus::Closed, fixture_now())
            .expect("closed");
        let id = existing.id;
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(existing)));
        tickets.expect_update().times(0);

        let err = service(tickets, MockCustomerRepository::new(), MockCommunications::new())
            .respond(id, "hello".into())
            .await
            .expect_err("closed");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn overdue_tickets_escalate() {
        let overdue = vec![
            ticket(CustomerId::random(), TicketPriority::Normal, Duration::hours(30)),
            // Not yet overdue: the repository may return it near the boundary.
            ticket(CustomerId::random(), TicketPriority::Low, Duration::hours(1)),
        ];
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_list_overdue()
            .return_once(move |_, _| Ok(overdue));
        tickets
            .expect_update()
            .withf(|t| t.priority == TicketPriority::High && t.escalation_level == 1)
            .times(1)
            .returning(|_| Ok(()));

        let processed = service(tickets, MockCustomerRepository::new(), MockCommunications::new())
            .escalate_overdue(100)
            .await
            .expect("escalated");
        assert_eq!(processed, 1);
    }
}
