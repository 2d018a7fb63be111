//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    ChatMessage, ChatSender, Conversation, Customer, CustomerId, Invoice, InvoiceId,
    InvoicePricing, Job, JobDraft, JobId, LoyaltyTier, MessageDraft, MessageStatus, Opportunity,
    OpportunityDraft, OpportunityId, OpportunityKind, OutboundMessage, ReviewPolicy,
    ReviewRequest, ServiceType, Ticket, TicketDraft, TicketPriority,
};

/// Fixed instant used across service tests: a Tuesday afternoon in June.
pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 16, 15, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    clock_at(fixture_now())
}

pub(crate) fn clock_at(utc_now: DateTime<Utc>) -> Arc<dyn Clock> {
    Arc::new(FixtureClock { utc_now })
}

/// Opted-in customer with both addresses and no zone override.
pub(crate) fn sample_customer() -> Customer {
    let now = fixture_now();
    Customer {
        id: CustomerId::random(),
        name: "Grace Hopper".into(),
        email: Some("grace@example.com".into()),
        phone: Some("+15550100001".into()),
        address: Some("1 Harbour Way".into()),
        time_zone: None,
        email_opt_in: true,
        sms_opt_in: true,
        notes: None,
        archived: false,
        created_at: now,
        updated_at: now,
    }
}

/// Scheduled standard clean starting a day after [`fixture_now`].
pub(crate) fn sample_job(customer_id: CustomerId) -> Job {
    Job::schedule(
        JobId::random(),
        JobDraft {
            customer_id,
            service_type: ServiceType::Standard,
            scheduled_start: fixture_now() + Duration::hours(20),
            duration_minutes: 120,
            price_cents: 18_000,
            assigned_cleaner: None,
            notes: None,
        },
        fixture_now(),
    )
    .expect("valid fixture job")
}

/// Message log entry as the communications port would return it.
pub(crate) fn logged(draft: MessageDraft, status: MessageStatus) -> OutboundMessage {
    let mut message = OutboundMessage::from_draft(draft, fixture_now());
    message.status = status;
    message
}

/// Draft invoice for 180.00 with no discounts, due in two weeks.
pub(crate) fn sample_invoice(customer_id: CustomerId) -> Invoice {
    let pricing =
        InvoicePricing::compute(18_000, LoyaltyTier::Bronze, |_| 0).expect("valid pricing");
    Invoice::draft(
        InvoiceId::random(),
        customer_id,
        None,
        pricing,
        None,
        fixture_now().date_naive() + Duration::days(14),
        fixture_now(),
    )
}

pub(crate) fn sample_opportunity(customer_id: CustomerId) -> Opportunity {
    Opportunity::open(
        OpportunityId::random(),
        OpportunityDraft {
            customer_id,
            kind: OpportunityKind::Rebook,
            estimated_value_cents: 20_000,
            notes: None,
            expires_at: None,
        },
        42,
        fixture_now(),
    )
    .expect("valid fixture opportunity")
}

pub(crate) fn sample_review(customer_id: CustomerId) -> ReviewRequest {
    ReviewRequest::schedule(
        customer_id,
        JobId::random(),
        fixture_now(),
        &ReviewPolicy::default(),
    )
}

pub(crate) fn sample_ticket(customer_id: CustomerId) -> Ticket {
    Ticket::open(
        TicketDraft {
            customer_id,
            subject: "Missed the oven".into(),
            body: "The oven was not cleaned.".into(),
            priority: Some(TicketPriority::Normal),
        },
        fixture_now(),
    )
    .expect("valid fixture ticket")
}

pub(crate) fn sample_conversation(customer_id: CustomerId) -> (Conversation, ChatMessage) {
    Conversation::start(
        customer_id,
        Some("Keys".into()),
        ChatSender::Customer,
        "Where should I leave the keys?",
        fixture_now(),
    )
    .expect("valid fixture conversation")
}
