//! Wiring of Diesel repositories, domain services and messaging adapters into
//! the HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use crm_backend::domain::ports::{
    Communications, LoyaltyProgram, MessageSender, PromotionsCatalog, ReviewRequests,
};
use crm_backend::domain::{
    AccountService, ChatService, CommunicationService, CronService, CustomerService,
    InvoiceService, JobService, LoyaltyService, OpportunityService, PromotionService,
    ReviewService, TicketService,
};
use crm_backend::inbound::http::cron::CronSecret;
use crm_backend::inbound::http::state::HttpState;
use crm_backend::outbound::messaging::{
    LoggingMessageSender, WebhookIdentity, WebhookMessageSender,
};
use crm_backend::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselChatRepository, DieselCustomerRepository,
    DieselInvoiceRepository, DieselJobRepository, DieselLoyaltyRepository,
    DieselMessageRepository, DieselOpportunityRepository, DieselPromotionRepository,
    DieselReviewRepository, DieselTicketRepository,
};

use super::config::{ServerSettings, SettingsError};

/// Failures while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateBuildError {
    /// Settings failed validation.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// HTTP client for the relay could not be built.
    #[error("failed to build webhook client: {0}")]
    Webhook(#[from] reqwest::Error),
}

fn communications_with<S>(
    pool: &DbPool,
    customers: &Arc<DieselCustomerRepository>,
    sender: S,
    settings: &ServerSettings,
    clock: &Arc<dyn Clock>,
) -> Result<Arc<dyn Communications>, StateBuildError>
where
    S: MessageSender + 'static,
{
    Ok(Arc::new(CommunicationService::new(
        Arc::new(DieselMessageRepository::new(pool.clone())),
        Arc::clone(customers),
        Arc::new(sender),
        settings.quiet_hours()?,
        Arc::clone(clock),
    )))
}

/// Pick the delivery adapter: the webhook relay when configured, otherwise
/// the trace logger.
fn build_communications(
    pool: &DbPool,
    customers: &Arc<DieselCustomerRepository>,
    settings: &ServerSettings,
    clock: &Arc<dyn Clock>,
) -> Result<Arc<dyn Communications>, StateBuildError> {
    match settings.webhook_url()? {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "delivering messages through webhook relay");
            let identity = WebhookIdentity {
                token: settings.webhook_token.clone(),
                ..WebhookIdentity::default()
            };
            let sender = WebhookMessageSender::new(endpoint, settings.webhook_timeout(), identity)?;
            communications_with(pool, customers, sender, settings, clock)
        }
        None => {
            info!("no webhook configured; outbound messages are logged only");
            communications_with(pool, customers, LoggingMessageSender, settings, clock)
        }
    }
}

/// Build every driving port on top of the shared pool.
///
/// Services that feed each other (jobs scheduling review requests, invoices
/// awarding loyalty points) receive the already built ports.
pub fn build_http_state(
    pool: &DbPool,
    settings: &ServerSettings,
) -> Result<HttpState, StateBuildError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let customers_repo = Arc::new(DieselCustomerRepository::new(pool.clone()));
    let jobs_repo = Arc::new(DieselJobRepository::new(pool.clone()));

    let communications = build_communications(pool, &customers_repo, settings, &clock)?;

    let accounts = Arc::new(AccountService::new(
        Arc::new(DieselAccountRepository::new(pool.clone())),
        Arc::clone(&customers_repo),
        Arc::clone(&clock),
    ));

    let loyalty: Arc<dyn LoyaltyProgram> = Arc::new(LoyaltyService::new(
        Arc::new(DieselLoyaltyRepository::new(pool.clone())),
        Arc::clone(&customers_repo),
        Arc::clone(&clock),
    ));

    let reviews: Arc<dyn ReviewRequests> = Arc::new(ReviewService::new(
        Arc::new(DieselReviewRepository::new(pool.clone())),
        Arc::clone(&customers_repo),
        Arc::clone(&communications),
        settings.review_policy()?,
        Arc::clone(&clock),
    ));

    let promotions: Arc<dyn PromotionsCatalog> = Arc::new(PromotionService::new(
        Arc::new(DieselPromotionRepository::new(pool.clone())),
        Arc::clone(&customers_repo),
        Arc::clone(&loyalty),
        Arc::clone(&communications),
        Arc::clone(&clock),
    ));

    let mut job_service = JobService::new(
        Arc::clone(&jobs_repo),
        Arc::clone(&customers_repo),
        Arc::clone(&reviews),
        Arc::clone(&communications),
        Arc::clone(&clock),
    )
    .with_zone(settings.default_zone()?);
    if let Some(lead) = settings.reminder_lead()? {
        job_service = job_service.with_reminder_lead(lead);
    }
    let jobs = Arc::new(job_service);

    let mut invoice_service = InvoiceService::new(
        Arc::new(DieselInvoiceRepository::new(pool.clone())),
        Arc::clone(&jobs_repo),
        Arc::clone(&customers_repo),
        Arc::clone(&loyalty),
        Arc::clone(&promotions),
        Arc::clone(&communications),
        Arc::clone(&clock),
    );
    if let Some(terms) = settings.payment_terms()? {
        invoice_service = invoice_service.with_payment_terms(terms);
    }
    let invoices = Arc::new(invoice_service);

    let opportunities = Arc::new(OpportunityService::new(
        Arc::new(DieselOpportunityRepository::new(pool.clone())),
        Arc::clone(&jobs_repo),
        Arc::clone(&customers_repo),
        Arc::clone(&loyalty),
        Arc::clone(&clock),
    ));

    let support = Arc::new(TicketService::new(
        Arc::new(DieselTicketRepository::new(pool.clone())),
        Arc::clone(&customers_repo),
        Arc::clone(&communications),
        Arc::clone(&clock),
    ));

    let chat = Arc::new(ChatService::new(
        Arc::new(DieselChatRepository::new(pool.clone())),
        Arc::clone(&customers_repo),
        Arc::clone(&clock),
    ));

    let scheduled = Arc::new(CronService::new(
        jobs.clone(),
        invoices.clone(),
        opportunities.clone(),
        Arc::clone(&reviews),
        Arc::clone(&communications),
        Arc::clone(&promotions),
        support.clone(),
    ));

    let cron_secret = settings
        .cron_secret
        .as_deref()
        .filter(|secret| !secret.is_empty())
        .map(CronSecret::new);
    match &cron_secret {
        Some(secret) => info!(fingerprint = %secret.fingerprint(), "cron endpoints enabled"),
        None => info!("CRM_CRON_SECRET unset; cron endpoints disabled"),
    }

    Ok(HttpState {
        login: accounts.clone(),
        accounts,
        customers: Arc::new(CustomerService::new(
            Arc::clone(&customers_repo),
            Arc::clone(&clock),
        )),
        jobs,
        invoices,
        loyalty,
        opportunities,
        reviews,
        communications,
        promotions,
        support,
        chat,
        scheduled,
        cron_secret,
    })
}
