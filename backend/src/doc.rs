//! OpenAPI document for the CRM API.
//!
//! Served as JSON at `/api-docs/openapi.json` (Swagger UI at `/docs` in debug
//! builds) and exported by the `openapi-dump` binary. Two security schemes
//! are registered: the session cookie for user-facing routes and a bearer
//! secret for the cron routes.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::auth::{CreateAccountRequest, LoginRequest};
use crate::inbound::http::chat::{PostMessageRequest, StartConversationRequest};
use crate::inbound::http::customers::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::inbound::http::invoices::CreateInvoiceRequest;
use crate::inbound::http::jobs::{CreateJobRequest, JobStatusRequest};
use crate::inbound::http::loyalty::{AdjustPointsRequest, RedeemPointsRequest};
use crate::inbound::http::messages::SendMessageRequest;
use crate::inbound::http::opportunities::{CreateOpportunityRequest, OpportunityStatusRequest};
use crate::inbound::http::promotions::{
    CreatePromotionRequest, DeliverPromotionRequest, QuoteRequest,
};
use crate::inbound::http::reviews::SubmitReviewRequest;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorCodeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::tickets::{
    OpenTicketRequest, TicketResponseRequest, TicketStatusRequest,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
        components.add_security_scheme(
            "CronBearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Shared secret configured as CRM_CRON_SECRET."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document covering every REST endpoint.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Cleaning-service CRM API",
        description = "Customers, bookings, invoicing, loyalty, promotions, support and outbound messaging."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_account,
        crate::inbound::http::auth::create_account,
        crate::inbound::http::customers::create_customer,
        crate::inbound::http::customers::list_customers,
        crate::inbound::http::customers::get_customer,
        crate::inbound::http::customers::update_customer,
        crate::inbound::http::customers::archive_customer,
        crate::inbound::http::loyalty::get_loyalty_account,
        crate::inbound::http::loyalty::list_ledger,
        crate::inbound::http::loyalty::redeem_points,
        crate::inbound::http::loyalty::adjust_points,
        crate::inbound::http::jobs::create_job,
        crate::inbound::http::jobs::list_jobs,
        crate::inbound::http::jobs::get_job,
        crate::inbound::http::jobs::update_job_status,
        crate::inbound::http::invoices::create_invoice,
        crate::inbound::http::invoices::list_invoices,
        crate::inbound::http::invoices::get_invoice,
        crate::inbound::http::invoices::send_invoice,
        crate::inbound::http::invoices::pay_invoice,
        crate::inbound::http::invoices::void_invoice,
        crate::inbound::http::opportunities::create_opportunity,
        crate::inbound::http::opportunities::list_opportunities,
        crate::inbound::http::opportunities::get_opportunity,
        crate::inbound::http::opportunities::transition_opportunity,
        crate::inbound::http::reviews::list_reviews,
        crate::inbound::http::reviews::get_review,
        crate::inbound::http::reviews::submit_review,
        crate::inbound::http::messages::list_messages,
        crate::inbound::http::messages::send_message,
        crate::inbound::http::promotions::create_promotion,
        crate::inbound::http::promotions::list_promotions,
        crate::inbound::http::promotions::get_promotion,
        crate::inbound::http::promotions::validate_promotion,
        crate::inbound::http::promotions::redeem_promotion,
        crate::inbound::http::promotions::deliver_promotion,
        crate::inbound::http::tickets::open_ticket,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::respond_to_ticket,
        crate::inbound::http::tickets::update_ticket_status,
        crate::inbound::http::chat::start_conversation,
        crate::inbound::http::chat::list_conversations,
        crate::inbound::http::chat::get_conversation,
        crate::inbound::http::chat::list_chat_messages,
        crate::inbound::http::chat::post_chat_message,
        crate::inbound::http::chat::close_conversation,
        crate::inbound::http::cron::run_cron_job,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        EnvelopeSchema,
        ErrorEnvelopeSchema,
        ErrorCodeSchema,
        LoginRequest,
        CreateAccountRequest,
        CreateCustomerRequest,
        UpdateCustomerRequest,
        RedeemPointsRequest,
        AdjustPointsRequest,
        CreateJobRequest,
        JobStatusRequest,
        CreateInvoiceRequest,
        CreateOpportunityRequest,
        OpportunityStatusRequest,
        SubmitReviewRequest,
        SendMessageRequest,
        CreatePromotionRequest,
        QuoteRequest,
        DeliverPromotionRequest,
        OpenTicketRequest,
        TicketResponseRequest,
        TicketStatusRequest,
        StartConversationRequest,
        PostMessageRequest,
    )),
    tags(
        (name = "auth", description = "Login, logout and account management"),
        (name = "customers", description = "Customer directory"),
        (name = "loyalty", description = "Points balances, tiers and ledger"),
        (name = "jobs", description = "Cleaning job bookings"),
        (name = "invoices", description = "Invoicing and payment"),
        (name = "opportunities", description = "Sales pipeline"),
        (name = "reviews", description = "Post-job review requests"),
        (name = "messages", description = "Outbound email and SMS log"),
        (name = "promotions", description = "Promotion codes"),
        (name = "tickets", description = "Support tickets"),
        (name = "chat", description = "Customer conversations"),
        (name = "cron", description = "Scheduled batch jobs"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
