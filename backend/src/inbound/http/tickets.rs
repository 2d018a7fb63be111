//! Support ticket endpoints.
//!
//! ```text
//! POST /api/v1/tickets
//! GET  /api/v1/tickets?customerId=..&status=open
//! GET  /api/v1/tickets/{id}
//! POST /api/v1/tickets/{id}/respond {"body":"..."}
//! PUT  /api/v1/tickets/{id}/status  {"status":"resolved"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, TicketDraft, TicketFilter, TicketId, TicketPriority, TicketStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};

const TICKET_ID: FieldName = FieldName::new("ticketId");

/// Body for `POST /api/v1/tickets`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenTicketRequest {
    /// Customer raising the ticket.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// Short summary.
    #[schema(example = "Missed the oven")]
    pub subject: String,
    /// Full description of the problem.
    pub body: String,
    /// Defaults to `normal`.
    #[schema(value_type = Option<String>, example = "high")]
    pub priority: Option<TicketPriority>,
}

impl From<OpenTicketRequest> for TicketDraft {
    fn from(value: OpenTicketRequest) -> Self {
        Self {
            customer_id: value.customer_id,
            subject: value.subject,
            body: value.body,
            priority: value.priority,
        }
    }
}

/// Body for a staff response.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TicketResponseRequest {
    /// Response text sent to the customer.
    pub body: String,
}

/// Body for changing a ticket's status.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TicketStatusRequest {
    /// Target status.
    #[schema(value_type = String, example = "resolved")]
    pub status: TicketStatus,
}

/// Filters for listing tickets.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TicketQuery {
    /// Restrict to one customer; customers may only name themselves.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    #[param(value_type = Option<String>)]
    pub status: Option<TicketStatus>,
}

/// Open a support ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = OpenTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = EnvelopeSchema),
        (status = 400, description = "Invalid ticket", body = ErrorEnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["tickets"],
    operation_id = "openTicket"
)]
#[post("/tickets")]
pub async fn open_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OpenTicketRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let draft: TicketDraft = payload.into_inner().into();
    principal.require_customer_access(draft.customer_id)?;
    let ticket = state.support.open_ticket(draft).await?;
    Ok(envelope::created("ticket opened", ticket))
}

/// List tickets.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(TicketQuery, PageQuery),
    responses(
        (status = 200, description = "Tickets", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TicketQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let query = query.into_inner();
    let filter = TicketFilter {
        customer_id: principal.scope_customer(query.customer_id)?,
        status: query.status,
        page: page.into_inner().to_page()?,
    };
    let tickets = state.support.list_tickets(filter).await?;
    Ok(envelope::ok("tickets", tickets))
}

/// Fetch one ticket.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: TicketId = parse_id(&path, TICKET_ID)?;
    let ticket = state.support.get_ticket(id).await?;
    principal.require_customer_access(ticket.customer_id)?;
    Ok(envelope::ok("ticket", ticket))
}

/// Staff reply. The first reply stops the escalation clock.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/respond",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = TicketResponseRequest,
    responses(
        (status = 200, description = "Response recorded", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema),
        (status = 409, description = "Ticket closed", body = ErrorEnvelopeSchema)
    ),
    tags = ["tickets"],
    operation_id = "respondToTicket"
)]
#[post("/tickets/{id}/respond")]
pub async fn respond_to_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TicketResponseRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: TicketId = parse_id(&path, TICKET_ID)?;
    let ticket = state.support.respond(id, payload.into_inner().body).await?;
    Ok(envelope::ok("response recorded", ticket))
}

/// Move a ticket to a new status.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}/status",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = TicketStatusRequest,
    responses(
        (status = 200, description = "Ticket updated", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema),
        (status = 409, description = "Transition not allowed", body = ErrorEnvelopeSchema)
    ),
    tags = ["tickets"],
    operation_id = "updateTicketStatus"
)]
#[put("/tickets/{id}/status")]
pub async fn update_ticket_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TicketStatusRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: TicketId = parse_id(&path, TICKET_ID)?;
    let ticket = state
        .support
        .update_ticket_status(id, payload.into_inner().status)
        .await?;
    Ok(envelope::ok(format!("ticket {}", ticket.status), ticket))
}
