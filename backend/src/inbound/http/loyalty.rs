//! Loyalty account endpoints, nested under the customer.
//!
//! ```text
//! GET  /api/v1/customers/{id}/loyalty
//! GET  /api/v1/customers/{id}/loyalty/ledger
//! POST /api/v1/customers/{id}/loyalty/redeem {"points":200}
//! POST /api/v1/customers/{id}/loyalty/adjust {"delta":-50,"note":"goodwill reversal"}
//! ```
//!
//! Points are earned by paying invoices; there is no direct award endpoint.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::CustomerId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, invalid_value_error, parse_id};

const CUSTOMER_ID: FieldName = FieldName::new("customerId");

/// Body for redeeming points.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RedeemPointsRequest {
    /// Points to spend; must be a whole number of redemption blocks.
    #[schema(example = 200)]
    pub points: i64,
}

/// Body for a manual points adjustment.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AdjustPointsRequest {
    /// Signed change; the balance may not go negative.
    #[schema(example = -50)]
    pub delta: i64,
    /// Reason recorded in the ledger.
    pub note: Option<String>,
}

/// Fetch a customer's loyalty account.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/loyalty",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Loyalty account", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["loyalty"],
    operation_id = "getLoyaltyAccount"
)]
#[get("/customers/{id}/loyalty")]
pub async fn get_loyalty_account(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    principal.require_customer_access(id)?;
    let account = state.loyalty.account(id).await?;
    Ok(envelope::ok("loyalty account", account))
}

/// Page through a customer's points ledger, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/loyalty/ledger",
    params(("id" = String, Path, description = "Customer id"), PageQuery),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["loyalty"],
    operation_id = "listLoyaltyLedger"
)]
#[get("/customers/{id}/loyalty/ledger")]
pub async fn list_ledger(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    principal.require_customer_access(id)?;
    let entries = state
        .loyalty
        .ledger(id, page.into_inner().to_page()?)
        .await?;
    Ok(envelope::ok("loyalty ledger", entries))
}

/// Convert points into account credit (100 points = 5.00).
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/loyalty/redeem",
    params(("id" = String, Path, description = "Customer id")),
    request_body = RedeemPointsRequest,
    responses(
        (status = 200, description = "Points redeemed", body = EnvelopeSchema),
        (status = 400, description = "Invalid amount", body = ErrorEnvelopeSchema),
        (status = 409, description = "Insufficient balance", body = ErrorEnvelopeSchema)
    ),
    tags = ["loyalty"],
    operation_id = "redeemPoints"
)]
#[post("/customers/{id}/loyalty/redeem")]
pub async fn redeem_points(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RedeemPointsRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    principal.require_customer_access(id)?;
    let points = payload.into_inner().points;
    if points <= 0 {
        return Err(invalid_value_error(
            FieldName::new("points"),
            "points must be positive",
        ));
    }
    let redemption = state.loyalty.redeem_points(id, points).await?;
    Ok(envelope::ok("points redeemed", redemption))
}

/// Apply a manual points adjustment.
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/loyalty/adjust",
    params(("id" = String, Path, description = "Customer id")),
    request_body = AdjustPointsRequest,
    responses(
        (status = 200, description = "Balance adjusted", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema),
        (status = 409, description = "Balance would go negative", body = ErrorEnvelopeSchema)
    ),
    tags = ["loyalty"],
    operation_id = "adjustPoints"
)]
#[post("/customers/{id}/loyalty/adjust")]
pub async fn adjust_points(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AdjustPointsRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    let AdjustPointsRequest { delta, note } = payload.into_inner();
    if delta == 0 {
        return Err(invalid_value_error(
            FieldName::new("delta"),
            "delta must not be zero",
        ));
    }
    let account = state.loyalty.adjust_points(id, delta, note).await?;
    Ok(envelope::ok("points adjusted", account))
}
