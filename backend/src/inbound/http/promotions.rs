//! Promotion endpoints.
//!
//! ```text
//! POST /api/v1/promotions
//! GET  /api/v1/promotions?activeOnly=true
//! GET  /api/v1/promotions/{code}
//! POST /api/v1/promotions/{code}/validate {"customerId":"..","amountCents":24000}
//! POST /api/v1/promotions/{code}/redeem   {"customerId":"..","amountCents":24000}
//! POST /api/v1/promotions/{code}/deliver  {"channel":"email"}
//! ```
//!
//! Codes in the path are matched case-insensitively.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Channel, CustomerId, Discount, Error, LoyaltyTier, MAX_AMOUNT_CENTS, PromotionDraft,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, invalid_value_error};

/// Body for `POST /api/v1/promotions`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionRequest {
    /// Code customers enter; normalised to upper case.
    #[schema(example = "SPRING-10")]
    pub code: String,
    /// Text shown to customers.
    pub description: String,
    /// `{"kind":"percent","value":10}` or `{"kind":"fixed","value":2500}`.
    #[schema(value_type = Object)]
    pub discount: Discount,
    /// Start of the redemption window.
    pub starts_at: DateTime<Utc>,
    /// End of the redemption window.
    pub ends_at: DateTime<Utc>,
    /// Total redemptions allowed; unlimited when absent.
    pub max_redemptions: Option<i32>,
    /// Lowest loyalty tier that may redeem.
    #[schema(value_type = Option<String>, example = "silver")]
    pub min_tier: Option<LoyaltyTier>,
}

impl From<CreatePromotionRequest> for PromotionDraft {
    fn from(value: CreatePromotionRequest) -> Self {
        Self {
            code: value.code,
            description: value.description,
            discount: value.discount,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            max_redemptions: value.max_redemptions,
            min_tier: value.min_tier,
        }
    }
}

/// Amount to price with a promotion for a given customer.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Customer the quote is for.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// Amount in cents to discount.
    #[schema(example = 24000)]
    pub amount_cents: i64,
}

/// Body for delivering a promotion to eligible customers.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DeliverPromotionRequest {
    /// `email` or `sms`.
    #[schema(value_type = String, example = "email")]
    pub channel: Channel,
}

/// Filters for listing promotions.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PromotionQuery {
    /// Ignored for customers, who only ever see active promotions.
    pub active_only: Option<bool>,
}

/// Create a promotion.
#[utoipa::path(
    post,
    path = "/api/v1/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Promotion created", body = EnvelopeSchema),
        (status = 400, description = "Invalid promotion", body = ErrorEnvelopeSchema),
        (status = 409, description = "Code already in use", body = ErrorEnvelopeSchema)
    ),
    tags = ["promotions"],
    operation_id = "createPromotion"
)]
#[post("/promotions")]
pub async fn create_promotion(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePromotionRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let promotion = state
        .promotions
        .create_promotion(payload.into_inner().into())
        .await?;
    Ok(envelope::created("promotion created", promotion))
}

/// List promotions, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/promotions",
    params(PromotionQuery, PageQuery),
    responses(
        (status = 200, description = "Promotions", body = EnvelopeSchema),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema)
    ),
    tags = ["promotions"],
    operation_id = "listPromotions"
)]
#[get("/promotions")]
pub async fn list_promotions(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PromotionQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let active_only = !principal.role.is_staff() || query.active_only.unwrap_or(false);
    let promotions = state
        .promotions
        .list_promotions(active_only, page.into_inner().to_page()?)
        .await?;
    Ok(envelope::ok("promotions", promotions))
}

/// Fetch one promotion by code.
#[utoipa::path(
    get,
    path = "/api/v1/promotions/{code}",
    params(("code" = String, Path, description = "Promotion code")),
    responses(
        (status = 200, description = "Promotion", body = EnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["promotions"],
    operation_id = "getPromotion"
)]
#[get("/promotions/{code}")]
pub async fn get_promotion(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_principal()?;
    let promotion = state.promotions.get_promotion(&path).await?;
    Ok(envelope::ok("promotion", promotion))
}

/// Quote the discount without redeeming.
#[utoipa::path(
    post,
    path = "/api/v1/promotions/{code}/validate",
    params(("code" = String, Path, description = "Promotion code")),
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Discount quote", body = EnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Promotion not applicable", body = ErrorEnvelopeSchema)
    ),
    tags = ["promotions"],
    operation_id = "validatePromotion"
)]
#[post("/promotions/{code}/validate")]
pub async fn validate_promotion(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<QuoteRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let QuoteRequest {
        customer_id,
        amount_cents,
    } = checked_quote(payload.into_inner())?;
    principal.require_customer_access(customer_id)?;
    let quote = state
        .promotions
        .quote(&path, customer_id, amount_cents)
        .await?;
    Ok(envelope::ok("promotion applies", quote))
}

/// Redeem a promotion for a customer.
#[utoipa::path(
    post,
    path = "/api/v1/promotions/{code}/redeem",
    params(("code" = String, Path, description = "Promotion code")),
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Promotion redeemed", body = EnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Promotion not applicable or already used", body = ErrorEnvelopeSchema)
    ),
    tags = ["promotions"],
    operation_id = "redeemPromotion"
)]
#[post("/promotions/{code}/redeem")]
pub async fn redeem_promotion(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<QuoteRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let QuoteRequest {
        customer_id,
        amount_cents,
    } = checked_quote(payload.into_inner())?;
    principal.require_customer_access(customer_id)?;
    let quote = state
        .promotions
        .redeem(&path, customer_id, amount_cents)
        .await?;
    Ok(envelope::ok("promotion redeemed", quote))
}

/// Queue the promotion to every eligible, opted-in customer.
#[utoipa::path(
    post,
    path = "/api/v1/promotions/{code}/deliver",
    params(("code" = String, Path, description = "Promotion code")),
    request_body = DeliverPromotionRequest,
    responses(
        (status = 200, description = "Messages queued", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["promotions"],
    operation_id = "deliverPromotion"
)]
#[post("/promotions/{code}/deliver")]
pub async fn deliver_promotion(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DeliverPromotionRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let queued = state
        .promotions
        .deliver(&path, payload.into_inner().channel)
        .await?;
    Ok(envelope::ok(
        format!("promotion queued for {queued} customers"),
        serde_json::json!({ "queued": queued }),
    ))
}

fn checked_quote(request: QuoteRequest) -> Result<QuoteRequest, Error> {
    if request.amount_cents < 0 {
        return Err(invalid_value_error(
            FieldName::new("amountCents"),
            "amount must not be negative",
        ));
    }
    if request.amount_cents > MAX_AMOUNT_CENTS {
        return Err(invalid_value_error(
            FieldName::new("amountCents"),
            format!("amount must not exceed {MAX_AMOUNT_CENTS} cents"),
        ));
    }
    Ok(request)
}
