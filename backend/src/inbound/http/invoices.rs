//! Invoicing endpoints.
//!
//! ```text
//! POST /api/v1/invoices {"customerId":"..","jobId":"..","promotionCode":"SPRING25"}
//! GET  /api/v1/invoices?customerId=..&status=sent
//! GET  /api/v1/invoices/{id}
//! POST /api/v1/invoices/{id}/send
//! POST /api/v1/invoices/{id}/pay
//! POST /api/v1/invoices/{id}/void
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, InvoiceDraft, InvoiceFilter, InvoiceId, InvoiceStatus, JobId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, missing_field_error, parse_id};

const INVOICE_ID: FieldName = FieldName::new("invoiceId");
const SUBTOTAL_CENTS: FieldName = FieldName::new("subtotalCents");

/// Body for `POST /api/v1/invoices`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Customer to bill.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// Bill a completed job; its price is the default subtotal.
    #[schema(value_type = Option<String>, format = Uuid)]
    pub job_id: Option<JobId>,
    /// Required when no job is given.
    pub subtotal_cents: Option<i64>,
    /// Promotion code to redeem.
    #[schema(example = "SPRING25")]
    pub promotion_code: Option<String>,
    /// Defaults to fourteen days after creation.
    pub due_date: Option<NaiveDate>,
}

impl From<CreateInvoiceRequest> for InvoiceDraft {
    fn from(value: CreateInvoiceRequest) -> Self {
        Self {
            customer_id: value.customer_id,
            job_id: value.job_id,
            subtotal_cents: value.subtotal_cents,
            promotion_code: value.promotion_code,
            due_date: value.due_date,
        }
    }
}

/// Filters for listing invoices.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InvoiceQuery {
    /// Restrict to one customer; customers may only name themselves.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    #[param(value_type = Option<String>)]
    pub status: Option<InvoiceStatus>,
}

/// Price and create a draft invoice, applying tier and promotion discounts.
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = EnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 404, description = "Customer, job or promotion not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Promotion not redeemable", body = ErrorEnvelopeSchema)
    ),
    tags = ["invoices"],
    operation_id = "createInvoice"
)]
#[post("/invoices")]
pub async fn create_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateInvoiceRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let request = payload.into_inner();
    if request.job_id.is_none() && request.subtotal_cents.is_none() {
        return Err(missing_field_error(SUBTOTAL_CENTS));
    }
    let invoice = state.invoices.create_invoice(request.into()).await?;
    Ok(envelope::created("invoice created", invoice))
}

/// List invoices.
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(InvoiceQuery, PageQuery),
    responses(
        (status = 200, description = "Invoices", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["invoices"],
    operation_id = "listInvoices"
)]
#[get("/invoices")]
pub async fn list_invoices(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<InvoiceQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let query = query.into_inner();
    let filter = InvoiceFilter {
        customer_id: principal.scope_customer(query.customer_id)?,
        status: query.status,
        page: page.into_inner().to_page()?,
    };
    let invoices = state.invoices.list_invoices(filter).await?;
    Ok(envelope::ok("invoices", invoices))
}

/// Fetch one invoice.
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["invoices"],
    operation_id = "getInvoice"
)]
#[get("/invoices/{id}")]
pub async fn get_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: InvoiceId = parse_id(&path, INVOICE_ID)?;
    let invoice = state.invoices.get_invoice(id).await?;
    principal.require_customer_access(invoice.customer_id)?;
    Ok(envelope::ok("invoice", invoice))
}

/// Issue a draft invoice and email it to the customer.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/send",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice sent", body = EnvelopeSchema),
        (status = 409, description = "Invoice is not a draft", body = ErrorEnvelopeSchema)
    ),
    tags = ["invoices"],
    operation_id = "sendInvoice"
)]
#[post("/invoices/{id}/send")]
pub async fn send_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: InvoiceId = parse_id(&path, INVOICE_ID)?;
    let invoice = state.invoices.send_invoice(id).await?;
    Ok(envelope::ok("invoice sent", invoice))
}

/// Record payment and award loyalty points.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/pay",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice paid", body = EnvelopeSchema),
        (status = 409, description = "Invoice cannot be paid", body = ErrorEnvelopeSchema)
    ),
    tags = ["invoices"],
    operation_id = "payInvoice"
)]
#[post("/invoices/{id}/pay")]
pub async fn pay_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: InvoiceId = parse_id(&path, INVOICE_ID)?;
    let invoice = state.invoices.mark_paid(id).await?;
    Ok(envelope::ok("invoice paid", invoice))
}

/// Void an unpaid invoice.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/void",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice voided", body = EnvelopeSchema),
        (status = 409, description = "Invoice cannot be voided", body = ErrorEnvelopeSchema)
    ),
    tags = ["invoices"],
    operation_id = "voidInvoice"
)]
#[post("/invoices/{id}/void")]
pub async fn void_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: InvoiceId = parse_id(&path, INVOICE_ID)?;
    let invoice = state.invoices.void_invoice(id).await?;
    Ok(envelope::ok("invoice voided", invoice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;
    use crate::domain::ports::MockInvoicing;
    use crate::domain::test_fixtures::sample_invoice;
    use crate::inbound::http::test_utils::{
        customer, read_json, session_cookie, staff, test_app, test_state,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(invoices: MockInvoicing) -> HttpState {
        HttpState {
            invoices: Arc::new(invoices),
            ..test_state()
        }
    }

    #[actix_web::test]
    async fn create_passes_promotion_code() {
        let customer_id = CustomerId::random();
        let mut invoices = MockInvoicing::new();
        invoices
            .expect_create_invoice()
            .withf(move |draft| {
                draft.customer_id == customer_id
                    && draft.promotion_code.as_deref() == Some("SPRING25")
                    && draft.subtotal_cents == Some(18_000)
            })
            .times(1)
            .returning(|draft| Ok(sample_invoice(draft.customer_id)));
        let app = actix_test::init_service(test_app(state_with(invoices))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/invoices")
            .cookie(cookie)
            .set_json(json!({
                "customerId": customer_id,
                "subtotalCents": 18000,
                "promotionCode": "SPRING25",
            }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["data"]["totalCents"], 18000);
        assert_eq!(body["data"]["status"], "draft");
    }

    #[actix_web::test]
    async fn subtotal_is_required_without_a_job() {
        let mut invoices = MockInvoicing::new();
        invoices.expect_create_invoice().never();
        let app = actix_test::init_service(test_app(state_with(invoices))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/invoices")
            .cookie(cookie)
            .set_json(json!({ "customerId": CustomerId::random() }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "invalid_request");
        assert_eq!(body["details"]["field"], "subtotalCents");
        assert_eq!(body["details"]["code"], "missing_field");
    }

    #[actix_web::test]
    async fn customer_sees_only_own_invoices() {
        let own = CustomerId::random();
        let mut invoices = MockInvoicing::new();
        invoices
            .expect_list_invoices()
            .withf(move |filter| filter.customer_id == Some(own))
            .times(1)
            .returning(move |_| Ok(vec![sample_invoice(own)]));
        let app = actix_test::init_service(test_app(state_with(invoices))).await;
        let cookie = session_cookie(&app, &customer(own)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/invoices")
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn customer_cannot_ask_for_someone_else() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = session_cookie(&app, &customer(CustomerId::random())).await;
        let request = actix_test::TestRequest::get()
            .uri(&format!("/api/v1/invoices?customerId={}", CustomerId::random()))
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[case("send")]
    #[case("pay")]
    #[case("void")]
    #[actix_web::test]
    async fn lifecycle_actions_are_staff_only(#[case] action: &str) {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = session_cookie(&app, &customer(CustomerId::random())).await;
        let request = actix_test::TestRequest::post()
            .uri(&format!("/api/v1/invoices/{}/{action}", InvoiceId::random()))
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn paying_a_draft_is_conflict() {
        let mut invoices = MockInvoicing::new();
        invoices
            .expect_mark_paid()
            .times(1)
            .returning(|_| Err(Error::conflict("cannot move invoice from draft to paid")));
        let app = actix_test::init_service(test_app(state_with(invoices))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let request = actix_test::TestRequest::post()
            .uri(&format!("/api/v1/invoices/{}/pay", InvoiceId::random()))
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
