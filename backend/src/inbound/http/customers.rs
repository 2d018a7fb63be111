//! Customer directory endpoints.
//!
//! ```text
//! POST   /api/v1/customers
//! GET    /api/v1/customers?search=smith&includeArchived=false&limit=50&offset=0
//! GET    /api/v1/customers/{id}
//! PATCH  /api/v1/customers/{id}
//! DELETE /api/v1/customers/{id}
//! ```
//!
//! Portal users may read their own record and change its contact
//! preferences; everything else is staff only.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerDraft, CustomerFilter, CustomerId, CustomerUpdate, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};

const CUSTOMER_ID: FieldName = FieldName::new("customerId");

/// Body for `POST /api/v1/customers`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    /// Display name.
    #[schema(example = "Ada Smith")]
    pub name: String,
    /// Contact email address.
    pub email: Option<String>,
    /// E.164, e.g. `+447700900123`.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// IANA zone name such as `Europe/London`.
    pub time_zone: Option<String>,
    /// Whether promotional email may be sent.
    #[serde(default)]
    pub email_opt_in: bool,
    /// Whether promotional SMS may be sent.
    #[serde(default)]
    pub sms_opt_in: bool,
    /// Free-form staff notes.
    pub notes: Option<String>,
}

impl From<CreateCustomerRequest> for CustomerDraft {
    fn from(value: CreateCustomerRequest) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
            address: value.address,
            time_zone: value.time_zone,
            email_opt_in: value.email_opt_in,
            sms_opt_in: value.sms_opt_in,
            notes: value.notes,
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    /// New display name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New postal address.
    pub address: Option<String>,
    /// New IANA zone name.
    pub time_zone: Option<String>,
    /// New email consent.
    pub email_opt_in: Option<bool>,
    /// New SMS consent.
    pub sms_opt_in: Option<bool>,
    /// New staff notes.
    pub notes: Option<String>,
}

impl From<UpdateCustomerRequest> for CustomerUpdate {
    fn from(value: UpdateCustomerRequest) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
            address: value.address,
            time_zone: value.time_zone,
            email_opt_in: value.email_opt_in,
            sms_opt_in: value.sms_opt_in,
            notes: value.notes,
        }
    }
}

/// Filters for listing customers.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    /// Include archived customers.
    #[serde(default)]
    pub include_archived: bool,
}

/// Create a customer record.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = EnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema)
    ),
    tags = ["customers"],
    operation_id = "createCustomer"
)]
#[post("/customers")]
pub async fn create_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCustomerRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let customer = state
        .customers
        .create_customer(payload.into_inner().into())
        .await?;
    Ok(envelope::created("customer created", customer))
}

/// List customers, optionally filtered by search text.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(CustomerQuery, PageQuery),
    responses(
        (status = 200, description = "Customers", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema)
    ),
    tags = ["customers"],
    operation_id = "listCustomers"
)]
#[get("/customers")]
pub async fn list_customers(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CustomerQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let query = query.into_inner();
    let filter = CustomerFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        include_archived: query.include_archived,
        page: page.into_inner().to_page()?,
    };
    let customers = state.customers.list_customers(filter).await?;
    Ok(envelope::ok("customers", customers))
}

/// Fetch one customer.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = EnvelopeSchema),
        (status = 403, description = "Not your record", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["customers"],
    operation_id = "getCustomer"
)]
#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    principal.require_customer_access(id)?;
    let customer = state.customers.get_customer(id).await?;
    Ok(envelope::ok("customer", customer))
}

/// Apply a partial update to a customer.
#[utoipa::path(
    patch,
    path = "/api/v1/customers/{id}",
    params(("id" = String, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = EnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["customers"],
    operation_id = "updateCustomer"
)]
#[patch("/customers/{id}")]
pub async fn update_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateCustomerRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    principal.require_customer_access(id)?;
    let update = CustomerUpdate::from(payload.into_inner());
    if !principal.role.is_staff() && !update.is_contact_preferences_only() {
        return Err(Error::forbidden(
            "customers may only change contact details and preferences",
        ));
    }
    let customer = state.customers.update_customer(id, update).await?;
    Ok(envelope::ok("customer updated", customer))
}

/// Archive a customer so they drop out of default listings.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer archived", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["customers"],
    operation_id = "archiveCustomer"
)]
#[delete("/customers/{id}")]
pub async fn archive_customer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: CustomerId = parse_id(&path, CUSTOMER_ID)?;
    let customer = state.customers.archive_customer(id).await?;
    Ok(envelope::ok("customer archived", customer))
}
