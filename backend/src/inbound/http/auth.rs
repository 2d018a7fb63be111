//! Login, logout and account administration.
//!
//! ```text
//! POST /api/v1/login {"username":"office","password":"..."}
//! POST /api/v1/logout
//! GET  /api/v1/me
//! POST /api/v1/accounts {"username":"jo","displayName":"Jo","role":"staff","password":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AccountValidationError, CustomerId, Error, LoginCredentials, LoginValidationError, NewAccount,
    Role,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = EnvelopeSchema,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let account = state.login.authenticate(&credentials).await?;
    session.persist_principal(&account.principal())?;
    tracing::info!(account_id = %account.id, role = %account.role, "login succeeded");
    Ok(envelope::ok("logged in", account))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared", body = EnvelopeSchema)),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.clear();
    Ok(envelope::ok("logged out", serde_json::Value::Null))
}

/// Return the account behind the current session.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current account", body = EnvelopeSchema),
        (status = 401, description = "Not logged in", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "currentAccount"
)]
#[get("/me")]
pub async fn current_account(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let account = state.accounts.find_account(principal.user_id).await?;
    Ok(envelope::ok("current account", account))
}

/// Body for `POST /api/v1/accounts`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Login name; unique across accounts.
    pub username: String,
    /// Name shown in the staff UI.
    pub display_name: String,
    /// `admin`, `staff` or `customer`.
    #[schema(value_type = String, example = "staff")]
    pub role: Role,
    /// Required for `customer` accounts.
    #[schema(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Initial password.
    pub password: String,
}

fn map_account_validation_error(err: AccountValidationError) -> Error {
    let field = match err {
        AccountValidationError::InvalidUsername { .. } => "username",
        AccountValidationError::InvalidDisplayName { .. } => "displayName",
        AccountValidationError::PasswordTooShort { .. } => "password",
        AccountValidationError::MissingCustomer | AccountValidationError::UnexpectedCustomer => {
            "customerId"
        }
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Create a staff or portal account (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = EnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 403, description = "Admin access required", body = ErrorEnvelopeSchema),
        (status = 409, description = "Username taken", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "createAccount"
)]
#[post("/accounts")]
pub async fn create_account(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateAccountRequest>,
) -> ApiResult<HttpResponse> {
    session.require_principal()?.require_admin()?;
    let body = payload.into_inner();
    let request = NewAccount::try_new(
        &body.username,
        &body.display_name,
        body.role,
        body.customer_id,
        &body.password,
    )
    .map_err(map_account_validation_error)?;
    let account = state.accounts.create_account(request).await?;
    Ok(envelope::created("account created", account))
}
