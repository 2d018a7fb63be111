//! OpenAPI schema definitions for the response envelopes.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`; the
//! wrappers here describe their wire shape for the generated document.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with current state.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency is temporarily unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::inbound::http::envelope::ErrorEnvelope`].
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorEnvelopeSchema {
    /// Always `false`.
    #[schema(example = false)]
    success: bool,
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    error: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "name must be 1-120 characters")]
    message: String,
    /// HTTP status code.
    #[schema(example = 400)]
    status: u16,
    #[schema(example = "1.0")]
    version: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::inbound::http::envelope::Envelope`].
#[derive(ToSchema)]
#[schema(as = Envelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct EnvelopeSchema {
    /// Always `true`.
    #[schema(example = true)]
    success: bool,
    /// Resource payload.
    data: serde_json::Value,
    #[schema(example = "customer created")]
    message: String,
    #[schema(example = 200)]
    status: u16,
    #[schema(example = "1.0")]
    version: String,
}
