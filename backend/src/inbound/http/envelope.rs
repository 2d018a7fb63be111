//! JSON envelope wrapping every API response.
//!
//! ```text
//! {"success":true,"data":{..},"message":"customer created","status":201,"version":"1.0"}
//! {"success":false,"error":"not_found","message":"..","status":404,"version":"1.0"}
//! ```

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Error, ErrorCode};

/// Envelope format version reported to clients.
pub const API_VERSION: &str = "1.0";

/// Success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Always `true`.
    pub success: bool,
    /// Response payload.
    pub data: T,
    /// Human-readable summary.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Envelope format version.
    pub version: String,
}

impl<T: Serialize> Envelope<T> {
    fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            status: status.as_u16(),
            version: API_VERSION.to_owned(),
        }
    }
}

/// Error envelope built from a domain [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Stable machine-readable error code.
    pub error: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Envelope format version.
    pub version: String,
    /// Correlation identifier for the failed request.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace_id: Option<String>,
    /// Supplementary details such as the offending field.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    /// Build an envelope for `error` sent with `status`.
    pub fn new(error: &Error, status: StatusCode) -> Self {
        Self {
            success: false,
            error: error.code(),
            message: error.message().to_owned(),
            status: status.as_u16(),
            version: API_VERSION.to_owned(),
            trace_id: error.trace_id().map(str::to_owned),
            details: error.details().cloned(),
        }
    }
}

/// Build an enveloped response with an explicit status.
pub fn respond<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::new(status, message, data))
}

/// `200 OK` envelope.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    respond(StatusCode::OK, message, data)
}

/// `201 Created` envelope.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    respond(StatusCode::CREATED, message, data)
}
