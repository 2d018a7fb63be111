//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::{App, ResponseError, test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

fn internal_error() -> Error {
    Error::internal("database password is hunter2")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}))
}

async fn body_json(error: &Error) -> Value {
    let response = error.error_response();
    let bytes = to_bytes(response.into_body()).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[actix_web::test]
async fn internal_errors_are_redacted() {
    let value = body_json(&internal_error()).await;
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["error"], json!("internal_error"));
    assert_eq!(value["message"], json!("Internal server error"));
    assert_eq!(value["status"], json!(500));
    assert_eq!(value["traceId"], json!(TRACE_ID));
    assert!(value.get("details").is_none());
}

#[actix_web::test]
async fn client_errors_keep_details() {
    let error = Error::conflict("username is already taken")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"field": "username"}));
    let response = error.error_response();
    assert_eq!(
        response
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some(TRACE_ID)
    );
    let value = body_json(&error).await;
    assert_eq!(value["error"], json!("conflict"));
    assert_eq!(value["message"], json!("username is already taken"));
    assert_eq!(value["version"], json!("1.0"));
    assert_eq!(value["details"]["field"], json!("username"));
}

#[derive(serde::Deserialize)]
struct Payload {
    #[expect(dead_code, reason = "only deserialised")]
    count: u32,
}

#[actix_web::test]
async fn malformed_json_uses_envelope() {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route(
                "/",
                web::post().to(|_: web::Json<Payload>| async { HttpResponse::Ok().finish() }),
            ),
    )
    .await;
    let request = actix_test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"count":"many"}"#)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["error"], json!("invalid_request"));
    assert_eq!(value["details"]["source"], json!("body"));
}
