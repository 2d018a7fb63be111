//! Envelope and trace-id guarantees observed by a real HTTP client.
//!
//! Handlers are served over a loopback socket so the assertions cover the
//! bytes a client actually receives, including the `trace-id` header.

use std::net::TcpListener;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use crm_backend::Trace;
use crm_backend::domain::{Error, TRACE_ID_HEADER, TraceId};
use crm_backend::inbound::http::{ApiResult, envelope};
use reqwest::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};

async fn found() -> ApiResult<HttpResponse> {
    Ok(envelope::ok("customer", json!({ "id": "c-1", "name": "Ada" })))
}

async fn missing() -> ApiResult<HttpResponse> {
    Err(Error::not_found("customer not found"))
}

async fn exploded() -> ApiResult<HttpResponse> {
    Err(Error::internal("connection string postgres://secret@db leaked"))
}

struct Running {
    base: String,
    handle: ServerHandle,
}

fn spawn_server() -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().expect("local addr").port();
    let server = HttpServer::new(|| {
        App::new()
            .wrap(Trace)
            .route("/found", web::get().to(found))
            .route("/missing", web::get().to(missing))
            .route("/exploded", web::get().to(exploded))
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Running {
        base: format!("http://127.0.0.1:{port}"),
        handle,
    }
}

async fn get(running: &Running, path: &str, trace: Option<&str>) -> (StatusCode, String, Value) {
    let mut request = reqwest::Client::new().get(format!("{}{path}", running.base));
    if let Some(trace) = trace {
        request = request.header(TRACE_ID_HEADER, trace);
    }
    let response = request.send().await.expect("request succeeds");
    let status = response.status();
    let trace_id = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .expect("trace-id header")
        .to_owned();
    let body = response.json().await.expect("json body");
    (status, trace_id, body)
}

#[actix_web::test]
async fn success_envelope_shape() {
    let running = spawn_server();
    let (status, trace_id, body) = get(&running, "/found", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(trace_id.parse::<TraceId>().is_ok());
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 200);
    assert_eq!(body["version"], "1.0");
    assert_eq!(body["message"], "customer");
    assert_eq!(body["data"]["name"], "Ada");
    running.handle.stop(true).await;
}

#[rstest]
#[case("/missing", StatusCode::NOT_FOUND, "not_found", "customer not found")]
#[case("/exploded", StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error")]
#[actix_web::test]
async fn error_envelope_shape(
    #[case] path: &str,
    #[case] expected_status: StatusCode,
    #[case] code: &str,
    #[case] message: &str,
) {
    let running = spawn_server();
    let (status, trace_id, body) = get(&running, path, None).await;

    assert_eq!(status, expected_status);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], code);
    assert_eq!(body["message"], message);
    assert_eq!(body["status"], expected_status.as_u16());
    assert_eq!(body["traceId"], trace_id.as_str());
    assert!(!body.to_string().contains("secret@db"));
    running.handle.stop(true).await;
}

#[actix_web::test]
async fn caller_trace_id_is_kept() {
    let running = spawn_server();
    let caller = "0f8fad5b-d9cb-469f-a165-70867728950e";
    let (_, trace_id, body) = get(&running, "/missing", Some(caller)).await;

    assert_eq!(trace_id, caller);
    assert_eq!(body["traceId"], caller);
    running.handle.stop(true).await;
}
