//! Request tracing middleware.
//!
//! Every request runs inside a [`TraceId`] scope and a `tracing` span. A
//! well-formed `trace-id` request header is reused so callers (the cron
//! scheduler, the webhook relay) can correlate their own logs; anything else
//! gets a fresh identifier. The identifier is echoed on the response.

use std::future::Future;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware factory. Wrap the whole `App` so errors carry the identifier.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use crm_backend::Trace;
///
/// let _app = App::new().wrap(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

#[doc(hidden)]
pub struct TraceMiddleware<S> {
    service: S,
}

fn inbound_trace_id(req: &ServiceRequest) -> Option<TraceId> {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = inbound_trace_id(&req).unwrap_or_else(TraceId::generate);
        let span = info_span!(
            "http_request",
            method = %req.method(),
            path = %req.path(),
            trace_id = %trace_id,
        );
        let started = Instant::now();
        let fut = TraceId::scope(trace_id, self.service.call(req));
        Box::pin(
            async move {
                let mut res = fut.await?;
                info!(
                    status = res.status().as_u16(),
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "request completed"
                );
                attach_header(&mut res, trace_id);
                Ok(res)
            }
            .instrument(span),
        )
    }
}

fn attach_header<B>(res: &mut ServiceResponse<B>, trace_id: TraceId) {
    match HeaderValue::from_str(&trace_id.to_string()) {
        Ok(value) => {
            res.response_mut()
                .headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
        Err(error) => error!(%error, %trace_id, "failed to encode trace identifier header"),
    }
}

/// Run `fut` under the current trace identifier, or a fresh one. Used by
/// work that starts outside a request, such as startup tasks.
pub fn in_trace_scope<Fut: Future>(fut: Fut) -> impl Future<Output = Fut::Output> {
    TraceId::scope(TraceId::current().unwrap_or_else(TraceId::generate), fut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error as DomainError;
    use crate::inbound::http::ApiResult;
    use actix_web::{App, HttpResponse, test, web};
    use serde_json::Value;

    async fn call_with(
        header: Option<&str>,
        handler: fn() -> LocalBoxFuture<'static, ApiResult<HttpResponse>>,
    ) -> (ServiceResponse, String) {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(move || handler())),
        )
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header((TRACE_ID_HEADER, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let echoed = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("trace id header")
            .to_owned();
        (res, echoed)
    }

    fn echo_scope() -> LocalBoxFuture<'static, ApiResult<HttpResponse>> {
        Box::pin(async {
            let id = TraceId::current().expect("trace id in scope");
            Ok(HttpResponse::Ok().body(id.to_string()))
        })
    }

    fn fail() -> LocalBoxFuture<'static, ApiResult<HttpResponse>> {
        Box::pin(async { Err(DomainError::not_found("customer not found")) })
    }

    #[actix_web::test]
    async fn handler_sees_the_echoed_identifier() {
        let (res, echoed) = call_with(None, echo_scope).await;
        let body = test::read_body(res).await;
        assert_eq!(std::str::from_utf8(&body).expect("utf8"), echoed);
    }

    #[actix_web::test]
    async fn valid_inbound_identifier_is_reused() {
        let inbound = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let (_, echoed) = call_with(Some(inbound), echo_scope).await;
        assert_eq!(echoed, inbound);
    }

    #[actix_web::test]
    async fn malformed_inbound_identifier_is_replaced() {
        let (_, echoed) = call_with(Some("definitely-not-a-uuid"), echo_scope).await;
        assert!(echoed.parse::<TraceId>().is_ok());
    }

    #[actix_web::test]
    async fn error_envelope_carries_identifier() {
        let (res, echoed) = call_with(None, fail).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["traceId"], echoed.as_str());
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn in_trace_scope_provides_an_identifier() {
        let observed = in_trace_scope(async { TraceId::current() }).await;
        assert!(observed.is_some());
    }
}
