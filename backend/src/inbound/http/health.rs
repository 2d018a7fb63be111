//! Liveness and readiness probes.
//!
//! Liveness only reflects the drain flag. Readiness additionally runs every
//! registered [`DependencyProbe`] so the load balancer stops routing traffic
//! when the database goes away.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::domain::ports::DependencyProbe;

/// Process health shared between the server loop and the probe handlers.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    probes: Vec<Arc<dyn DependencyProbe>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            probes: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failing: Vec<FailingDependency>,
}

#[derive(Debug, Serialize)]
struct FailingDependency {
    name: &'static str,
    reason: String,
}

impl HealthState {
    /// Starts not ready and alive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency checked by readiness.
    pub fn with_probe(mut self, probe: Arc<dyn DependencyProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Report ready once startup completes.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators stop routing during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Whether startup has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Whether the process should keep receiving traffic.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn failing_dependencies(&self) -> Vec<FailingDependency> {
        let results = join_all(self.probes.iter().map(|probe| async move {
            probe.check().await.map_err(|err| FailingDependency {
                name: probe.name(),
                reason: err.to_string(),
            })
        }))
        .await;
        results.into_iter().filter_map(Result::err).collect()
    }
}

fn probe_response(status: &'static str, failing: Vec<FailingDependency>) -> HttpResponse {
    let mut response = if failing.is_empty() && status != "unavailable" {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(ProbeReport { status, failing })
}

/// Readiness probe. 200 once startup finished and every dependency answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Starting up or a dependency is unreachable")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    if !state.is_ready() {
        return probe_response("unavailable", Vec::new());
    }
    let failing = state.failing_dependencies().await;
    for dependency in &failing {
        warn!(
            dependency = dependency.name,
            reason = %dependency.reason,
            "readiness probe failed"
        );
    }
    if failing.is_empty() {
        probe_response("ready", failing)
    } else {
        probe_response("degraded", failing)
    }
}

/// Liveness probe. 503 once the server started draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    if state.is_alive() {
        probe_response("alive", Vec::new())
    } else {
        probe_response("unavailable", Vec::new())
    }
}
