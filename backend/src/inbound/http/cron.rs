//! Scheduled-job trigger endpoints.
//!
//! ```text
//! POST /api/v1/cron/job-reminders?limit=100
//! Authorization: Bearer <cron secret>
//! ```
//!
//! An external scheduler calls these; each run is batch-limited and safe to
//! repeat.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::{CronJob, Error, UnknownVariant, batch_limit};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error};

/// SHA-256 digest of the shared cron secret.
#[derive(Clone)]
pub struct CronSecret([u8; 32]);

impl CronSecret {
    /// Hash `secret` for later comparison.
    pub fn new(secret: &str) -> Self {
        Self(Sha256::digest(secret.as_bytes()).into())
    }

    /// Compare a presented token by digest.
    pub fn matches(&self, presented: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        digest
            .iter()
            .zip(self.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Hex fingerprint suitable for logs.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl std::fmt::Debug for CronSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CronSecret").field(&self.fingerprint()).finish()
    }
}

fn bearer_token(req: &HttpRequest) -> Option<Zeroizing<String>> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| Zeroizing::new(token.to_owned()))
}

fn authorise(state: &HttpState, req: &HttpRequest) -> Result<(), Error> {
    let secret = state
        .cron_secret
        .as_ref()
        .ok_or_else(|| Error::service_unavailable("scheduled jobs are not configured"))?;
    match bearer_token(req) {
        Some(token) if secret.matches(&token) => Ok(()),
        _ => Err(Error::unauthorized("invalid cron credentials")),
    }
}

/// Batch size for a cron run.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CronQuery {
    /// Maximum rows processed in this run (default 100).
    pub limit: Option<u32>,
}

/// Run one scheduled job.
#[utoipa::path(
    post,
    path = "/api/v1/cron/{job}",
    params(
        ("job" = String, Path, description = "Job name, e.g. `job-reminders`"),
        CronQuery
    ),
    responses(
        (status = 200, description = "Run summary"),
        (status = 400, description = "Unknown job", body = ErrorEnvelopeSchema),
        (status = 401, description = "Missing or invalid cron secret", body = ErrorEnvelopeSchema),
        (status = 503, description = "Cron secret not configured", body = ErrorEnvelopeSchema)
    ),
    tags = ["cron"],
    operation_id = "runCronJob",
    security(("CronBearer" = []))
)]
#[post("/cron/{job}")]
pub async fn run_cron_job(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<CronQuery>,
) -> ApiResult<HttpResponse> {
    authorise(&state, &req)?;
    let name = path.into_inner();
    let job: CronJob = name
        .parse()
        .map_err(|err: UnknownVariant| invalid_value_error(FieldName::new("job"), err.to_string()))?;
    let run = state.scheduled.run(job, batch_limit(query.limit)).await?;
    tracing::info!(job = %run.job, processed = run.processed, "cron job finished");
    Ok(envelope::ok(format!("{job} completed"), run))
}
