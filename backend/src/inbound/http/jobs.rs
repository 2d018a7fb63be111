//! Job booking endpoints.
//!
//! ```text
//! POST /api/v1/jobs
//! GET  /api/v1/jobs?customerId=..&status=scheduled&from=..&to=..
//! GET  /api/v1/jobs/{id}
//! PUT  /api/v1/jobs/{id}/status {"status":"completed"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, JobDraft, JobFilter, JobId, JobStatus, ServiceType};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};

const JOB_ID: FieldName = FieldName::new("jobId");

/// Body for `POST /api/v1/jobs`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    /// Customer the job is for.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// `standard`, `deep`, `move_out`, `post_construction` or `recurring`.
    #[schema(value_type = String, example = "deep")]
    pub service_type: ServiceType,
    /// Start of the booked slot.
    pub scheduled_start: DateTime<Utc>,
    /// Booked length in minutes.
    #[schema(example = 180)]
    pub duration_minutes: i32,
    /// Agreed price in cents.
    #[schema(example = 24000)]
    pub price_cents: i64,
    /// Cleaner assigned to the job.
    pub assigned_cleaner: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl From<CreateJobRequest> for JobDraft {
    fn from(value: CreateJobRequest) -> Self {
        Self {
            customer_id: value.customer_id,
            service_type: value.service_type,
            scheduled_start: value.scheduled_start,
            duration_minutes: value.duration_minutes,
            price_cents: value.price_cents,
            assigned_cleaner: value.assigned_cleaner,
            notes: value.notes,
        }
    }
}

/// Body for changing a job's status.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct JobStatusRequest {
    /// Target status.
    #[schema(value_type = String, example = "in_progress")]
    pub status: JobStatus,
}

/// Filters for listing jobs.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct JobQuery {
    /// Restrict to one customer; customers may only name themselves.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    #[param(value_type = Option<String>)]
    pub status: Option<JobStatus>,
    /// Earliest scheduled start (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Latest scheduled start (exclusive).
    pub to: Option<DateTime<Utc>>,
}

/// Book a cleaning job.
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job scheduled", body = EnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 404, description = "Customer not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Customer archived", body = ErrorEnvelopeSchema)
    ),
    tags = ["jobs"],
    operation_id = "createJob"
)]
#[post("/jobs")]
pub async fn create_job(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateJobRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let job = state.jobs.create_job(payload.into_inner().into()).await?;
    Ok(envelope::created("job scheduled", job))
}

/// List jobs.
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    params(JobQuery, PageQuery),
    responses(
        (status = 200, description = "Jobs", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["jobs"],
    operation_id = "listJobs"
)]
#[get("/jobs")]
pub async fn list_jobs(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<JobQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let query = query.into_inner();
    let filter = JobFilter {
        customer_id: principal.scope_customer(query.customer_id)?,
        status: query.status,
        scheduled_from: query.from,
        scheduled_to: query.to,
        page: page.into_inner().to_page()?,
    };
    let jobs = state.jobs.list_jobs(filter).await?;
    Ok(envelope::ok("jobs", jobs))
}

/// Fetch one job.
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["jobs"],
    operation_id = "getJob"
)]
#[get("/jobs/{id}")]
pub async fn get_job(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: JobId = parse_id(&path, JOB_ID)?;
    let job = state.jobs.get_job(id).await?;
    principal.require_customer_access(job.customer_id)?;
    Ok(envelope::ok("job", job))
}

/// Move a job through its lifecycle. Completion queues a review request.
#[utoipa::path(
    put,
    path = "/api/v1/jobs/{id}/status",
    params(("id" = String, Path, description = "Job id")),
    request_body = JobStatusRequest,
    responses(
        (status = 200, description = "Job updated", body = EnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Transition not allowed", body = ErrorEnvelopeSchema)
    ),
    tags = ["jobs"],
    operation_id = "updateJobStatus"
)]
#[put("/jobs/{id}/status")]
pub async fn update_job_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<JobStatusRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: JobId = parse_id(&path, JOB_ID)?;
    let job = state
        .jobs
        .update_job_status(id, payload.into_inner().status)
        .await?;
    Ok(envelope::ok(format!("job {}", job.status), job))
}
