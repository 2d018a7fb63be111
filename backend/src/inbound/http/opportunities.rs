//! Sales pipeline endpoints. Staff only.
//!
//! ```text
//! POST /api/v1/opportunities
//! GET  /api/v1/opportunities?customerId=..&status=open
//! GET  /api/v1/opportunities/{id}
//! PUT  /api/v1/opportunities/{id}/status {"status":"contacted"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CustomerId, OpportunityDraft, OpportunityFilter, OpportunityId, OpportunityKind,
    OpportunityStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};

const OPPORTUNITY_ID: FieldName = FieldName::new("opportunityId");

/// Body for `POST /api/v1/opportunities`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOpportunityRequest {
    /// Customer the opportunity targets.
    #[schema(value_type = String, format = Uuid)]
    pub customer_id: CustomerId,
    /// `rebook`, `upsell`, `referral` or `win_back`.
    #[schema(value_type = String, example = "upsell")]
    pub kind: OpportunityKind,
    /// Expected value in cents.
    #[schema(example = 35000)]
    pub estimated_value_cents: i64,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the opportunity lapses.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateOpportunityRequest> for OpportunityDraft {
    fn from(value: CreateOpportunityRequest) -> Self {
        Self {
            customer_id: value.customer_id,
            kind: value.kind,
            estimated_value_cents: value.estimated_value_cents,
            notes: value.notes,
            expires_at: value.expires_at,
        }
    }
}

/// Body for moving an opportunity through the pipeline.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct OpportunityStatusRequest {
    /// Target status.
    #[schema(value_type = String, example = "contacted")]
    pub status: OpportunityStatus,
}

/// Filters for listing opportunities.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OpportunityQuery {
    /// Restrict to one customer.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    #[param(value_type = Option<String>)]
    pub status: Option<OpportunityStatus>,
}

/// Score and open a new opportunity.
#[utoipa::path(
    post,
    path = "/api/v1/opportunities",
    request_body = CreateOpportunityRequest,
    responses(
        (status = 201, description = "Opportunity opened", body = EnvelopeSchema),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema)
    ),
    tags = ["opportunities"],
    operation_id = "createOpportunity"
)]
#[post("/opportunities")]
pub async fn create_opportunity(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateOpportunityRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let opportunity = state
        .opportunities
        .create_opportunity(payload.into_inner().into())
        .await?;
    Ok(envelope::created("opportunity opened", opportunity))
}

/// List opportunities, highest score first.
#[utoipa::path(
    get,
    path = "/api/v1/opportunities",
    params(OpportunityQuery, PageQuery),
    responses(
        (status = 200, description = "Opportunities, highest score first", body = EnvelopeSchema),
        (status = 403, description = "Staff access required", body = ErrorEnvelopeSchema)
    ),
    tags = ["opportunities"],
    operation_id = "listOpportunities"
)]
#[get("/opportunities")]
pub async fn list_opportunities(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<OpportunityQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let query = query.into_inner();
    let filter = OpportunityFilter {
        customer_id: query.customer_id,
        status: query.status,
        page: page.into_inner().to_page()?,
    };
    let opportunities = state.opportunities.list_opportunities(filter).await?;
    Ok(envelope::ok("opportunities", opportunities))
}

/// Fetch one opportunity.
#[utoipa::path(
    get,
    path = "/api/v1/opportunities/{id}",
    params(("id" = String, Path, description = "Opportunity id")),
    responses(
        (status = 200, description = "Opportunity", body = EnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["opportunities"],
    operation_id = "getOpportunity"
)]
#[get("/opportunities/{id}")]
pub async fn get_opportunity(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: OpportunityId = parse_id(&path, OPPORTUNITY_ID)?;
    let opportunity = state.opportunities.get_opportunity(id).await?;
    Ok(envelope::ok("opportunity", opportunity))
}

/// Move an opportunity to a new status.
#[utoipa::path(
    put,
    path = "/api/v1/opportunities/{id}/status",
    params(("id" = String, Path, description = "Opportunity id")),
    request_body = OpportunityStatusRequest,
    responses(
        (status = 200, description = "Opportunity updated", body = EnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema),
        (status = 409, description = "Transition not allowed", body = ErrorEnvelopeSchema)
    ),
    tags = ["opportunities"],
    operation_id = "transitionOpportunity"
)]
#[put("/opportunities/{id}/status")]
pub async fn transition_opportunity(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<OpportunityStatusRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id: OpportunityId = parse_id(&path, OPPORTUNITY_ID)?;
    let opportunity = state
        .opportunities
        .transition_opportunity(id, payload.into_inner().status)
        .await?;
    Ok(envelope::ok(
        format!("opportunity {}", opportunity.status),
        opportunity,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;
    use crate::domain::ports::MockOpportunityPipeline;
    use crate::domain::test_fixtures::sample_opportunity;
    use crate::inbound::http::test_utils::{
        customer, read_json, session_cookie, staff, test_app, test_state,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(pipeline: MockOpportunityPipeline) -> HttpState {
        HttpState {
            opportunities: Arc::new(pipeline),
            ..test_state()
        }
    }

    #[actix_web::test]
    async fn staff_opens_scored_opportunity() {
        let customer_id = CustomerId::random();
        let mut pipeline = MockOpportunityPipeline::new();
        pipeline
            .expect_create_opportunity()
            .withf(move |draft| {
                draft.customer_id == customer_id && draft.kind == OpportunityKind::Rebook
            })
            .times(1)
            .returning(|draft| Ok(sample_opportunity(draft.customer_id)));
        let app = actix_test::init_service(test_app(state_with(pipeline))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/opportunities")
                .cookie(cookie)
                .set_json(json!({
                    "customerId": customer_id,
                    "kind": "rebook",
                    "estimatedValueCents": 20000,
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["data"]["score"], 42);
        assert_eq!(body["data"]["status"], "open");
    }

    #[actix_web::test]
    async fn customers_cannot_see_pipeline() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let cookie = session_cookie(&app, &customer(CustomerId::random())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/opportunities")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn list_filters_by_status() {
        let mut pipeline = MockOpportunityPipeline::new();
        pipeline
            .expect_list_opportunities()
            .withf(|filter| {
                filter.status == Some(OpportunityStatus::Contacted)
                    && filter.page.limit() == 10
            })
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let app = actix_test::init_service(test_app(state_with(pipeline))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/opportunities?status=contacted&limit=10")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn reopening_converted_is_conflict() {
        let mut pipeline = MockOpportunityPipeline::new();
        pipeline
            .expect_transition_opportunity()
            .returning(|_, _| Err(Error::conflict("cannot move opportunity from converted to open")));
        let app = actix_test::init_service(test_app(state_with(pipeline))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/opportunities/{}/status", OpportunityId::random()))
                .cookie(cookie)
                .set_json(json!({"status": "open"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
