//! Review request endpoints.
//!
//! Requests are created when a job completes and advanced by the
//! `review-requests` cron job; customers only read and answer them.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, ReviewFilter, ReviewRequestId, ReviewStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{EnvelopeSchema, ErrorEnvelopeSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};

const REVIEW_ID: FieldName = FieldName::new("reviewId");

/// Body for submitting a review.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitReviewRequest {
    /// Star rating from 1 to 5.
    #[schema(example = 5)]
    pub rating: i16,
    /// Optional written feedback.
    pub comment: Option<String>,
}

/// Filters for listing review requests.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    /// Restrict to one customer; customers may only name themselves.
    #[param(value_type = Option<String>, format = Uuid)]
    pub customer_id: Option<CustomerId>,
    /// Restrict to one status.
    #[param(value_type = Option<String>)]
    pub status: Option<ReviewStatus>,
}

/// List review requests.
#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    params(ReviewQuery, PageQuery),
    responses(
        (status = 200, description = "Review requests", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema)
    ),
    tags = ["reviews"],
    operation_id = "listReviews"
)]
#[get("/reviews")]
pub async fn list_reviews(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ReviewQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let query = query.into_inner();
    let filter = ReviewFilter {
        customer_id: principal.scope_customer(query.customer_id)?,
        status: query.status,
        page: page.into_inner().to_page()?,
    };
    let reviews = state.reviews.list_reviews(filter).await?;
    Ok(envelope::ok("review requests", reviews))
}

/// Fetch one review request.
#[utoipa::path(
    get,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review request id")),
    responses(
        (status = 200, description = "Review request", body = EnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["reviews"],
    operation_id = "getReview"
)]
#[get("/reviews/{id}")]
pub async fn get_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: ReviewRequestId = parse_id(&path, REVIEW_ID)?;
    let review = state.reviews.get_review(id).await?;
    principal.require_customer_access(review.customer_id)?;
    Ok(envelope::ok("review request", review))
}

/// Record the customer's rating. Four stars or more invites a public review.
#[utoipa::path(
    post,
    path = "/api/v1/reviews/{id}/submit",
    params(("id" = String, Path, description = "Review request id")),
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = EnvelopeSchema),
        (status = 400, description = "Rating out of range", body = ErrorEnvelopeSchema),
        (status = 403, description = "Forbidden", body = ErrorEnvelopeSchema),
        (status = 409, description = "Review already closed", body = ErrorEnvelopeSchema)
    ),
    tags = ["reviews"],
    operation_id = "submitReview"
)]
#[post("/reviews/{id}/submit")]
pub async fn submit_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SubmitReviewRequest>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let id: ReviewRequestId = parse_id(&path, REVIEW_ID)?;
    let review = state.reviews.get_review(id).await?;
    principal.require_customer_access(review.customer_id)?;
    let SubmitReviewRequest { rating, comment } = payload.into_inner();
    let submission = state.reviews.submit_review(id, rating, comment).await?;
    Ok(envelope::ok("thank you for your feedback", submission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockReviewRequests;
    use crate::domain::test_fixtures::sample_review;
    use crate::domain::{Error, ReviewSubmission};
    use crate::inbound::http::test_utils::{
        customer, read_json, session_cookie, staff, test_app, test_state,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(reviews: MockReviewRequests) -> HttpState {
        HttpState {
            reviews: Arc::new(reviews),
            ..test_state()
        }
    }

    #[rstest]
    #[case(5, true)]
    #[case(3, false)]
    #[actix_web::test]
    async fn submission_reports_public_invite(#[case] rating: i16, #[case] invite: bool) {
        let own = CustomerId::random();
        let mut reviews = MockReviewRequests::new();
        reviews
            .expect_get_review()
            .returning(move |_| Ok(sample_review(own)));
        reviews
            .expect_submit_review()
            .withf(move |_, r, comment| *r == rating && comment.as_deref() == Some("Spotless"))
            .times(1)
            .returning(move |_, r, comment| {
                let mut review = sample_review(own);
                review.status = ReviewStatus::Completed;
                review.rating = Some(r);
                review.comment = comment;
                Ok(ReviewSubmission {
                    review,
                    invite_public_review: r >= 4,
                })
            });
        let app = actix_test::init_service(test_app(state_with(reviews))).await;
        let cookie = session_cookie(&app, &customer(own)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/reviews/{}/submit", ReviewRequestId::random()))
                .cookie(cookie)
                .set_json(json!({"rating": rating, "comment": "Spotless"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["invitePublicReview"], invite);
        assert_eq!(body["data"]["review"]["status"], "completed");
    }

    #[actix_web::test]
    async fn cannot_answer_someone_elses_review() {
        let mut reviews = MockReviewRequests::new();
        reviews
            .expect_get_review()
            .returning(|_| Ok(sample_review(CustomerId::random())));
        reviews.expect_submit_review().never();
        let app = actix_test::init_service(test_app(state_with(reviews))).await;
        let cookie = session_cookie(&app, &customer(CustomerId::random())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/reviews/{}/submit", ReviewRequestId::random()))
                .cookie(cookie)
                .set_json(json!({"rating": 5}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn closed_review_is_conflict() {
        let own = CustomerId::random();
        let mut reviews = MockReviewRequests::new();
        reviews
            .expect_get_review()
            .returning(move |_| Ok(sample_review(own)));
        reviews
            .expect_submit_review()
            .returning(|_, _, _| Err(Error::conflict("review request is no longer open")));
        let app = actix_test::init_service(test_app(state_with(reviews))).await;
        let cookie = session_cookie(&app, &customer(own)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/reviews/{}/submit", ReviewRequestId::random()))
                .cookie(cookie)
                .set_json(json!({"rating": 4}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn staff_lists_by_status() {
        let mut reviews = MockReviewRequests::new();
        reviews
            .expect_list_reviews()
            .withf(|filter| filter.customer_id.is_none() && filter.status == Some(ReviewStatus::Sent))
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let app = actix_test::init_service(test_app(state_with(reviews))).await;
        let cookie = session_cookie(&app, &staff()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/reviews?status=sent")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
