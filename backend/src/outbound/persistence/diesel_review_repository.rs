//! PostgreSQL-backed `ReviewRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ReviewRepository, ReviewRepositoryError};
use crate::domain::{ReviewFilter, ReviewRequest, ReviewRequestId, ReviewStatus};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::error_mapping::unique_violation;
use super::models::{ReviewRequestRow, decode_rows};
use super::pool::DbPool;
use super::schema::review_requests;

const JOB_CONSTRAINT: &str = "review_requests_job_id_key";

/// Diesel-backed implementation of the `ReviewRepository` port.
#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(ReviewRepositoryError);

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn create(&self, review: &ReviewRequest) -> Result<(), ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(review_requests::table)
            .values(ReviewRequestRow::from(review))
            .execute(&mut conn)
            .await
            .map_err(|error| match unique_violation(&error) {
                Some(JOB_CONSTRAINT) => ReviewRepositoryError::duplicate_job(review.job_id),
                _ => diesel_error(error),
            })?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ReviewRequestId,
    ) -> Result<Option<ReviewRequest>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<ReviewRequestRow> = review_requests::table
            .find(*id.as_uuid())
            .select(ReviewRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(ReviewRequest::try_from)
            .transpose()
            .map_err(decode_error)
    }

    async fn list(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRequest>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = review_requests::table
            .select(ReviewRequestRow::as_select())
            .order((review_requests::created_at.desc(), review_requests::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(review_requests::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(review_requests::status.eq(status.as_str()));
        }

        let rows: Vec<ReviewRequestRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn update(&self, review: &ReviewRequest) -> Result<(), ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(review_requests::table.find(*review.id.as_uuid()))
            .set(ReviewRequestRow::from(review))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(ReviewRepositoryError::query("review request not found for update"));
        }
        Ok(())
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ReviewRequest>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let open = [
            ReviewStatus::Pending.as_str(),
            ReviewStatus::Sent.as_str(),
            ReviewStatus::Reminded.as_str(),
        ];

        let rows: Vec<ReviewRequestRow> = review_requests::table
            .filter(review_requests::status.eq_any(open))
            .filter(review_requests::next_action_at.le(now))
            .select(ReviewRequestRow::as_select())
            .order(review_requests::next_action_at.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
