//! PostgreSQL-backed `JobRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{JobRepository, JobRepositoryError};
use crate::domain::{CustomerId, Job, JobFilter, JobId, JobStatus};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::models::{JobRow, decode_rows};
use super::pool::DbPool;
use super::schema::jobs;

/// Diesel-backed implementation of the `JobRepository` port.
#[derive(Clone)]
pub struct DieselJobRepository {
    pool: DbPool,
}

impl DieselJobRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(JobRepositoryError);

#[async_trait]
impl JobRepository for DieselJobRepository {
    async fn create(&self, job: &Job) -> Result<(), JobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(jobs::table)
            .values(JobRow::from(job))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>, JobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<JobRow> = jobs::table
            .find(*id.as_uuid())
            .select(JobRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Job::try_from).transpose().map_err(decode_error)
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = jobs::table
            .select(JobRow::as_select())
            .order((jobs::scheduled_start.asc(), jobs::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(jobs::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(jobs::status.eq(status.as_str()));
        }
        if let Some(from) = filter.scheduled_from {
            query = query.filter(jobs::scheduled_start.ge(from));
        }
        if let Some(to) = filter.scheduled_to {
            query = query.filter(jobs::scheduled_start.lt(to));
        }

        let rows: Vec<JobRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn update(&self, job: &Job) -> Result<(), JobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(jobs::table.find(*job.id.as_uuid()))
            .set(JobRow::from(job))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(JobRepositoryError::query("job not found for update"));
        }
        Ok(())
    }

    async fn list_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Job>, JobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<JobRow> = jobs::table
            .filter(jobs::status.eq(JobStatus::Scheduled.as_str()))
            .filter(jobs::reminder_sent_at.is_null())
            .filter(jobs::scheduled_start.ge(from))
            .filter(jobs::scheduled_start.lt(to))
            .select(JobRow::as_select())
            .order(jobs::scheduled_start.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }

    async fn last_completed_at(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<DateTime<Utc>>, JobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        jobs::table
            .filter(jobs::customer_id.eq(*customer_id.as_uuid()))
            .filter(jobs::status.eq(JobStatus::Completed.as_str()))
            .select(diesel::dsl::max(jobs::completed_at))
            .first::<Option<DateTime<Utc>>>(&mut conn)
            .await
            .map_err(diesel_error)
    }
}
