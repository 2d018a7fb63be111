//! PostgreSQL-backed `OpportunityRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{OpportunityRepository, OpportunityRepositoryError};
use crate::domain::{Opportunity, OpportunityFilter, OpportunityId, OpportunityStatus};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::models::{OpportunityRow, decode_rows};
use super::pool::DbPool;
use super::schema::opportunities;

/// Diesel-backed implementation of the `OpportunityRepository` port.
#[derive(Clone)]
pub struct DieselOpportunityRepository {
    pool: DbPool,
}

impl DieselOpportunityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(OpportunityRepositoryError);

#[async_trait]
impl OpportunityRepository for DieselOpportunityRepository {
    async fn create(&self, opportunity: &Opportunity) -> Result<(), OpportunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(opportunities::table)
            .values(OpportunityRow::from(opportunity))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &OpportunityId,
    ) -> Result<Option<Opportunity>, OpportunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<OpportunityRow> = opportunities::table
            .find(*id.as_uuid())
            .select(OpportunityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Opportunity::try_from)
            .transpose()
            .map_err(decode_error)
    }

    async fn list(
        &self,
        filter: &OpportunityFilter,
    ) -> Result<Vec<Opportunity>, OpportunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        // Highest score first so the pipeline reads as a call list.
        let mut query = opportunities::table
            .select(OpportunityRow::as_select())
            .order((
                opportunities::score.desc(),
                opportunities::created_at.asc(),
                opportunities::id.asc(),
            ))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(opportunities::customer_id.eq(*customer_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(opportunities::status.eq(status.as_str()));
        }

        let rows: Vec<OpportunityRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn update(&self, opportunity: &Opportunity) -> Result<(), OpportunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(opportunities::table.find(*opportunity.id.as_uuid()))
            .set(OpportunityRow::from(opportunity))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(OpportunityRepositoryError::query(
                "opportunity not found for update",
            ));
        }
        Ok(())
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Opportunity>, OpportunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let live = [
            OpportunityStatus::Open.as_str(),
            OpportunityStatus::Contacted.as_str(),
        ];

        let rows: Vec<OpportunityRow> = opportunities::table
            .filter(opportunities::status.eq_any(live))
            .filter(opportunities::expires_at.le(now))
            .select(OpportunityRow::as_select())
            .order(opportunities::expires_at.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
