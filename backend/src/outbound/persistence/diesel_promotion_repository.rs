//! PostgreSQL-backed `PromotionRepository` implementation using Diesel ORM.
//!
//! Redemptions lock the promotion row, check the redemption cap, insert the
//! per-customer redemption and bump the counter in a single transaction so
//! concurrent checkouts cannot overspend a capped code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{PromotionRepository, PromotionRepositoryError};
use crate::domain::{
    CustomerId, PageRequest, Promotion, PromotionCode, PromotionId, PromotionRedemption,
};

use super::diesel_helpers::{batch_limit, page_window, repository_error_mapping};
use super::error_mapping::unique_violation;
use super::models::{NewRedemptionRow, PromotionRow, decode_rows};
use super::pool::DbPool;
use super::schema::{promotion_redemptions, promotions};

const CODE_CONSTRAINT: &str = "promotions_code_key";

/// Diesel-backed implementation of the `PromotionRepository` port.
#[derive(Clone)]
pub struct DieselPromotionRepository {
    pool: DbPool,
}

impl DieselPromotionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(PromotionRepositoryError);

/// Outcome of the redemption transaction before mapping to the port error.
#[derive(Debug)]
enum RedemptionFailure {
    Exhausted,
    AlreadyRedeemed,
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for RedemptionFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

fn is_exhausted(redemption_count: i32, max_redemptions: Option<i32>) -> bool {
    max_redemptions.is_some_and(|max| redemption_count >= max)
}

#[async_trait]
impl PromotionRepository for DieselPromotionRepository {
    async fn create(&self, promotion: &Promotion) -> Result<(), PromotionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(promotions::table)
            .values(PromotionRow::from(promotion))
            .execute(&mut conn)
            .await
            .map_err(|error| match unique_violation(&error) {
                Some(CODE_CONSTRAINT) => {
                    PromotionRepositoryError::duplicate_code(promotion.code.as_ref())
                }
                _ => diesel_error(error),
            })?;
        Ok(())
    }

    async fn find_by_code(
        &self,
        code: &PromotionCode,
    ) -> Result<Option<Promotion>, PromotionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<PromotionRow> = promotions::table
            .filter(promotions::code.eq(code.as_ref()))
            .select(PromotionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Promotion::try_from).transpose().map_err(decode_error)
    }

    async fn list(
        &self,
        active_only: bool,
        page: &PageRequest,
    ) -> Result<Vec<Promotion>, PromotionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(page);

        let mut query = promotions::table
            .select(PromotionRow::as_select())
            .order((promotions::starts_at.desc(), promotions::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if active_only {
            query = query.filter(promotions::active.eq(true));
        }

        let rows: Vec<PromotionRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn deactivate(&self, id: &PromotionId) -> Result<bool, PromotionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            promotions::table
                .find(*id.as_uuid())
                .filter(promotions::active.eq(true)),
        )
        .set(promotions::active.eq(false))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn has_redeemed(
        &self,
        promotion_id: &PromotionId,
        customer_id: &CustomerId,
    ) -> Result<bool, PromotionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::select(diesel::dsl::exists(
            promotion_redemptions::table
                .filter(promotion_redemptions::promotion_id.eq(*promotion_id.as_uuid()))
                .filter(promotion_redemptions::customer_id.eq(*customer_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }

    async fn record_redemption(
        &self,
        promotion: &Promotion,
        redemption: &PromotionRedemption,
    ) -> Result<(), PromotionRepositoryError> {
        let promotion_id = *promotion.id.as_uuid();
        let row = NewRedemptionRow::from(redemption);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let (count, max): (i32, Option<i32>) = promotions::table
                        .find(promotion_id)
                        .select((promotions::redemption_count, promotions::max_redemptions))
                        .for_update()
                        .first(conn)
                        .await?;
                    if is_exhausted(count, max) {
                        return Err(RedemptionFailure::Exhausted);
                    }

                    let inserted = diesel::insert_into(promotion_redemptions::table)
                        .values(&row)
                        .on_conflict((
                            promotion_redemptions::promotion_id,
                            promotion_redemptions::customer_id,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        return Err(RedemptionFailure::AlreadyRedeemed);
                    }

                    diesel::update(promotions::table.find(promotion_id))
                        .set(promotions::redemption_count.eq(promotions::redemption_count + 1))
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        outcome.map_err(|failure| match failure {
            RedemptionFailure::Exhausted => {
                PromotionRepositoryError::exhausted(promotion.code.as_ref())
            }
            RedemptionFailure::AlreadyRedeemed => {
                PromotionRepositoryError::already_redeemed(redemption.customer_id)
            }
            RedemptionFailure::Database(error) => diesel_error(error),
        })
    }

    async fn list_ended(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Promotion>, PromotionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<PromotionRow> = promotions::table
            .filter(promotions::active.eq(true))
            .filter(promotions::ends_at.le(now))
            .select(PromotionRow::as_select())
            .order(promotions::ends_at.asc())
            .limit(batch_limit(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, None, false)]
    #[case(4, Some(5), false)]
    #[case(5, Some(5), true)]
    #[case(7, Some(5), true)]
    fn redemption_cap(#[case] count: i32, #[case] max: Option<i32>, #[case] exhausted: bool) {
        assert_eq!(is_exhausted(count, max), exhausted);
    }
}
