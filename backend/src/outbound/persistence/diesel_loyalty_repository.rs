//! PostgreSQL-backed `LoyaltyRepository` implementation using Diesel ORM.
//!
//! Balance changes upsert the account row and append to the ledger inside
//! one transaction. The ledger carries a partial unique index on payment
//! references, so replaying an award for the same invoice fails instead of
//! double counting.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{LoyaltyRepository, LoyaltyRepositoryError};
use crate::domain::{CustomerId, LedgerEntry, LoyaltyAccount, PageRequest};

use super::diesel_helpers::{page_window, repository_error_mapping};
use super::error_mapping::unique_violation;
use super::models::{LedgerEntryRow, LoyaltyAccountRow, decode_rows};
use super::pool::DbPool;
use super::schema::{loyalty_accounts, loyalty_ledger};

const PAYMENT_REFERENCE_CONSTRAINT: &str = "loyalty_ledger_payment_key";

/// Diesel-backed implementation of the `LoyaltyRepository` port.
#[derive(Clone)]
pub struct DieselLoyaltyRepository {
    pool: DbPool,
}

impl DieselLoyaltyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(LoyaltyRepositoryError);

#[async_trait]
impl LoyaltyRepository for DieselLoyaltyRepository {
    async fn find_account(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<LoyaltyAccount>, LoyaltyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<LoyaltyAccountRow> = loyalty_accounts::table
            .find(*customer_id.as_uuid())
            .select(LoyaltyAccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(LoyaltyAccount::try_from)
            .transpose()
            .map_err(decode_error)
    }

    async fn record(
        &self,
        account: &LoyaltyAccount,
        entry: &LedgerEntry,
    ) -> Result<(), LoyaltyRepositoryError> {
        let account_row = LoyaltyAccountRow::from(account);
        let entry_row = LedgerEntryRow::from(entry);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(loyalty_ledger::table)
                    .values(&entry_row)
                    .execute(conn)
                    .await?;

                diesel::insert_into(loyalty_accounts::table)
                    .values(&account_row)
                    .on_conflict(loyalty_accounts::customer_id)
                    .do_update()
                    .set((
                        loyalty_accounts::points_balance
                            .eq(excluded(loyalty_accounts::points_balance)),
                        loyalty_accounts::lifetime_points
                            .eq(excluded(loyalty_accounts::lifetime_points)),
                        loyalty_accounts::tier.eq(excluded(loyalty_accounts::tier)),
                        loyalty_accounts::updated_at.eq(excluded(loyalty_accounts::updated_at)),
                    ))
                    .execute(conn)
                    .await?;

                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| match unique_violation(&error) {
            Some(PAYMENT_REFERENCE_CONSTRAINT) => {
                LoyaltyRepositoryError::query("payment already awarded")
            }
            _ => diesel_error(error),
        })
    }

    async fn list_ledger(
        &self,
        customer_id: &CustomerId,
        page: &PageRequest,
    ) -> Result<Vec<LedgerEntry>, LoyaltyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(page);

        let rows: Vec<LedgerEntryRow> = loyalty_ledger::table
            .filter(loyalty_ledger::customer_id.eq(*customer_id.as_uuid()))
            .select(LedgerEntryRow::as_select())
            .order((loyalty_ledger::created_at.desc(), loyalty_ledger::id.asc()))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        decode_rows(rows).map_err(decode_error)
    }
}
