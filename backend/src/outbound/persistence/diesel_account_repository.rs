//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, StoredCredentials, UserId};

use super::diesel_helpers::repository_error_mapping;
use super::error_mapping::unique_violation;
use super::models::AccountRow;
use super::pool::DbPool;
use super::schema::accounts;

const USERNAME_CONSTRAINT: &str = "accounts_username_key";

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(AccountRepositoryError);

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create(
        &self,
        account: &Account,
        password_hash: &str,
    ) -> Result<(), AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = AccountRow::new(account, password_hash);

        diesel::insert_into(accounts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|error| match unique_violation(&error) {
                Some(USERNAME_CONSTRAINT) => {
                    AccountRepositoryError::duplicate_username(account.username.as_str())
                }
                _ => diesel_error(error),
            })?;
        Ok(())
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .filter(accounts::username.eq(username))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(StoredCredentials::try_from)
            .transpose()
            .map_err(decode_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .find(*id.as_uuid())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(|row| StoredCredentials::try_from(row).map(|stored| stored.account))
            .transpose()
            .map_err(decode_error)
    }
}
