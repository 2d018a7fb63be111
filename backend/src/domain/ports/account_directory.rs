//! Driving port for account administration.

use async_trait::async_trait;

use crate::domain::{Account, Error, NewAccount, UserId};

/// Driving port for staff account lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Hash the password and store a new account.
    async fn create_account(&self, account: NewAccount) -> Result<Account, Error>;

    /// Fetch an account by identifier.
    async fn find_account(&self, id: UserId) -> Result<Account, Error>;
}
