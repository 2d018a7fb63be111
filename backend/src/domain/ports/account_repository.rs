//! Port for account persistence.

use async_trait::async_trait;

use crate::domain::{Account, StoredCredentials, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// Username is already taken.
        DuplicateUsername { username: String } => "username {username} is already taken",
    }
}

/// Persistence port for staff accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account with its password hash.
    async fn create(
        &self,
        account: &Account,
        password_hash: &str,
    ) -> Result<(), AccountRepositoryError>;

    /// Fetch an account and its hash by normalised username.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, AccountRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AccountRepositoryError>;
}
