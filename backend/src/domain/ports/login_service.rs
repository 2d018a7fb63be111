//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to authenticate credentials without knowing the
//! backing store, so HTTP handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Account, Error, LoginCredentials};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated account.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Account, Error>;
}
