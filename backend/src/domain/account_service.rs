//! Login and account administration.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::{
    AccountDirectory, AccountRepository, AccountRepositoryError, CustomerRepository, LoginService,
};
use crate::domain::customer_service::require_customer;
use crate::domain::password::{hash_password, verify_password};
use crate::domain::{Account, Error, LoginCredentials, NewAccount, UserId};

fn map_account_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account repository error: {message}"))
        }
        AccountRepositoryError::DuplicateUsername { username } => {
            Error::conflict("username is already taken").with_details(json!({
                "field": "username",
                "value": username,
                "code": "duplicate_username",
            }))
        }
    }
}

/// Account service implementing the login and administration ports.
#[derive(Clone)]
pub struct AccountService<A, C> {
    accounts: Arc<A>,
    customers: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<A, C> AccountService<A, C> {
    /// Create the service over its repositories.
    pub fn new(accounts: Arc<A>, customers: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts,
            customers,
            clock,
        }
    }
}

#[async_trait]
impl<A, C> LoginService for AccountService<A, C>
where
    A: AccountRepository,
    C: CustomerRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Account, Error> {
        let stored = self
            .accounts
            .find_credentials(credentials.username())
            .await
            .map_err(map_account_error)?;
        match stored {
            Some(stored) if verify_password(credentials.password(), &stored.password_hash) => {
                Ok(stored.account)
            }
            _ => {
                tracing::info!(username = credentials.username(), "login rejected");
                Err(Error::unauthorized("invalid credentials"))
            }
        }
    }
}

#[async_trait]
impl<A, C> AccountDirectory for AccountService<A, C>
where
    A: AccountRepository,
    C: CustomerRepository,
{
    async fn create_account(&self, request: NewAccount) -> Result<Account, Error> {
        if let Some(customer_id) = request.customer_id() {
            require_customer(self.customers.as_ref(), customer_id).await?;
        }
        let password_hash = hash_password(request.password())?;
        let account = Account {
            id: UserId::random(),
            username: request.username().to_owned(),
            display_name: request.display_name().to_owned(),
            role: request.role(),
            customer_id: request.customer_id(),
            created_at: self.clock.utc(),
        };
        self.accounts
            .create(&account, &password_hash)
            .await
            .map_err(map_account_error)?;
        tracing::info!(account_id = %account.id, role = %account.role, "account created");
        Ok(account)
    }

    async fn find_account(&self, id: UserId) -> Result<Account, Error> {
        self.accounts
            .find_by_id(&id)
            .await
            .map_err(map_account_error)?
            .ok_or_else(|| Error::not_found(format!("account {id} not found")))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
