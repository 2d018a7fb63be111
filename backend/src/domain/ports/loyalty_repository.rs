//! Port for loyalty accounts and the point ledger.

use async_trait::async_trait;

use crate::domain::{CustomerId, LedgerEntry, LoyaltyAccount, PageRequest};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by loyalty repository adapters.
    pub enum LoyaltyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "loyalty repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "loyalty repository query failed: {message}",
    }
}

/// Persistence port for loyalty accounts and their ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoyaltyRepository: Send + Sync {
    /// Fetch a customer's account, if one exists.
    async fn find_account(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<LoyaltyAccount>, LoyaltyRepositoryError>;

    /// Upsert the account and append `entry` in one transaction.
    async fn record(
        &self,
        account: &LoyaltyAccount,
        entry: &LedgerEntry,
    ) -> Result<(), LoyaltyRepositoryError>;

    /// Ledger entries for a customer, newest first.
    async fn list_ledger(
        &self,
        customer_id: &CustomerId,
        page: &PageRequest,
    ) -> Result<Vec<LedgerEntry>, LoyaltyRepositoryError>;
}
