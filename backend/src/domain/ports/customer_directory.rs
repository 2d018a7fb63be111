//! Driving port for customer records.

use async_trait::async_trait;

use crate::domain::{Customer, CustomerDraft, CustomerFilter, CustomerId, CustomerUpdate, Error};

/// Driving port for customer records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Validate and store a new customer.
    async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer, Error>;

    /// Fetch a customer by identifier.
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, Error>;

    /// List customers matching `filter`.
    async fn list_customers(&self, filter: CustomerFilter) -> Result<Vec<Customer>, Error>;

    /// Apply a partial update to a customer.
    async fn update_customer(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, Error>;

    /// Soft-delete; archived customers receive no messages.
    async fn archive_customer(&self, id: CustomerId) -> Result<Customer, Error>;
}
