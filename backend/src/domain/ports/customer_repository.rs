//! Port for customer persistence.

use async_trait::async_trait;

use crate::domain::{Channel, Customer, CustomerFilter, CustomerId, PageRequest};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by customer repository adapters.
    pub enum CustomerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "customer repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "customer repository query failed: {message}",
    }
}

/// Persistence port for customers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert a new customer.
    async fn create(&self, customer: &Customer) -> Result<(), CustomerRepositoryError>;

    /// Fetch a customer by identifier.
    async fn find_by_id(&self, id: &CustomerId)
    -> Result<Option<Customer>, CustomerRepositoryError>;

    /// List customers matching `filter`, ordered by name.
    async fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, CustomerRepositoryError>;

    /// Overwrite the mutable columns of an existing customer.
    async fn update(&self, customer: &Customer) -> Result<(), CustomerRepositoryError>;

    /// Non-archived customers opted in to `channel`, ordered by id.
    async fn list_contactable(
        &self,
        channel: Channel,
        page: &PageRequest,
    ) -> Result<Vec<Customer>, CustomerRepositoryError>;
}
