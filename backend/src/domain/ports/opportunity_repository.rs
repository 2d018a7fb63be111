//! Port for sales opportunity persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Opportunity, OpportunityFilter, OpportunityId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by opportunity repository adapters.
    pub enum OpportunityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "opportunity repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "opportunity repository query failed: {message}",
    }
}

/// Persistence port for opportunities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// Insert a new opportunity.
    async fn create(&self, opportunity: &Opportunity) -> Result<(), OpportunityRepositoryError>;

    /// Fetch an opportunity by identifier.
    async fn find_by_id(
        &self,
        id: &OpportunityId,
    ) -> Result<Option<Opportunity>, OpportunityRepositoryError>;

    /// List opportunities matching `filter`, highest score first.
    async fn list(
        &self,
        filter: &OpportunityFilter,
    ) -> Result<Vec<Opportunity>, OpportunityRepositoryError>;

    /// Persist the opportunity's current state.
    async fn update(&self, opportunity: &Opportunity) -> Result<(), OpportunityRepositoryError>;

    /// Open or contacted opportunities whose expiry is at or before `now`.
    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Opportunity>, OpportunityRepositoryError>;
}
