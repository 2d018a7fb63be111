//! Driving port for the sales pipeline.

use async_trait::async_trait;

use crate::domain::{
    Error, Opportunity, OpportunityDraft, OpportunityFilter, OpportunityId, OpportunityStatus,
};

/// Driving port for the sales pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityPipeline: Send + Sync {
    /// Score and store a new opportunity.
    async fn create_opportunity(&self, draft: OpportunityDraft) -> Result<Opportunity, Error>;

    /// Fetch an opportunity by identifier.
    async fn get_opportunity(&self, id: OpportunityId) -> Result<Opportunity, Error>;

    /// List opportunities matching `filter`, highest score first.
    async fn list_opportunities(&self, filter: OpportunityFilter)
    -> Result<Vec<Opportunity>, Error>;

    /// Move an opportunity to `status`.
    async fn transition_opportunity(
        &self,
        id: OpportunityId,
        status: OpportunityStatus,
    ) -> Result<Opportunity, Error>;

    /// Expire open opportunities whose expiry has passed.
    async fn expire_due(&self, limit: u32) -> Result<u32, Error>;
}
