//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountDirectory, ChatInbox, Communications, CustomerDirectory, Invoicing, JobScheduling,
    LoginService, LoyaltyProgram, OpportunityPipeline, PromotionsCatalog, ReviewRequests,
    ScheduledJobs, SupportDesk,
};
use crate::inbound::http::cron::CronSecret;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Credential checks.
    pub login: Arc<dyn LoginService>,
    /// Staff account administration.
    pub accounts: Arc<dyn AccountDirectory>,
    /// Customer records.
    pub customers: Arc<dyn CustomerDirectory>,
    /// Job booking.
    pub jobs: Arc<dyn JobScheduling>,
    /// Invoicing.
    pub invoices: Arc<dyn Invoicing>,
    /// Loyalty accounts.
    pub loyalty: Arc<dyn LoyaltyProgram>,
    /// Sales pipeline.
    pub opportunities: Arc<dyn OpportunityPipeline>,
    /// Review requests.
    pub reviews: Arc<dyn ReviewRequests>,
    /// Outbound messages.
    pub communications: Arc<dyn Communications>,
    /// Promotions.
    pub promotions: Arc<dyn PromotionsCatalog>,
    /// Support tickets.
    pub support: Arc<dyn SupportDesk>,
    /// Chat conversations.
    pub chat: Arc<dyn ChatInbox>,
    /// Background sweeps triggered over cron.
    pub scheduled: Arc<dyn ScheduledJobs>,
    /// `None` disables the cron endpoints.
    pub cron_secret: Option<CronSecret>,
}
