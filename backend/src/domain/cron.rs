//! Names and results of scheduled maintenance jobs.

use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

/// Batch size used when a run does not ask for one.
pub const DEFAULT_CRON_BATCH: u32 = 100;
/// Largest batch a single run may process.
pub const MAX_CRON_BATCH: u32 = 1000;

text_enum! {
    /// Scheduled job, addressed by its kebab-case name.
    pub enum CronJob {
        /// Reminders for jobs starting soon.
        JobReminders => "job-reminders",
        /// Flag sent invoices past their due date.
        InvoicesOverdue => "invoices-overdue",
        /// Expire opportunities past `expires_at`.
        OpportunitiesExpire => "opportunities-expire",
        /// Send, remind or expire review requests.
        ReviewRequests => "review-requests",
        /// Deliver deferred messages that are due.
        MessagesDispatch => "messages-dispatch",
        /// Deactivate promotions whose window closed.
        PromotionsExpire => "promotions-expire",
        /// Escalate tickets past their response SLA.
        TicketsEscalate => "tickets-escalate",
    }
}

/// Outcome of one scheduled-job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronRun {
    /// Job that ran.
    pub job: CronJob,
    /// Rows changed by the run.
    pub processed: u32,
}

/// Clamp a requested batch size into `1..=MAX_CRON_BATCH`.
pub fn batch_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_CRON_BATCH)
        .clamp(1, MAX_CRON_BATCH)
}
