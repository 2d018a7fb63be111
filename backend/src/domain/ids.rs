//! Strongly typed identifiers for CRM records.
//!
//! Every aggregate gets its own UUID newtype so a job id can never be passed
//! where a customer id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of a login account (staff, admin or portal customer).
    UserId
);
entity_id!(
    /// Identifier of a customer record.
    CustomerId
);
entity_id!(
    /// Identifier of a scheduled cleaning job.
    JobId
);
entity_id!(
    /// Identifier of an invoice.
    InvoiceId
);
entity_id!(
    /// Identifier of a loyalty ledger entry.
    LedgerEntryId
);
entity_id!(
    /// Identifier of a sales opportunity.
    OpportunityId
);
entity_id!(
    /// Identifier of a review request.
    ReviewRequestId
);
entity_id!(
    /// Identifier of a logged outbound message.
    MessageId
);
entity_id!(
    /// Identifier of a promotion.
    PromotionId
);
entity_id!(
    /// Identifier of a support ticket.
    TicketId
);
entity_id!(
    /// Identifier of a chat conversation.
    ConversationId
);
entity_id!(
    /// Identifier of a single chat message.
    ChatMessageId
);
