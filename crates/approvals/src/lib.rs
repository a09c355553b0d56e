//! Approval workflow for stock-movement tickets.
//!
//! Tickets move `ACTIVE → ALLOWED → COMPLETED` (only write-offs complete).
//! Grouping by source document is a derived view used for presentation and
//! batch approval. Pure domain logic: no IO.

pub mod grouping;
pub mod ledger;
pub mod ticket;

pub use grouping::{group_by_document, groups_with_status, DocumentGroup};
pub use ledger::ApprovalLedger;
pub use ticket::{Document, Ticket, TicketStatus, TicketType};
