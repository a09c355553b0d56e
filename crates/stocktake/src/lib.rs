//! Stocktake (inventory check) domain module.
//!
//! A [`StocktakeSession`] is the client's working copy of one stocktake: the
//! zones chosen so far, the expected quantities fetched for them, and what
//! was actually counted. It can be rebuilt from server data alone, so an
//! interrupted stocktake resumes without any client-persisted state.
//!
//! Pure domain logic: no IO.

pub mod line;
pub mod progress;
pub mod report;
pub mod session;

pub use line::{parse_quantity, StocktakeLine};
pub use progress::{CheckStatus, InventoryCheck, InventoryCheckSummary, RecordedLine, SubmitLine};
pub use report::DiscrepancyReport;
pub use session::{StocktakeSession, StocktakeStatus};
