//! `wareops-client`
//!
//! **Responsibility:** the network boundary and the per-session services of
//! the warehouse console.
//!
//! This crate provides:
//! - `WarehouseApi`, one async method per server operation, with a `reqwest`
//!   implementation (`HttpWarehouseApi`)
//! - `ClientError`, the error taxonomy surfaced to presentation code
//! - `LatestRequests`, latest-only tracking for re-issued list queries
//! - `SessionContext`, created at login and torn down at logout, which hands
//!   out the capacity, stocktake and approval services
//!
//! The server stays the authority: every local edit is optimistic and is
//! rolled back when the server rejects it.

pub mod api;
pub mod approvals;
pub mod capacity;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod http;
pub mod inflight;
pub mod latest;
pub mod stocktake;

pub use api::{BatchApproval, NewContainer, NewZone, WarehouseApi, ZoneUpdate};
pub use approvals::ApprovalService;
pub use capacity::CapacityService;
pub use config::ClientConfig;
pub use context::SessionContext;
pub use envelope::Envelope;
pub use error::{ClientError, ClientResult};
pub use http::HttpWarehouseApi;
pub use latest::LatestRequests;
pub use stocktake::StocktakeService;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::JoinError;

/// Lock a service mutex. State is only touched synchronously, so a panic in
/// another holder cannot leave it half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unwrap a joined task: cancellation maps to `Cancelled`, panics propagate.
pub(crate) fn joined<T>(result: Result<ClientResult<T>, JoinError>) -> ClientResult<T> {
    match result {
        Ok(inner) => inner,
        Err(err) if err.is_cancelled() => Err(ClientError::Cancelled),
        Err(err) => std::panic::resume_unwind(err.into_panic()),
    }
}
