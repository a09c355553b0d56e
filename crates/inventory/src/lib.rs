//! Inventory snapshots as returned by the warehouse API.
//!
//! Items are immutable: quantities are authoritative from the server and are
//! only ever changed inside a stocktake's working copy.

pub mod item;

pub use item::{InventoryItem, ItemKey};
