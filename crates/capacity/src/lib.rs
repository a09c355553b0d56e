//! Spatial capacity hierarchy of one warehouse.
//!
//! Zones arrive as a flat parent-pointer list and containers as per-zone
//! lists. [`CapacityTree`] normalises both into one arena-backed forest (one
//! root per cabinet) and derives occupied/free volume and fill percentage at
//! every level. Pure domain logic: no IO.

pub mod metrics;
pub mod tree;
pub mod zone;

pub use metrics::{CapacityMetrics, WarehouseCapacity};
pub use tree::{CapacityNode, CapacityTree, NewNode, NodeId, NodeKind};
pub use zone::{Container, Zone};
