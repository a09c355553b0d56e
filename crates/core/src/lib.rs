//! `wareops-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the capacity,
//! stocktake and approval modules (no IO, no HTTP).

pub mod dimensions;
pub mod entity;
pub mod error;
pub mod id;
pub mod period;
pub mod value_object;

pub use dimensions::{Dimensions, MIN_DIMENSION};
pub use entity::{Entity, index_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{
    ContainerId, DocumentId, InventoryId, InventoryItemId, NomenclatureId, TicketId, UserId,
    WarehouseId, ZoneId,
};
pub use period::DateRange;
pub use value_object::ValueObject;
