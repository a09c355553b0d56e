//! Strongly-typed identifiers used across the domain.
//!
//! The warehouse API assigns integer identifiers; each entity gets its own
//! newtype so a zone id can never be passed where a container id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! int_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

int_id!(
    /// Identifier of a warehouse.
    WarehouseId,
    "WarehouseId"
);
int_id!(
    /// Identifier of a zone (cabinet or sub-zone).
    ZoneId,
    "ZoneId"
);
int_id!(
    /// Identifier of a container attached under a zone.
    ContainerId,
    "ContainerId"
);
int_id!(
    /// Identifier of a stocktake (the server calls it an inventory check).
    InventoryId,
    "InventoryId"
);
int_id!(TicketId, "TicketId");
int_id!(
    /// Identifier of the source document a ticket was raised from.
    DocumentId,
    "DocumentId"
);
int_id!(NomenclatureId, "NomenclatureId");
int_id!(InventoryItemId, "InventoryItemId");
int_id!(
    /// Identifier of a console user (creator, approver).
    UserId,
    "UserId"
);
