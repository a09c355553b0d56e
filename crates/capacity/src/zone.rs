//! Zone and container records as the warehouse API returns them.

use serde::{Deserialize, Serialize};

use wareops_core::{ContainerId, Dimensions, Entity, ZoneId};

/// A zone: a cabinet when `parent_id` is `None`, otherwise a sub-zone (or,
/// one level deeper, a container slot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    #[serde(default)]
    pub parent_id: Option<ZoneId>,
    pub name: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub capacity: f64,
    #[serde(default)]
    pub can_store_items: bool,
}

impl Zone {
    pub fn dimensions(&self) -> Option<Dimensions> {
        Dimensions::from_optional(self.width, self.height, self.length)
    }

    pub fn is_cabinet(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Entity for Zone {
    type Id = ZoneId;

    fn id(&self) -> ZoneId {
        self.id
    }
}

/// A bounded storage unit attached under a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: ContainerId,
    pub warehouse_zone_id: ZoneId,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub capacity: f64,
}

impl Container {
    pub fn dimensions(&self) -> Option<Dimensions> {
        Dimensions::from_optional(self.width, self.height, self.length)
    }
}

impl Entity for Container {
    type Id = ContainerId;

    fn id(&self) -> ContainerId {
        self.id
    }
}
