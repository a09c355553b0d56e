use serde::{Deserialize, Serialize};

use wareops_core::{ContainerId, NomenclatureId, ZoneId};

/// Stock of one nomenclature in one zone (and optionally one container).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub nomenclature_id: NomenclatureId,
    #[serde(default)]
    pub nomenclature_name: String,
    #[serde(default)]
    pub code: String,
    pub quantity: f64,
    #[serde(default)]
    pub measurement_unit: String,
    pub warehouse_zone_id: ZoneId,
    #[serde(default)]
    pub warehouse_container_id: Option<ContainerId>,
}

impl InventoryItem {
    pub fn key(&self) -> ItemKey {
        ItemKey {
            nomenclature_id: self.nomenclature_id,
            container_id: self.warehouse_container_id,
            zone_id: self.warehouse_zone_id,
        }
    }

    /// Case-insensitive match against name or code.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.nomenclature_name.to_lowercase().contains(&needle)
            || self.code.to_lowercase().contains(&needle)
    }
}

/// Identity of a stock line: `(nomenclature, container, zone)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub nomenclature_id: NomenclatureId,
    pub container_id: Option<ContainerId>,
    pub zone_id: ZoneId,
}
