use serde::Serialize;

use wareops_core::{ContainerId, NomenclatureId, ZoneId};
use wareops_inventory::{InventoryItem, ItemKey};

/// One counted line of a stocktake.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StocktakeLine {
    pub nomenclature_id: NomenclatureId,
    pub nomenclature_name: String,
    pub code: String,
    pub measurement_unit: String,
    pub zone_id: ZoneId,
    pub container_id: Option<ContainerId>,
    pub expected_quantity: f64,
    pub actual_quantity: f64,
    /// What the user typed, when it was not a clean number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<String>,
}

impl StocktakeLine {
    /// A fresh line: counted quantity starts at the expected one.
    pub fn from_item(item: &InventoryItem) -> Self {
        Self {
            nomenclature_id: item.nomenclature_id,
            nomenclature_name: item.nomenclature_name.clone(),
            code: item.code.clone(),
            measurement_unit: item.measurement_unit.clone(),
            zone_id: item.warehouse_zone_id,
            container_id: item.warehouse_container_id,
            expected_quantity: item.quantity,
            actual_quantity: item.quantity,
            raw_input: None,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            nomenclature_id: self.nomenclature_id,
            container_id: self.container_id,
            zone_id: self.zone_id,
        }
    }

    /// `actual − expected`; negative means shortage.
    pub fn discrepancy(&self) -> f64 {
        self.actual_quantity - self.expected_quantity
    }

    pub fn is_changed(&self) -> bool {
        self.actual_quantity != self.expected_quantity
    }
}

/// Parse a typed quantity. Accepts a decimal comma; anything that is not a
/// number becomes `0`.
pub fn parse_quantity(raw: &str) -> (f64, bool) {
    let cleaned = raw.trim().replace(',', ".");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => (value, true),
        _ => (0.0, false),
    }
}
