//! Stocktake records exchanged with the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareops_core::{ContainerId, InventoryId, NomenclatureId, UserId, WarehouseId, ZoneId};
use wareops_inventory::InventoryItem;

/// Server-side status of an inventory check.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    InProgress,
    Completed,
}

/// An item line as recorded by the server for a running check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedLine {
    #[serde(flatten)]
    pub item: InventoryItem,
    #[serde(default)]
    pub actual_quantity: Option<f64>,
}

/// Full state of one inventory check, used to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheck {
    pub id: InventoryId,
    pub warehouse_id: WarehouseId,
    pub status: CheckStatus,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed_zone_ids: Vec<ZoneId>,
    #[serde(default)]
    pub items: Vec<RecordedLine>,
}

/// Row of the "in progress" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheckSummary {
    pub id: InventoryId,
    pub warehouse_id: WarehouseId,
    pub status: CheckStatus,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One changed line as transmitted on submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLine {
    pub nomenclature_id: NomenclatureId,
    pub warehouse_zone_id: ZoneId,
    pub container_id: Option<ContainerId>,
    pub actual_quantity: f64,
}
