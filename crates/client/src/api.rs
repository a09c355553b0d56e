//! The warehouse API as the services see it.
//!
//! One method per server operation. [`crate::HttpWarehouseApi`] is the real
//! implementation; tests substitute an in-memory one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wareops_approvals::{Ticket, TicketType};
use wareops_capacity::{Container, Zone};
use wareops_core::{
    ContainerId, DateRange, Dimensions, InventoryId, TicketId, UserId, WarehouseId, ZoneId,
};
use wareops_inventory::InventoryItem;
use wareops_stocktake::{InventoryCheck, InventoryCheckSummary, SubmitLine};

use crate::error::ClientResult;

/// Settings update for an existing zone.
///
/// Dimensions are locked once a zone is saved, so they are only sent when
/// explicitly set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneUpdate {
    pub id: ZoneId,
    pub name: String,
    pub can_store_items: bool,
    pub parent_id: Option<ZoneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

/// Body of a zone creation; `parent_id: None` creates a cabinet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewZone {
    pub name: String,
    pub parent_id: Option<ZoneId>,
    pub height: f64,
    pub length: f64,
    pub width: f64,
    #[serde(default)]
    pub can_store_items: bool,
}

impl NewZone {
    pub fn new(name: impl Into<String>, parent_id: Option<ZoneId>, dimensions: Dimensions) -> Self {
        Self {
            name: name.into(),
            parent_id,
            height: dimensions.height,
            length: dimensions.length,
            width: dimensions.width,
            can_store_items: false,
        }
    }

    pub fn storing_items(mut self, can_store_items: bool) -> Self {
        self.can_store_items = can_store_items;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContainer {
    pub warehouse_zone_id: ZoneId,
    pub serial_number: String,
    pub capacity: f64,
    pub length: f64,
    pub height: f64,
    pub width: f64,
}

impl NewContainer {
    pub fn new(
        zone: ZoneId,
        serial_number: impl Into<String>,
        dimensions: Dimensions,
        capacity: f64,
    ) -> Self {
        Self {
            warehouse_zone_id: zone,
            serial_number: serial_number.into(),
            capacity,
            length: dimensions.length,
            height: dimensions.height,
            width: dimensions.width,
        }
    }
}

/// `PUT /ticket/allow` body. The manager field is snake_case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveRequest {
    #[serde(rename = "ticketId")]
    pub ticket_id: TicketId,
    pub managed_id: UserId,
}

/// `PUT /ticket/allow/batch` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchApproveRequest {
    pub ticket_ids: Vec<TicketId>,
    pub managed_id: UserId,
}

/// What the server reports back for a batch approval. An empty body means
/// every ticket was approved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchApproval {
    #[serde(default)]
    pub approved_ids: Vec<TicketId>,
    #[serde(default)]
    pub rejected_ids: Vec<TicketId>,
}

impl BatchApproval {
    pub fn all(ids: &[TicketId]) -> Self {
        Self {
            approved_ids: ids.to_vec(),
            rejected_ids: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.rejected_ids.is_empty()
    }
}

#[async_trait]
pub trait WarehouseApi: Send + Sync {
    // Zones and containers.
    async fn list_zones(&self, warehouse: WarehouseId) -> ClientResult<Vec<Zone>>;
    async fn list_containers(&self, zone: ZoneId) -> ClientResult<Vec<Container>>;
    async fn zone_items(&self, zone: ZoneId) -> ClientResult<Vec<InventoryItem>>;
    async fn update_zone(&self, warehouse: WarehouseId, user: UserId, update: &ZoneUpdate) -> ClientResult<()>;
    async fn delete_zone(&self, zone: ZoneId) -> ClientResult<()>;
    async fn create_zone(&self, warehouse: WarehouseId, user: UserId, zone: &NewZone) -> ClientResult<Zone>;
    async fn create_container(&self, container: &NewContainer) -> ClientResult<Container>;
    async fn delete_container(&self, container: ContainerId) -> ClientResult<()>;

    // Stocktakes.
    async fn start_stocktake(&self, warehouse: WarehouseId, created_by: UserId) -> ClientResult<InventoryCheckSummary>;
    async fn fetch_stocktake(&self, inventory: InventoryId) -> ClientResult<InventoryCheck>;
    async fn submit_stocktake(&self, inventory: InventoryId, lines: &[SubmitLine]) -> ClientResult<()>;
    async fn in_progress_stocktakes(&self, range: DateRange) -> ClientResult<Vec<InventoryCheckSummary>>;

    // Tickets.
    async fn tickets(&self, ticket_type: TicketType, range: DateRange) -> ClientResult<Vec<Ticket>>;
    async fn approve_ticket(&self, ticket: TicketId, manager: UserId) -> ClientResult<()>;
    async fn approve_batch(&self, tickets: &[TicketId], manager: UserId) -> ClientResult<BatchApproval>;
    async fn cancel_ticket(&self, ticket: TicketId) -> ClientResult<()>;
    async fn execute_write_off(&self, ticket: TicketId) -> ClientResult<()>;
}
