//! In-memory `WarehouseApi` for service tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;

use wareops_approvals::{Document, Ticket, TicketStatus, TicketType};
use wareops_auth::{Principal, Role};
use wareops_capacity::{Container, Zone};
use wareops_client::api::{BatchApproval, NewContainer, NewZone, WarehouseApi, ZoneUpdate};
use wareops_client::{ClientError, ClientResult, SessionContext};
use wareops_core::{
    ContainerId, DateRange, DocumentId, InventoryId, InventoryItemId, NomenclatureId, TicketId,
    UserId, WarehouseId, ZoneId,
};
use wareops_inventory::InventoryItem;
use wareops_stocktake::{CheckStatus, InventoryCheck, InventoryCheckSummary, SubmitLine};

pub const USER: UserId = UserId::new(42);
pub const WAREHOUSE: WarehouseId = WarehouseId::new(1);

#[derive(Default)]
pub struct FakeState {
    pub zones: Vec<Zone>,
    pub containers: Vec<Container>,
    pub items: HashMap<ZoneId, Vec<InventoryItem>>,
    pub checks: HashMap<InventoryId, InventoryCheck>,
    pub in_progress: Vec<InventoryCheckSummary>,
    pub tickets: Vec<Ticket>,
    /// Operation name → error returned by the next calls of it.
    pub failures: HashMap<&'static str, ClientError>,
    pub batch_reply: Option<BatchApproval>,
    pub submissions: Vec<(InventoryId, Vec<SubmitLine>)>,
    pub batches: Vec<Vec<TicketId>>,
    pub calls: Vec<&'static str>,
    pub next_id: i64,
}

#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn new(state: FakeState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..state
            }),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Hold the next call of `gate` until the returned sender fires (or is
    /// dropped).
    pub fn gate(&self, gate: impl Into<String>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(gate.into(), rx);
        tx
    }

    /// Whether a call has picked up the gate registered under `gate`.
    pub fn gate_taken(&self, gate: &str) -> bool {
        !self.gates.lock().unwrap().contains_key(gate)
    }

    pub fn fail(&self, op: &'static str, err: ClientError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    pub fn heal(&self, op: &'static str) {
        self.state.lock().unwrap().failures.remove(op);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| **c == op).count()
    }

    fn enter(&self, op: &'static str) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        match state.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn wait(&self, gate: &str) {
        let rx = self.gates.lock().unwrap().remove(gate);
        if let Some(rx) = rx {
            let _ = rx.await;
        }
    }

    fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl WarehouseApi for FakeApi {
    async fn list_zones(&self, _warehouse: WarehouseId) -> ClientResult<Vec<Zone>> {
        self.enter("list_zones")?;
        Ok(self.state.lock().unwrap().zones.clone())
    }

    async fn list_containers(&self, zone: ZoneId) -> ClientResult<Vec<Container>> {
        self.enter("list_containers")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .containers
            .iter()
            .filter(|c| c.warehouse_zone_id == zone)
            .cloned()
            .collect())
    }

    async fn zone_items(&self, zone: ZoneId) -> ClientResult<Vec<InventoryItem>> {
        let items = self.state.lock().unwrap().items.get(&zone).cloned();
        self.wait(&format!("zone_items.{zone}")).await;
        self.enter("zone_items")?;
        Ok(items.unwrap_or_default())
    }

    async fn update_zone(&self, _warehouse: WarehouseId, _user: UserId, _update: &ZoneUpdate) -> ClientResult<()> {
        self.enter("update_zone")
    }

    async fn delete_zone(&self, _zone: ZoneId) -> ClientResult<()> {
        self.enter("delete_zone")
    }

    async fn create_zone(&self, _warehouse: WarehouseId, _user: UserId, zone: &NewZone) -> ClientResult<Zone> {
        self.enter("create_zone")?;
        Ok(Zone {
            id: ZoneId::new(self.next_id()),
            parent_id: zone.parent_id,
            name: zone.name.clone(),
            width: Some(zone.width),
            height: Some(zone.height),
            length: Some(zone.length),
            capacity: zone.width * zone.height * zone.length,
            can_store_items: zone.can_store_items,
        })
    }

    async fn create_container(&self, container: &NewContainer) -> ClientResult<Container> {
        self.enter("create_container")?;
        Ok(Container {
            id: ContainerId::new(self.next_id()),
            warehouse_zone_id: container.warehouse_zone_id,
            serial_number: container.serial_number.clone(),
            width: Some(container.width),
            height: Some(container.height),
            length: Some(container.length),
            capacity: container.capacity,
        })
    }

    async fn delete_container(&self, _container: ContainerId) -> ClientResult<()> {
        self.enter("delete_container")
    }

    async fn start_stocktake(&self, warehouse: WarehouseId, created_by: UserId) -> ClientResult<InventoryCheckSummary> {
        self.enter("start_stocktake")?;
        self.wait("start_stocktake").await;
        Ok(InventoryCheckSummary {
            id: InventoryId::new(self.next_id()),
            warehouse_id: warehouse,
            status: CheckStatus::InProgress,
            created_by: Some(created_by),
            created_at: Some(Utc::now()),
        })
    }

    async fn fetch_stocktake(&self, inventory: InventoryId) -> ClientResult<InventoryCheck> {
        self.enter("fetch_stocktake")?;
        self.state
            .lock()
            .unwrap()
            .checks
            .get(&inventory)
            .cloned()
            .ok_or(ClientError::Server {
                status: 404,
                message: Some("Inventory check not found".into()),
            })
    }

    async fn submit_stocktake(&self, inventory: InventoryId, lines: &[SubmitLine]) -> ClientResult<()> {
        self.enter("submit_stocktake")?;
        self.state
            .lock()
            .unwrap()
            .submissions
            .push((inventory, lines.to_vec()));
        Ok(())
    }

    async fn in_progress_stocktakes(&self, _range: DateRange) -> ClientResult<Vec<InventoryCheckSummary>> {
        self.enter("in_progress_stocktakes")?;
        Ok(self.state.lock().unwrap().in_progress.clone())
    }

    async fn tickets(&self, ticket_type: TicketType, _range: DateRange) -> ClientResult<Vec<Ticket>> {
        let tickets: Vec<Ticket> = self
            .state
            .lock()
            .unwrap()
            .tickets
            .iter()
            .filter(|t| t.ticket_type == ticket_type)
            .cloned()
            .collect();
        self.wait("tickets").await;
        self.enter("tickets")?;
        Ok(tickets)
    }

    async fn approve_ticket(&self, _ticket: TicketId, _manager: UserId) -> ClientResult<()> {
        self.wait("approve_ticket").await;
        self.enter("approve_ticket")
    }

    async fn approve_batch(&self, tickets: &[TicketId], _manager: UserId) -> ClientResult<BatchApproval> {
        self.enter("approve_batch")?;
        let mut state = self.state.lock().unwrap();
        state.batches.push(tickets.to_vec());
        Ok(state
            .batch_reply
            .clone()
            .unwrap_or_else(|| BatchApproval::all(tickets)))
    }

    async fn cancel_ticket(&self, _ticket: TicketId) -> ClientResult<()> {
        self.wait("cancel_ticket").await;
        self.enter("cancel_ticket")
    }

    async fn execute_write_off(&self, _ticket: TicketId) -> ClientResult<()> {
        self.enter("execute_write_off")
    }
}

pub fn session(api: Arc<FakeApi>, role: Role) -> SessionContext {
    SessionContext::new(api, Principal::new(USER, vec![role]))
}

pub fn zone(id: i64, parent: Option<i64>, name: &str, dims: (f64, f64, f64), can_store_items: bool) -> Zone {
    Zone {
        id: ZoneId::new(id),
        parent_id: parent.map(ZoneId::new),
        name: name.to_string(),
        width: Some(dims.0),
        height: Some(dims.1),
        length: Some(dims.2),
        capacity: dims.0 * dims.1 * dims.2,
        can_store_items,
    }
}

pub fn container(id: i64, zone: i64, capacity: f64) -> Container {
    Container {
        id: ContainerId::new(id),
        warehouse_zone_id: ZoneId::new(zone),
        serial_number: format!("C-{id}"),
        width: Some(0.5),
        height: Some(0.5),
        length: Some(0.5),
        capacity,
    }
}

pub fn item(nomenclature: i64, zone: i64, quantity: f64) -> InventoryItem {
    InventoryItem {
        nomenclature_id: NomenclatureId::new(nomenclature),
        nomenclature_name: format!("Item {nomenclature}"),
        code: format!("SKU-{nomenclature}"),
        quantity,
        measurement_unit: "pcs".to_string(),
        warehouse_zone_id: ZoneId::new(zone),
        warehouse_container_id: None,
    }
}

pub fn ticket(id: i64, document: i64, ticket_type: TicketType, status: TicketStatus) -> Ticket {
    Ticket {
        id: TicketId::new(id),
        ticket_type,
        status,
        document: Document {
            id: DocumentId::new(document),
            number: Some(format!("DOC-{document}")),
            created_at: None,
        },
        inventory_item_id: InventoryItemId::new(id * 10),
        quantity: 2.0,
        created_by: UserId::new(7),
        created_at: Utc::now(),
        manager_id: None,
        managed_at: None,
    }
}

pub fn server_error(message: &str) -> ClientError {
    ClientError::Server {
        status: 409,
        message: Some(message.to_string()),
    }
}

pub fn last_days(days: u32) -> DateRange {
    DateRange::trailing_days(Utc::now().date_naive(), days)
}
