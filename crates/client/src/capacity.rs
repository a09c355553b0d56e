//! Capacity view of one warehouse: loads the zone layout, keeps the
//! [`CapacityTree`] current, and applies structural edits optimistically.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

use wareops_auth::Capability;
use wareops_capacity::{CapacityMetrics, CapacityTree, Container, NewNode, NodeId, WarehouseCapacity, Zone};
use wareops_core::{ContainerId, Dimensions, DomainError, DomainResult, WarehouseId, ZoneId};
use wareops_inventory::InventoryItem;

use crate::api::{NewContainer, NewZone, WarehouseApi, ZoneUpdate};
use crate::context::SessionHandle;
use crate::error::ClientResult;
use crate::inflight::{InFlight, InFlightGuard};
use crate::{joined, lock};

const LAYOUT_KEY: &str = "capacity.layout";

#[derive(Debug, Clone, Default)]
struct CapacityState {
    warehouse: Option<WarehouseId>,
    /// Bumped on every reload; edits started against an older layout neither
    /// confirm nor roll back.
    revision: u64,
    tree: CapacityTree,
    items: HashMap<ZoneId, Vec<InventoryItem>>,
}

/// An optimistic edit waiting for the server.
struct PendingEdit {
    warehouse: WarehouseId,
    revision: u64,
    snapshot: CapacityState,
    _guard: InFlightGuard<WarehouseId>,
}

#[derive(Clone)]
pub struct CapacityService {
    session: SessionHandle,
    state: Arc<Mutex<CapacityState>>,
    edits: InFlight<WarehouseId>,
}

impl CapacityService {
    pub(crate) fn new(session: SessionHandle) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(CapacityState::default())),
            edits: InFlight::new("structural edit"),
        }
    }

    /// Fetch zones and containers and rebuild the tree from scratch.
    ///
    /// A newer `load` supersedes this one; the superseded call returns
    /// `Stale` and leaves state alone.
    #[tracing::instrument(skip(self), fields(warehouse_id = %warehouse))]
    pub async fn load(&self, warehouse: WarehouseId) -> ClientResult<WarehouseCapacity> {
        self.session.require(Capability::ViewCapacity)?;
        let api = Arc::clone(&self.session.api);
        let (zones, containers) = self
            .session
            .latest
            .run(LAYOUT_KEY, fetch_layout(api, warehouse))
            .await?;

        let tree = CapacityTree::build(&zones, &containers);
        let summary = tree.warehouse_summary();
        let mut state = lock(&self.state);
        let revision = state.revision + 1;
        *state = CapacityState {
            warehouse: Some(warehouse),
            revision,
            tree,
            items: HashMap::new(),
        };
        tracing::info!(zones = zones.len(), containers = containers.len(), "capacity tree loaded");
        Ok(summary)
    }

    pub fn warehouse(&self) -> Option<WarehouseId> {
        lock(&self.state).warehouse
    }

    /// Read the current tree without cloning it.
    pub fn with_tree<R>(&self, f: impl FnOnce(&CapacityTree) -> R) -> R {
        f(&lock(&self.state).tree)
    }

    pub fn summary(&self) -> WarehouseCapacity {
        self.with_tree(CapacityTree::warehouse_summary)
    }

    pub fn metrics(&self, node: impl Into<NodeId>) -> Option<CapacityMetrics> {
        let node = node.into();
        self.with_tree(|tree| tree.metrics(node))
    }

    /// Fetch and cache one zone's items, for item-level filtering.
    #[tracing::instrument(skip(self), fields(zone_id = %zone))]
    pub async fn zone_items(&self, zone: ZoneId) -> ClientResult<Vec<InventoryItem>> {
        self.session.require(Capability::ViewCapacity)?;
        let api = Arc::clone(&self.session.api);
        let items = self
            .session
            .latest
            .run(format!("capacity.items.{zone}"), async move { api.zone_items(zone).await })
            .await?;
        let mut state = lock(&self.state);
        if state.tree.contains(NodeId::Zone(zone)) {
            state.items.insert(zone, items.clone());
        }
        Ok(items)
    }

    /// Cabinets matching `name_query`, or holding an item matching
    /// `item_query` among the items fetched so far.
    pub fn filter(&self, name_query: &str, item_query: &str) -> Vec<ZoneId> {
        let state = lock(&self.state);
        let items: Vec<InventoryItem> = state.items.values().flatten().cloned().collect();
        state.tree.filter_with_items(name_query, item_query, &items)
    }

    /// Create a cabinet (`parent: None`) or a zone under `parent`.
    #[tracing::instrument(skip(self, dimensions), fields(parent = ?parent))]
    pub async fn create_zone(
        &self,
        parent: Option<ZoneId>,
        name: &str,
        dimensions: Dimensions,
        can_store_items: bool,
    ) -> ClientResult<ZoneId> {
        let (edit, provisional) = self.begin_edit(|state| {
            let id = state.tree.provisional_zone_id();
            let node = NewNode::zone(id, name.trim(), dimensions).storing_items(can_store_items);
            match parent {
                Some(parent) => state.tree.attach_child(NodeId::Zone(parent), node)?,
                None => state.tree.insert_cabinet(node)?,
            };
            state.tree.recompute_capacities(NodeId::Zone(id))?;
            Ok(id)
        })?;

        let body = NewZone::new(name.trim(), parent, dimensions).storing_items(can_store_items);
        let result = self
            .session
            .api
            .create_zone(edit.warehouse, self.session.user_id(), &body)
            .await;
        let created: Zone = self.settle(edit, "create zone", result, |state, created| {
            state
                .tree
                .mark_persisted(NodeId::Zone(provisional), NodeId::Zone(created.id))?;
            if created.can_store_items != can_store_items {
                state
                    .tree
                    .update_settings(created.id, &created.name, created.can_store_items)?;
            }
            Ok(())
        })?;
        tracing::info!(zone_id = %created.id, "zone created");
        Ok(created.id)
    }

    #[tracing::instrument(skip(self, dimensions), fields(zone_id = %zone))]
    pub async fn create_container(
        &self,
        zone: ZoneId,
        serial_number: &str,
        dimensions: Dimensions,
        capacity: f64,
    ) -> ClientResult<ContainerId> {
        let (edit, provisional) = self.begin_edit(|state| {
            let id = state.tree.provisional_container_id();
            let node = NewNode::container(id, serial_number.trim(), dimensions, capacity);
            state.tree.attach_child(NodeId::Zone(zone), node)?;
            state.tree.recompute_capacities(NodeId::Container(id))?;
            Ok(id)
        })?;

        let body = NewContainer::new(zone, serial_number.trim(), dimensions, capacity);
        let result = self.session.api.create_container(&body).await;
        let created: Container = self.settle(edit, "create container", result, |state, created| {
            state
                .tree
                .mark_persisted(NodeId::Container(provisional), NodeId::Container(created.id))
        })?;
        tracing::info!(container_id = %created.id, "container created");
        Ok(created.id)
    }

    /// Rename a zone and toggle whether it stores items. Dimensions are
    /// locked once saved and are never sent.
    #[tracing::instrument(skip(self), fields(zone_id = %zone))]
    pub async fn update_zone_settings(&self, zone: ZoneId, name: &str, can_store_items: bool) -> ClientResult<()> {
        let (edit, parent_id) = self.begin_edit(|state| {
            if NodeId::Zone(zone).is_provisional() {
                return Err(DomainError::validation(format!("zone {zone} has not been saved yet")));
            }
            state.tree.update_settings(zone, name, can_store_items)?;
            Ok(state.tree.parent_of(NodeId::Zone(zone)).and_then(NodeId::as_zone))
        })?;

        let update = ZoneUpdate {
            id: zone,
            name: name.trim().to_string(),
            can_store_items,
            parent_id,
            width: None,
            height: None,
            length: None,
        };
        let result = self
            .session
            .api
            .update_zone(edit.warehouse, self.session.user_id(), &update)
            .await;
        self.settle(edit, "update zone", result, |_, _| Ok(()))?;
        tracing::info!("zone settings updated");
        Ok(())
    }

    /// Delete a zone with its sub-tree, evicting cached items of every
    /// removed zone.
    #[tracing::instrument(skip(self), fields(zone_id = %zone))]
    pub async fn delete_zone(&self, zone: ZoneId) -> ClientResult<()> {
        let (edit, removed) = self.begin_edit(|state| remove_subtree(state, NodeId::Zone(zone)))?;
        let result = self.session.api.delete_zone(zone).await;
        self.settle(edit, "delete zone", result, |_, _| Ok(()))?;
        tracing::info!(removed, "zone deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(container_id = %container))]
    pub async fn delete_container(&self, container: ContainerId) -> ClientResult<()> {
        let (edit, _) = self.begin_edit(|state| remove_subtree(state, NodeId::Container(container)))?;
        let result = self.session.api.delete_container(container).await;
        self.settle(edit, "delete container", result, |_, _| Ok(()))?;
        tracing::info!("container deleted");
        Ok(())
    }

    /// Change the dimensions of a node the server has not confirmed yet.
    pub fn resize_draft(&self, node: NodeId, dimensions: Dimensions) -> ClientResult<()> {
        self.session.require(Capability::ManageZones)?;
        let mut state = lock(&self.state);
        state.tree.resize(node, dimensions)?;
        state.tree.recompute_capacities(node)?;
        Ok(())
    }

    /// Apply `local` under the edit guard, keeping a snapshot to roll back to.
    fn begin_edit<R>(
        &self,
        local: impl FnOnce(&mut CapacityState) -> DomainResult<R>,
    ) -> ClientResult<(PendingEdit, R)> {
        self.session.require(Capability::ManageZones)?;
        let mut state = lock(&self.state);
        let warehouse = state
            .warehouse
            .ok_or_else(|| DomainError::validation("no warehouse is loaded"))?;
        let guard = self.edits.try_acquire(warehouse)?;
        let snapshot = state.clone();
        match local(&mut *state) {
            Ok(out) => Ok((
                PendingEdit {
                    warehouse,
                    revision: state.revision,
                    snapshot,
                    _guard: guard,
                },
                out,
            )),
            Err(err) => {
                *state = snapshot;
                Err(err.into())
            }
        }
    }

    /// Confirm or roll back an edit once the server has answered.
    ///
    /// If the layout was reloaded while the request was in flight the reload
    /// is authoritative: nothing is confirmed or restored.
    fn settle<T>(
        &self,
        edit: PendingEdit,
        what: &str,
        result: ClientResult<T>,
        confirm: impl FnOnce(&mut CapacityState, &T) -> DomainResult<()>,
    ) -> ClientResult<T> {
        let mut state = lock(&self.state);
        let current = state.revision == edit.revision;
        match result {
            Ok(value) => {
                if current {
                    confirm(&mut *state, &value)?;
                } else {
                    tracing::debug!(operation = what, "layout reloaded during edit; skipping confirmation");
                }
                Ok(value)
            }
            Err(err) => {
                if current {
                    *state = edit.snapshot;
                }
                tracing::warn!(operation = what, error = %err, "edit rejected; local changes rolled back");
                Err(err)
            }
        }
    }
}

fn remove_subtree(state: &mut CapacityState, id: NodeId) -> DomainResult<usize> {
    if id.is_provisional() {
        return Err(DomainError::validation(format!("{id} has not been saved yet")));
    }
    let root = state.tree.path_to_root(id).last().copied();
    let removed = state.tree.remove_node(id)?;
    if let Some(root) = root.filter(|r| *r != id) {
        state.tree.recompute_capacities(root)?;
    }
    for zone in removed.iter().filter_map(|n| n.as_zone()) {
        state.items.remove(&zone);
    }
    Ok(removed.len())
}

/// Zones, then the containers of every leaf zone, fetched concurrently.
async fn fetch_layout(
    api: Arc<dyn WarehouseApi>,
    warehouse: WarehouseId,
) -> ClientResult<(Vec<Zone>, Vec<Container>)> {
    let zones = api.list_zones(warehouse).await?;
    let parents: HashSet<ZoneId> = zones.iter().filter_map(|z| z.parent_id).collect();

    let mut fetches = JoinSet::new();
    for zone in zones.iter().filter(|z| !parents.contains(&z.id)) {
        let api = Arc::clone(&api);
        let zone = zone.id;
        fetches.spawn(async move { api.list_containers(zone).await });
    }

    let mut containers = Vec::new();
    while let Some(result) = fetches.join_next().await {
        containers.extend(joined(result)?);
    }
    containers.sort_by_key(|c| c.id);
    Ok((zones, containers))
}
