//! Arena-backed capacity forest.
//!
//! Nodes live in one `Vec` and refer to each other by index; `index` maps ids
//! to slots. The forest is rebuilt once per fetch, so every capacity figure is
//! computed from the same snapshot.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use wareops_core::{
    ContainerId, Dimensions, DomainError, DomainResult, Entity, MIN_DIMENSION, ZoneId,
};
use wareops_inventory::InventoryItem;

use crate::metrics::{CapacityMetrics, WarehouseCapacity};
use crate::zone::{Container, Zone};

/// Identity of a node: zones and containers have separate id spaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeId {
    Zone(ZoneId),
    Container(ContainerId),
}

impl NodeId {
    pub fn as_zone(self) -> Option<ZoneId> {
        match self {
            NodeId::Zone(id) => Some(id),
            NodeId::Container(_) => None,
        }
    }

    pub fn as_container(self) -> Option<ContainerId> {
        match self {
            NodeId::Container(id) => Some(id),
            NodeId::Zone(_) => None,
        }
    }

    /// Provisional ids are negative and exist only until the server confirms
    /// the creation.
    pub fn is_provisional(self) -> bool {
        match self {
            NodeId::Zone(id) => id.get() < 0,
            NodeId::Container(id) => id.get() < 0,
        }
    }
}

impl From<ZoneId> for NodeId {
    fn from(value: ZoneId) -> Self {
        NodeId::Zone(value)
    }
}

impl From<ContainerId> for NodeId {
    fn from(value: ContainerId) -> Self {
        NodeId::Container(value)
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NodeId::Zone(id) => write!(f, "zone {id}"),
            NodeId::Container(id) => write!(f, "container {id}"),
        }
    }
}

/// Level of a node in the hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Cabinet,
    SubZone,
    Container,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityNode {
    id: NodeId,
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    name: String,
    dimensions: Dimensions,
    capacity: f64,
    can_store_items: bool,
    persisted: bool,
    metrics: CapacityMetrics,
}

impl CapacityNode {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn can_store_items(&self) -> bool {
        self.can_store_items
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn metrics(&self) -> CapacityMetrics {
        self.metrics
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Containers always hold stock; zones only when flagged.
    pub fn is_item_bearing(&self) -> bool {
        self.kind == NodeKind::Container || self.can_store_items
    }
}

impl Entity for CapacityNode {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.id
    }
}

/// A zone or container about to be attached.
///
/// `capacity: None` means "the volume of `dimensions`".
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub id: NodeId,
    pub name: String,
    pub dimensions: Dimensions,
    pub capacity: Option<f64>,
    pub can_store_items: bool,
}

impl NewNode {
    pub fn zone(id: ZoneId, name: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            id: NodeId::Zone(id),
            name: name.into(),
            dimensions,
            capacity: None,
            can_store_items: false,
        }
    }

    pub fn container(
        id: ContainerId,
        serial_number: impl Into<String>,
        dimensions: Dimensions,
        capacity: f64,
    ) -> Self {
        Self {
            id: NodeId::Container(id),
            name: serial_number.into(),
            dimensions,
            capacity: Some(capacity),
            can_store_items: true,
        }
    }

    pub fn storing_items(mut self, can_store_items: bool) -> Self {
        self.can_store_items = can_store_items;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityTree {
    nodes: Vec<Option<CapacityNode>>,
    index: HashMap<NodeId, usize>,
    roots: Vec<usize>,
    provisional_seq: i64,
}

impl CapacityTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise a flat zone list plus container lists into one forest and
    /// compute every node's metrics.
    ///
    /// Zones below a sub-zone become container slots. Records whose parent is
    /// unknown (or that would nest below a container) are skipped.
    pub fn build(zones: &[Zone], containers: &[Container]) -> Self {
        let mut tree = Self::default();
        let known: HashSet<ZoneId> = zones.iter().map(|z| z.id).collect();
        let mut by_parent: HashMap<ZoneId, Vec<&Zone>> = HashMap::new();
        let mut queue: VecDeque<&Zone> = VecDeque::new();

        for zone in zones {
            match zone.parent_id {
                None => queue.push_back(zone),
                Some(parent) if known.contains(&parent) => {
                    by_parent.entry(parent).or_default().push(zone)
                }
                Some(parent) => {
                    tracing::warn!(zone_id = %zone.id, parent_id = %parent, "skipping zone with unknown parent");
                }
            }
        }

        // Breadth-first from the cabinets: a parent is always placed before
        // its children.
        while let Some(zone) = queue.pop_front() {
            let id = NodeId::Zone(zone.id);
            if tree.index.contains_key(&id) {
                tracing::warn!(zone_id = %zone.id, "skipping duplicate zone");
                continue;
            }
            let parent_idx = zone
                .parent_id
                .and_then(|p| tree.index.get(&NodeId::Zone(p)).copied());
            let kind = match parent_idx.and_then(|p| tree.slot(p)).map(|p| p.kind) {
                None => NodeKind::Cabinet,
                Some(NodeKind::Cabinet) => NodeKind::SubZone,
                Some(NodeKind::SubZone) => NodeKind::Container,
                Some(NodeKind::Container) => {
                    tracing::warn!(zone_id = %zone.id, "skipping zone nested below a container");
                    continue;
                }
            };
            let dimensions = zone
                .dimensions()
                .unwrap_or_else(|| tree.default_dimensions(kind, parent_idx, zone.capacity));
            tree.push_node(
                CapacityNode {
                    id,
                    kind,
                    parent: parent_idx,
                    children: Vec::new(),
                    name: zone.name.clone(),
                    dimensions,
                    capacity: zone.capacity.max(0.0),
                    can_store_items: zone.can_store_items,
                    persisted: true,
                    metrics: CapacityMetrics::default(),
                },
                parent_idx,
            );
            if let Some(children) = by_parent.remove(&zone.id) {
                queue.extend(children);
            }
        }

        for zone in by_parent.into_values().flatten() {
            if !tree.index.contains_key(&NodeId::Zone(zone.id)) {
                tracing::warn!(zone_id = %zone.id, "skipping zone unreachable from any cabinet");
            }
        }

        for container in containers {
            let id = NodeId::Container(container.id);
            if tree.index.contains_key(&id) {
                tracing::warn!(container_id = %container.id, "skipping duplicate container");
                continue;
            }
            let parent_idx = match tree.index.get(&NodeId::Zone(container.warehouse_zone_id)) {
                Some(&idx) if tree.slot(idx).is_some_and(|p| p.kind != NodeKind::Container) => idx,
                _ => {
                    tracing::warn!(
                        container_id = %container.id,
                        zone_id = %container.warehouse_zone_id,
                        "skipping container without a usable parent zone"
                    );
                    continue;
                }
            };
            tree.push_node(
                CapacityNode {
                    id,
                    kind: NodeKind::Container,
                    parent: Some(parent_idx),
                    children: Vec::new(),
                    name: container.serial_number.clone(),
                    dimensions: container.dimensions().unwrap_or(Dimensions::unit()),
                    capacity: container.capacity.max(0.0),
                    can_store_items: true,
                    persisted: true,
                    metrics: CapacityMetrics::default(),
                },
                Some(parent_idx),
            );
        }

        tree.recompute_all();
        tree
    }

    fn default_dimensions(&self, kind: NodeKind, parent: Option<usize>, capacity: f64) -> Dimensions {
        match kind {
            NodeKind::Container => Dimensions::unit(),
            NodeKind::SubZone => parent
                .and_then(|p| self.slot(p))
                .map(|p| p.dimensions.halved())
                .unwrap_or(Dimensions::unit()),
            NodeKind::Cabinet => {
                let side = capacity.max(0.0).cbrt().max(MIN_DIMENSION);
                Dimensions::new(side, side, side)
            }
        }
    }

    fn slot(&self, idx: usize) -> Option<&CapacityNode> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, idx: usize) -> Option<&mut CapacityNode> {
        self.nodes.get_mut(idx).and_then(Option::as_mut)
    }

    fn index_of(&self, id: NodeId) -> DomainResult<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| DomainError::not_found(id.to_string()))
    }

    fn push_node(&mut self, node: CapacityNode, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.id, idx);
        self.nodes.push(Some(node));
        match parent.and_then(|p| self.slot_mut(p)) {
            Some(parent) => parent.children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    fn root_index(&self, mut idx: usize) -> usize {
        while let Some(parent) = self.slot(idx).and_then(|n| n.parent) {
            idx = parent;
        }
        idx
    }

    /// Next provisional zone id (negative) for an optimistic creation.
    pub fn provisional_zone_id(&mut self) -> ZoneId {
        self.provisional_seq += 1;
        ZoneId::new(-self.provisional_seq)
    }

    /// Next provisional container id (negative) for an optimistic creation.
    pub fn provisional_container_id(&mut self) -> ContainerId {
        self.provisional_seq += 1;
        ContainerId::new(-self.provisional_seq)
    }

    /// Add a new cabinet (root).
    pub fn insert_cabinet(&mut self, new: NewNode) -> DomainResult<NodeId> {
        if new.id.as_zone().is_none() {
            return Err(DomainError::validation("a cabinet must be a zone"));
        }
        let capacity = self.check_new(&new)?;
        self.push_node(
            CapacityNode {
                id: new.id,
                kind: NodeKind::Cabinet,
                parent: None,
                children: Vec::new(),
                name: new.name,
                dimensions: new.dimensions,
                capacity,
                can_store_items: new.can_store_items,
                persisted: !new.id.is_provisional(),
                metrics: CapacityMetrics::default(),
            },
            None,
        );
        Ok(new.id)
    }

    /// Attach a sub-zone or container under `parent`.
    ///
    /// The child must be at least [`MIN_DIMENSION`] on every side and fit
    /// inside the parent's footprint. Containers are leaves.
    pub fn attach_child(&mut self, parent: NodeId, new: NewNode) -> DomainResult<NodeId> {
        let parent_idx = self.index_of(parent)?;
        let parent_node = self
            .slot(parent_idx)
            .ok_or_else(|| DomainError::not_found(parent.to_string()))?;
        let kind = match (parent_node.kind, new.id) {
            (NodeKind::Container, _) => {
                return Err(DomainError::validation(format!(
                    "{parent} is a container and cannot hold other nodes"
                )));
            }
            (_, NodeId::Container(_)) => NodeKind::Container,
            (NodeKind::Cabinet, NodeId::Zone(_)) => NodeKind::SubZone,
            (NodeKind::SubZone, NodeId::Zone(_)) => NodeKind::Container,
        };
        let parent_dimensions = parent_node.dimensions;
        let capacity = self.check_new(&new)?;
        new.dimensions.ensure_fits_within(&parent_dimensions)?;

        self.push_node(
            CapacityNode {
                id: new.id,
                kind,
                parent: Some(parent_idx),
                children: Vec::new(),
                name: new.name,
                dimensions: new.dimensions,
                capacity,
                can_store_items: new.can_store_items || kind == NodeKind::Container,
                persisted: !new.id.is_provisional(),
                metrics: CapacityMetrics::default(),
            },
            Some(parent_idx),
        );
        Ok(new.id)
    }

    fn check_new(&self, new: &NewNode) -> DomainResult<f64> {
        if self.index.contains_key(&new.id) {
            return Err(DomainError::conflict(format!("{} already exists", new.id)));
        }
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        new.dimensions.validate()?;
        let capacity = new.capacity.unwrap_or_else(|| new.dimensions.volume());
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(DomainError::validation("capacity must be a non-negative number"));
        }
        Ok(capacity)
    }

    /// Recompute metrics for the whole tree that contains `id`.
    ///
    /// Bottom-up, O(n) in the size of that tree, idempotent.
    pub fn recompute_capacities(&mut self, id: NodeId) -> DomainResult<()> {
        let idx = self.index_of(id)?;
        let root = self.root_index(idx);
        self.recompute_from(root);
        Ok(())
    }

    pub fn recompute_all(&mut self) {
        for root in self.roots.clone() {
            self.recompute_from(root);
        }
    }

    fn recompute_from(&mut self, root: usize) {
        // Pre-order walk; reversed, every node comes after its descendants.
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if let Some(node) = self.slot(idx) {
                order.push(idx);
                stack.extend(node.children.iter().copied());
            }
        }

        for &idx in order.iter().rev() {
            let Some(node) = self.slot(idx) else {
                continue;
            };
            let occupied: f64 = node
                .children
                .iter()
                .filter_map(|&c| self.slot(c))
                .map(|child| match child.kind {
                    NodeKind::Container => child.capacity,
                    NodeKind::Cabinet | NodeKind::SubZone => child.metrics.occupied_volume,
                })
                .sum();
            if let Some(node) = self.slot_mut(idx) {
                node.metrics = CapacityMetrics::compute(node.capacity, occupied);
            }
        }
    }

    /// Detach `id` and its whole sub-tree; returns every removed id.
    ///
    /// Ancestors keep their stale metrics until `recompute_capacities` runs.
    pub fn remove_node(&mut self, id: NodeId) -> DomainResult<Vec<NodeId>> {
        let idx = self.index_of(id)?;
        match self.slot(idx).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(parent) = self.slot_mut(parent) {
                    parent.children.retain(|&c| c != idx);
                }
            }
            None => self.roots.retain(|&r| r != idx),
        }

        let mut removed = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(i).and_then(Option::take) {
                self.index.remove(&node.id);
                removed.push(node.id);
                stack.extend(node.children);
            }
        }
        Ok(removed)
    }

    /// Change the dimensions of a node that was never saved.
    pub fn resize(&mut self, id: NodeId, dimensions: Dimensions) -> DomainResult<()> {
        let idx = self.index_of(id)?;
        let node = self.slot(idx).ok_or_else(|| DomainError::not_found(id.to_string()))?;
        if node.persisted {
            return Err(DomainError::validation(format!(
                "{id} has been saved; its dimensions can no longer change"
            )));
        }
        dimensions.validate()?;
        if let Some(parent) = node.parent.and_then(|p| self.slot(p)) {
            dimensions.ensure_fits_within(&parent.dimensions)?;
        }
        for child in node.children.iter().filter_map(|&c| self.slot(c)) {
            child.dimensions.ensure_fits_within(&dimensions)?;
        }

        if let Some(node) = self.slot_mut(idx) {
            node.dimensions = dimensions;
            if node.id.as_zone().is_some() {
                node.capacity = dimensions.volume();
            }
        }
        Ok(())
    }

    /// Rename a zone and toggle whether it stores items.
    pub fn update_settings(&mut self, id: ZoneId, name: &str, can_store_items: bool) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let idx = self.index_of(NodeId::Zone(id))?;
        if let Some(node) = self.slot_mut(idx) {
            node.name = name.trim().to_string();
            node.can_store_items = can_store_items || node.kind == NodeKind::Container;
        }
        Ok(())
    }

    /// Replace a provisional id with the one the server assigned.
    pub fn mark_persisted(&mut self, provisional: NodeId, confirmed: NodeId) -> DomainResult<()> {
        let same_space = matches!(
            (provisional, confirmed),
            (NodeId::Zone(_), NodeId::Zone(_)) | (NodeId::Container(_), NodeId::Container(_))
        );
        if !same_space {
            return Err(DomainError::invariant(format!(
                "cannot confirm {provisional} as {confirmed}"
            )));
        }
        if provisional != confirmed && self.index.contains_key(&confirmed) {
            return Err(DomainError::conflict(format!("{confirmed} already exists")));
        }
        let idx = self.index_of(provisional)?;
        self.index.remove(&provisional);
        self.index.insert(confirmed, idx);
        if let Some(node) = self.slot_mut(idx) {
            node.id = confirmed;
            node.persisted = true;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&CapacityNode> {
        self.index.get(&id).and_then(|&idx| self.slot(idx))
    }

    pub fn metrics(&self, id: NodeId) -> Option<CapacityMetrics> {
        self.node(id).map(|n| n.metrics)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        node.parent.and_then(|p| self.slot(p)).map(|p| p.id)
    }

    pub fn children(&self, id: NodeId) -> Vec<&CapacityNode> {
        self.node(id)
            .map(|n| n.children.iter().filter_map(|&c| self.slot(c)).collect())
            .unwrap_or_default()
    }

    /// Cabinets in load order.
    pub fn cabinets(&self) -> impl Iterator<Item = &CapacityNode> + '_ {
        self.roots.iter().filter_map(|&r| self.slot(r))
    }

    /// `id` followed by each ancestor up to its cabinet.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.index.get(&id).copied();
        while let Some(node) = current.and_then(|idx| self.slot(idx)) {
            path.push(node.id);
            current = node.parent;
        }
        path
    }

    /// Container ids directly attached to `zone`.
    pub fn containers_of(&self, zone: ZoneId) -> Vec<ContainerId> {
        self.children(NodeId::Zone(zone))
            .into_iter()
            .filter_map(|c| c.id.as_container())
            .collect()
    }

    /// Totals across all cabinets.
    pub fn warehouse_summary(&self) -> WarehouseCapacity {
        let (cabinets, capacity, occupied) = self
            .cabinets()
            .fold((0usize, 0.0f64, 0.0f64), |(n, cap, occ), c| {
                (n + 1, cap + c.capacity, occ + c.metrics.occupied_volume)
            });
        WarehouseCapacity {
            cabinets,
            capacity,
            metrics: CapacityMetrics::compute(capacity, occupied),
        }
    }

    /// Cabinets whose name contains `query` (case-insensitive). An empty
    /// query keeps every cabinet.
    pub fn filter_by_name(&self, query: &str) -> Vec<ZoneId> {
        let needle = query.trim().to_lowercase();
        self.cabinets()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .filter_map(|c| c.id.as_zone())
            .collect()
    }

    /// Cabinets matching `name_query`, or holding a matching item in an
    /// item-bearing descendant. Blank queries impose no condition; when both
    /// are blank every cabinet is kept.
    pub fn filter_with_items(&self, name_query: &str, item_query: &str, items: &[InventoryItem]) -> Vec<ZoneId> {
        let name_needle = name_query.trim().to_lowercase();
        let item_needle = item_query.trim();
        if item_needle.is_empty() {
            return self.filter_by_name(&name_needle);
        }

        let mut item_hits: HashSet<usize> = HashSet::new();
        for item in items.iter().filter(|i| i.matches(item_needle)) {
            let holder = item
                .warehouse_container_id
                .and_then(|c| self.index.get(&NodeId::Container(c)))
                .or_else(|| self.index.get(&NodeId::Zone(item.warehouse_zone_id)))
                .copied();
            let Some(idx) = holder else {
                continue;
            };
            match self.slot(idx) {
                Some(node) if node.parent.is_some() && node.is_item_bearing() => {
                    item_hits.insert(self.root_index(idx));
                }
                _ => {}
            }
        }

        self.roots
            .iter()
            .filter_map(|&r| self.slot(r).map(|n| (r, n)))
            .filter(|(r, cabinet)| {
                let by_name = !name_needle.is_empty() && cabinet.name.to_lowercase().contains(&name_needle);
                by_name || item_hits.contains(r)
            })
            .filter_map(|(_, c)| c.id.as_zone())
            .collect()
    }
}
