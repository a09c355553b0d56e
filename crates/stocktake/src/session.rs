use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use wareops_core::{DomainError, DomainResult, InventoryId, WarehouseId, ZoneId};
use wareops_inventory::{InventoryItem, ItemKey};

use crate::line::{parse_quantity, StocktakeLine};
use crate::progress::{CheckStatus, InventoryCheck, SubmitLine};
use crate::report::DiscrepancyReport;

/// Client-side lifecycle of a stocktake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StocktakeStatus {
    NotStarted,
    InProgress,
    Submitted,
}

/// Working copy of one stocktake against one warehouse.
#[derive(Debug, Clone, PartialEq)]
pub struct StocktakeSession {
    warehouse_id: WarehouseId,
    inventory_id: Option<InventoryId>,
    status: StocktakeStatus,
    /// In selection order; lines are kept grouped in this order.
    selected: Vec<ZoneId>,
    processed: BTreeSet<ZoneId>,
    lines: Vec<StocktakeLine>,
}

impl StocktakeSession {
    pub fn new(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id,
            inventory_id: None,
            status: StocktakeStatus::NotStarted,
            selected: Vec::new(),
            processed: BTreeSet::new(),
            lines: Vec::new(),
        }
    }

    /// Rebuild an interrupted stocktake purely from the server's record.
    ///
    /// Processed zones become unselectable, lines are seeded from the
    /// recorded items, and the selection is the distinct zones of those
    /// items (in first-seen order).
    pub fn resume(check: InventoryCheck) -> DomainResult<Self> {
        if check.status != CheckStatus::InProgress {
            return Err(DomainError::conflict(format!(
                "stocktake {} is already completed",
                check.id
            )));
        }

        let mut session = Self::new(check.warehouse_id);
        session.inventory_id = Some(check.id);
        session.status = StocktakeStatus::InProgress;
        session.processed = check.processed_zone_ids.iter().copied().collect();

        let mut seen: HashSet<ItemKey> = HashSet::new();
        for recorded in &check.items {
            let mut line = StocktakeLine::from_item(&recorded.item);
            if let Some(actual) = recorded.actual_quantity {
                line.actual_quantity = actual;
            }
            if !seen.insert(line.key()) {
                tracing::warn!(inventory_id = %check.id, zone_id = %line.zone_id, "dropping duplicate recorded line");
                continue;
            }
            if !session.selected.contains(&line.zone_id) {
                session.selected.push(line.zone_id);
            }
            session.lines.push(line);
        }
        session.sort_lines();
        Ok(session)
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn inventory_id(&self) -> Option<InventoryId> {
        self.inventory_id
    }

    pub fn status(&self) -> StocktakeStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == StocktakeStatus::InProgress
    }

    pub fn selected_zones(&self) -> &[ZoneId] {
        &self.selected
    }

    pub fn processed_zones(&self) -> &BTreeSet<ZoneId> {
        &self.processed
    }

    pub fn is_selectable(&self, zone: ZoneId) -> bool {
        !self.processed.contains(&zone)
    }

    pub fn lines(&self) -> &[StocktakeLine] {
        &self.lines
    }

    pub fn discrepancy(&self, index: usize) -> Option<f64> {
        self.lines.get(index).map(StocktakeLine::discrepancy)
    }

    pub fn report(&self) -> DiscrepancyReport {
        DiscrepancyReport::from_lines(&self.lines)
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DomainError::validation("no stocktake session is open"))
        }
    }

    /// `NOT_STARTED → IN_PROGRESS` once the server has assigned an id.
    pub fn begin(&mut self, inventory_id: InventoryId) -> DomainResult<()> {
        match self.status {
            StocktakeStatus::NotStarted => {
                self.inventory_id = Some(inventory_id);
                self.status = StocktakeStatus::InProgress;
                Ok(())
            }
            StocktakeStatus::InProgress if self.inventory_id == Some(inventory_id) => Ok(()),
            _ => Err(DomainError::conflict(format!(
                "stocktake for warehouse {} has already been started",
                self.warehouse_id
            ))),
        }
    }

    /// Add zones to the selection; returns the ones that still need their
    /// items fetched. Already-selected zones are a no-op; processed zones are
    /// rejected (nothing is selected in that case).
    pub fn select_zones(&mut self, zone_ids: &[ZoneId]) -> DomainResult<Vec<ZoneId>> {
        self.ensure_open()?;
        if let Some(zone) = zone_ids.iter().find(|z| self.processed.contains(*z)) {
            return Err(DomainError::validation(format!(
                "zone {zone} was already counted in this stocktake"
            )));
        }

        let mut added = Vec::new();
        for &zone in zone_ids {
            if !self.selected.contains(&zone) {
                self.selected.push(zone);
                added.push(zone);
            }
        }
        Ok(added)
    }

    /// Merge a zone's item snapshot. Lines are keyed by
    /// `(nomenclature, container, zone)`, so applying the same snapshot twice
    /// (or out of order) changes nothing. Snapshots for zones that are no
    /// longer selected are ignored. Returns the number of new lines.
    pub fn apply_zone_items(&mut self, zone: ZoneId, items: &[InventoryItem]) -> usize {
        if !self.is_open() || !self.selected.contains(&zone) {
            tracing::debug!(zone_id = %zone, "ignoring items for a zone that is not selected");
            return 0;
        }

        let mut existing: HashSet<ItemKey> = self.lines.iter().map(StocktakeLine::key).collect();
        let mut added = 0;
        for item in items {
            if item.warehouse_zone_id != zone {
                tracing::warn!(
                    zone_id = %zone,
                    item_zone_id = %item.warehouse_zone_id,
                    "skipping item reported for another zone"
                );
                continue;
            }
            if existing.insert(item.key()) {
                self.lines.push(StocktakeLine::from_item(item));
                added += 1;
            }
        }
        if added > 0 {
            self.sort_lines();
        }
        added
    }

    /// Drop a zone and all of its lines.
    pub fn deselect_zone(&mut self, zone: ZoneId) -> DomainResult<usize> {
        self.ensure_open()?;
        if self.processed.contains(&zone) {
            return Err(DomainError::validation(format!(
                "zone {zone} was already counted and cannot be removed"
            )));
        }
        let before = self.lines.len();
        self.selected.retain(|z| *z != zone);
        self.lines.retain(|l| l.zone_id != zone);
        Ok(before - self.lines.len())
    }

    /// Set a counted quantity from user input; non-numeric input becomes `0`.
    pub fn edit_quantity(&mut self, index: usize, raw: &str) -> DomainResult<f64> {
        self.ensure_open()?;
        let line = self
            .lines
            .get_mut(index)
            .ok_or_else(|| DomainError::not_found(format!("stocktake line {index}")))?;
        let (value, clean) = parse_quantity(raw);
        line.actual_quantity = value;
        line.raw_input = if clean { None } else { Some(raw.to_string()) };
        Ok(value)
    }

    pub fn set_actual_quantity(&mut self, index: usize, value: f64) -> DomainResult<()> {
        self.ensure_open()?;
        let line = self
            .lines
            .get_mut(index)
            .ok_or_else(|| DomainError::not_found(format!("stocktake line {index}")))?;
        line.actual_quantity = value;
        line.raw_input = None;
        Ok(())
    }

    /// Lines whose counted quantity differs from the expected one.
    ///
    /// Unchanged lines are never transmitted. A resumed line starts from the
    /// count the server already recorded, so that count goes out again with
    /// the rest; the server keys counts by item, zone and container, and a
    /// repeated count replaces itself.
    pub fn prepare_submission(&self) -> DomainResult<Vec<SubmitLine>> {
        self.ensure_open()?;
        let mut payload = Vec::new();
        for (index, line) in self.lines.iter().enumerate().filter(|(_, l)| l.is_changed()) {
            if !line.actual_quantity.is_finite() || line.actual_quantity < 0.0 {
                return Err(DomainError::validation(format!(
                    "line {}: counted quantity must be a non-negative number",
                    index + 1
                )));
            }
            payload.push(SubmitLine {
                nomenclature_id: line.nomenclature_id,
                warehouse_zone_id: line.zone_id,
                container_id: line.container_id,
                actual_quantity: line.actual_quantity,
            });
        }
        if payload.is_empty() {
            return Err(DomainError::EmptySubmission);
        }
        Ok(payload)
    }

    /// `IN_PROGRESS → SUBMITTED`; the working copy is dropped.
    pub fn mark_submitted(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        self.status = StocktakeStatus::Submitted;
        self.selected.clear();
        self.lines.clear();
        Ok(())
    }

    fn sort_lines(&mut self) {
        let rank: HashMap<ZoneId, usize> = self
            .selected
            .iter()
            .enumerate()
            .map(|(i, z)| (*z, i))
            .collect();
        self.lines
            .sort_by_key(|l| rank.get(&l.zone_id).copied().unwrap_or(usize::MAX));
    }
}
