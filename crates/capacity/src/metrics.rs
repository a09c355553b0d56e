//! Derived volume figures.

use serde::Serialize;

/// Occupied/free volume and fill percentage of one node.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityMetrics {
    pub occupied_volume: f64,
    /// Never negative, even when children over-allocate the node.
    pub free_volume: f64,
    /// Clamped to `0..=100`; `0` when capacity is `0`.
    pub fill_percentage: u8,
    /// `occupied / capacity`, unclamped (may exceed `1.0`).
    pub occupancy_ratio: f64,
}

impl CapacityMetrics {
    pub fn compute(capacity: f64, occupied_volume: f64) -> Self {
        let free_volume = (capacity - occupied_volume).max(0.0);
        if capacity <= 0.0 {
            return Self {
                occupied_volume,
                free_volume,
                fill_percentage: 0,
                occupancy_ratio: 0.0,
            };
        }
        let fill = (100.0 * (capacity - free_volume) / capacity).round();
        Self {
            occupied_volume,
            free_volume,
            fill_percentage: fill.clamp(0.0, 100.0) as u8,
            occupancy_ratio: occupied_volume / capacity,
        }
    }

    pub fn is_over_allocated(&self) -> bool {
        self.occupancy_ratio > 1.0
    }
}

/// Warehouse-level totals over all cabinets.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseCapacity {
    pub cabinets: usize,
    pub capacity: f64,
    #[serde(flatten)]
    pub metrics: CapacityMetrics,
}
