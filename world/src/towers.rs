//! Authoritative tower state management utilities.

use std::collections::{BTreeMap, BTreeSet};

use tower_defence_core::{CellCoord, CellRect, TowerId, TowerKind, TowerSnapshot};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Current level, counting from zero.
    pub(crate) level: u8,
    /// Region of cells occupied by the tower.
    pub(crate) region: CellRect,
    /// Cells the tower registered itself with.
    pub(crate) targeted: BTreeSet<CellCoord>,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            level: self.level,
            region: self.region,
        }
    }

    /// Firing range at the current level.
    pub(crate) fn range(&self) -> f64 {
        self.kind.range(self.level)
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a new tower at level zero and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, region: CellRect) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                level: 0,
                region,
                targeted: BTreeSet::new(),
            },
        );
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }
}

/// Cells whose centres lie within `range` of the centre of a tower footprint.
///
/// Cell centres sit on integer coordinates, so a two-by-two footprint anchored
/// at `(i, j)` aims from `(i + 0.5, j + 0.5)`. The scan is clamped to the grid.
pub(crate) fn cells_in_range(
    region: CellRect,
    range: f64,
    columns: u32,
    rows: u32,
) -> Vec<CellCoord> {
    if columns == 0 || rows == 0 {
        return Vec::new();
    }

    let size = region.size();
    let centre_i = f64::from(region.origin().column()) + f64::from(size.width()) / 2.0 - 0.5;
    let centre_j = f64::from(region.origin().row()) + f64::from(size.height()) / 2.0 - 0.5;

    let min_i = clamp_to_axis((centre_i - range).floor(), columns);
    let max_i = clamp_to_axis((centre_i + range).ceil(), columns);
    let min_j = clamp_to_axis((centre_j - range).floor(), rows);
    let max_j = clamp_to_axis((centre_j + range).ceil(), rows);

    let range_squared = range * range;
    let mut cells = Vec::new();
    for row in min_j..=max_j {
        for column in min_i..=max_i {
            let di = f64::from(column) - centre_i;
            let dj = f64::from(row) - centre_j;
            if di * di + dj * dj <= range_squared {
                cells.push(CellCoord::new(column, row));
            }
        }
    }
    cells
}

fn clamp_to_axis(value: f64, length: u32) -> u32 {
    let max = f64::from(length - 1);
    // Clamped into [0, length - 1] so the cast cannot truncate.
    value.clamp(0.0, max) as u32
}
