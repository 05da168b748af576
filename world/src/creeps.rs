//! Registry of creeps currently on the board.

use std::collections::BTreeMap;

use tower_defence_core::{CellCoord, CreepId, CreepKind, CreepSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CreepState {
    pub(crate) kind: CreepKind,
    pub(crate) cell: CellCoord,
}

/// Arena of creeps keyed by identifier. Identifiers are never reused.
#[derive(Debug)]
pub(crate) struct CreepRegistry {
    entries: BTreeMap<CreepId, CreepState>,
    next_creep_id: CreepId,
}

impl CreepRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_creep_id: CreepId::new(0),
        }
    }

    pub(crate) fn peek_next_id(&self) -> CreepId {
        self.next_creep_id
    }

    pub(crate) fn insert(&mut self, kind: CreepKind, cell: CellCoord) -> CreepId {
        let id = self.next_creep_id;
        self.next_creep_id = CreepId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, CreepState { kind, cell });
        id
    }

    pub(crate) fn get(&self, id: CreepId) -> Option<CreepState> {
        self.entries.get(&id).copied()
    }

    pub(crate) fn relocate(&mut self, id: CreepId, cell: CellCoord) {
        if let Some(state) = self.entries.get_mut(&id) {
            state.cell = cell;
        }
    }

    pub(crate) fn remove(&mut self, id: CreepId) -> Option<CreepState> {
        self.entries.remove(&id)
    }

    pub(crate) fn snapshots(&self) -> Vec<CreepSnapshot> {
        self.entries
            .iter()
            .map(|(&id, state)| CreepSnapshot {
                id,
                kind: state.kind,
                cell: state.cell,
            })
            .collect()
    }
}
