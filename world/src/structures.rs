//! Registry of walls, entrances and exits.

use std::collections::BTreeMap;

use tower_defence_core::{CellCoord, StructureId, StructureKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StructureState {
    pub(crate) kind: StructureKind,
    pub(crate) cell: CellCoord,
}

/// Arena of single-cell structures keyed by identifier.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, StructureState>,
    next_structure_id: StructureId,
}

impl StructureRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_structure_id: StructureId::new(0),
        }
    }

    /// Identifier the next insertion will receive.
    pub(crate) fn peek_next_id(&self) -> StructureId {
        self.next_structure_id
    }

    pub(crate) fn insert(&mut self, kind: StructureKind, cell: CellCoord) -> StructureId {
        let id = self.next_structure_id;
        self.next_structure_id = StructureId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, StructureState { kind, cell });
        id
    }

    pub(crate) fn get(&self, id: StructureId) -> Option<StructureState> {
        self.entries.get(&id).copied()
    }

    pub(crate) fn remove(&mut self, id: StructureId) -> Option<StructureState> {
        self.entries.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
