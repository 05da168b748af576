//! Navigation slot that tracks the promoted shortest-path tree.

use tower_defence_system_pathfinding::ShortestPathTree;

/// Tracks whether the promoted navigation fields still describe the board.
///
/// A tree that is being stepped for inspection lives in `pending` until it
/// completes. Every structural change drops it, and so does every creep that
/// spawns, moves or leaves, because the tree copied the grid it was seeded
/// from.
#[derive(Clone, Debug, Default)]
pub(crate) struct Navigation {
    pending: Option<ShortestPathTree>,
    valid: bool,
}

impl Navigation {
    pub(crate) fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the promoted fields stale and discards any pending tree.
    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
        self.pending = None;
    }

    /// Drops the pending tree without touching the promoted fields.
    pub(crate) fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Records that a complete, valid tree was just promoted.
    pub(crate) fn mark_promoted(&mut self) {
        self.valid = true;
        self.pending = None;
    }

    pub(crate) fn take_pending(&mut self) -> Option<ShortestPathTree> {
        self.pending.take()
    }

    pub(crate) fn park(&mut self, tree: ShortestPathTree) {
        self.pending = Some(tree);
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
