//! Multi-root shortest-path tree grown from every exit cell.

use thiserror::Error;
use tower_defence_core::{CellCoord, NavDirection, NodeState};
use tracing::trace;

use crate::priority_queue::{PriorityQueue, QueueError};

/// Failures raised while growing a [`ShortestPathTree`].
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SptError {
    /// The frontier misbehaved. Indicates a corrupted computation.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// The tree is still pending yet nothing remains on the frontier.
    #[error("shortest-path tree is pending but its frontier is empty")]
    FrontierExhausted,
}

/// Progress of a single cell through the Dijkstra computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeState {
    /// Not yet discovered.
    Init,
    /// Discovered and waiting on the frontier.
    Reachable,
    /// Finalised. Blocked cells start here with an infinite cost.
    Done,
}

/// Per-cell computation record. Rebuilt from scratch for every tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SptState {
    cost: f64,
    direction: Option<NavDirection>,
    tree_state: TreeState,
}

impl SptState {
    fn root() -> Self {
        Self {
            cost: 0.0,
            direction: Some(NavDirection::ARRIVED),
            tree_state: TreeState::Done,
        }
    }

    fn unreachable() -> Self {
        Self {
            cost: f64::INFINITY,
            direction: None,
            tree_state: TreeState::Done,
        }
    }

    fn undiscovered() -> Self {
        Self {
            cost: f64::INFINITY,
            direction: None,
            tree_state: TreeState::Init,
        }
    }

    /// Best known distance to the nearest exit, infinite until discovered.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Step toward the neighbour that produced the current cost.
    #[must_use]
    pub fn direction(&self) -> Option<NavDirection> {
        self.direction
    }

    /// Current phase of the cell within the computation.
    #[must_use]
    pub fn tree_state(&self) -> TreeState {
        self.tree_state
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pending,
    Complete,
}

/// Dijkstra computation over an eight-connected grid rooted at every exit.
///
/// Orthogonal steps cost `1` and diagonal steps cost `sqrt(2)`. A diagonal
/// step is skipped outright when either orthogonal cell flanking it blocks
/// traversal, so paths never cut around the corner of a wall or tower.
///
/// The tree copies what it needs from the grid during construction and keeps
/// no reference to it. [`ShortestPathTree::step`] finalises one frontier cell
/// at a time while [`ShortestPathTree::run`] drives the computation to
/// completion.
#[derive(Clone, Debug)]
pub struct ShortestPathTree {
    columns: u32,
    rows: u32,
    states: Vec<SptState>,
    blocked: Vec<bool>,
    frontier: PriorityQueue<usize>,
    must_reach: Vec<usize>,
    phase: Phase,
}

impl ShortestPathTree {
    /// Seeds a tree from the node states reported by `state_at`.
    ///
    /// Exits become finished roots with cost zero, blocking cells become
    /// finished unreachable cells, and every root is expanded once so its
    /// open neighbours join the frontier. A grid whose frontier is empty
    /// after seeding is already complete.
    pub fn new<F>(columns: u32, rows: u32, mut state_at: F) -> Result<Self, SptError>
    where
        F: FnMut(CellCoord) -> NodeState,
    {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut states = Vec::with_capacity(capacity);
        let mut blocked = Vec::with_capacity(capacity);
        let mut roots = Vec::new();
        let mut must_reach = Vec::new();

        for row in 0..rows {
            for column in 0..columns {
                let index = states.len();
                let state = state_at(CellCoord::new(column, row));
                blocked.push(state.is_blocking());
                let spt_state = match state {
                    NodeState::Exit => {
                        roots.push(index);
                        SptState::root()
                    }
                    NodeState::Blocked | NodeState::Tower => SptState::unreachable(),
                    NodeState::Populated | NodeState::Entrance => {
                        must_reach.push(index);
                        SptState::undiscovered()
                    }
                    NodeState::Open => SptState::undiscovered(),
                };
                states.push(spt_state);
            }
        }

        let mut tree = Self {
            columns,
            rows,
            states,
            blocked,
            frontier: PriorityQueue::new(),
            must_reach,
            phase: Phase::Pending,
        };

        for root in roots {
            tree.expand(root)?;
        }
        if tree.frontier.is_empty() {
            tree.finish();
        }

        Ok(tree)
    }

    /// Finalises the cheapest frontier cell and relaxes its neighbours.
    ///
    /// Returns the finalised cell, or `None` when the tree was already
    /// complete.
    pub fn step(&mut self) -> Result<Option<CellCoord>, SptError> {
        if self.phase == Phase::Complete {
            return Ok(None);
        }
        if self.frontier.is_empty() {
            return Err(SptError::FrontierExhausted);
        }

        let index = self.frontier.pop()?;
        self.expand(index)?;
        if self.frontier.is_empty() {
            self.finish();
        }
        Ok(Some(self.coord(index)))
    }

    /// Steps until the frontier is empty. A complete tree is left untouched.
    pub fn run(&mut self) -> Result<(), SptError> {
        while self.phase == Phase::Pending {
            let _ = self.step()?;
        }
        Ok(())
    }

    /// Reports whether the computation finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Reports whether every populated and entrance cell reached an exit.
    ///
    /// Incomplete trees are never valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_complete()
            && self
                .must_reach
                .iter()
                .all(|&index| self.states[index].tree_state == TreeState::Done)
    }

    /// Width of the grid the tree was built over.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the grid the tree was built over.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells waiting on the frontier.
    #[must_use]
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Computation record for the provided cell.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<&SptState> {
        self.index(cell).map(|index| &self.states[index])
    }

    /// Best known cost for the provided cell.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> Option<f64> {
        self.state(cell).map(SptState::cost)
    }

    /// Next step recorded for the provided cell.
    #[must_use]
    pub fn direction(&self, cell: CellCoord) -> Option<NavDirection> {
        self.state(cell).and_then(SptState::direction)
    }

    /// Iterates every cell in row-major order alongside its record.
    pub fn states(&self) -> impl Iterator<Item = (CellCoord, &SptState)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (self.coord(index), state))
    }

    /// Renders the cost grid as text, highest row first.
    #[must_use]
    pub fn dump_costs(&self) -> String {
        let mut dump = String::new();
        for row in (0..self.rows).rev() {
            let line: Vec<String> = (0..self.columns)
                .filter_map(|column| self.cost(CellCoord::new(column, row)))
                .map(|cost| format!("{cost:.2}"))
                .collect();
            dump.push_str(&line.join(" "));
            dump.push('\n');
        }
        dump
    }

    fn expand(&mut self, index: usize) -> Result<(), SptError> {
        let cell = self.coord(index);
        let base_cost = self.states[index].cost;

        for dj in -1..=1_i8 {
            for di in -1..=1_i8 {
                if di == 0 && dj == 0 {
                    continue;
                }
                let Some(neighbour_cell) =
                    cell.offset(i32::from(di), i32::from(dj), self.columns, self.rows)
                else {
                    continue;
                };
                let Some(neighbour) = self.index(neighbour_cell) else {
                    continue;
                };
                if self.states[neighbour].tree_state == TreeState::Done {
                    continue;
                }
                let Some(direction) = NavDirection::new(-di, -dj) else {
                    continue;
                };
                if direction.is_diagonal()
                    && (self.is_blocked_at(cell, 0, dj) || self.is_blocked_at(cell, di, 0))
                {
                    continue;
                }

                let cost = base_cost + direction.step_cost();
                let record = &mut self.states[neighbour];
                let was_init = record.tree_state == TreeState::Init;
                if !was_init && record.cost <= cost {
                    continue;
                }

                record.cost = cost;
                record.direction = Some(direction);
                record.tree_state = TreeState::Reachable;
                if was_init {
                    self.frontier.push(neighbour, cost);
                } else {
                    self.frontier.decrease_key(&neighbour, cost)?;
                }
            }
        }

        self.states[index].tree_state = TreeState::Done;
        Ok(())
    }

    fn finish(&mut self) {
        self.phase = Phase::Complete;
        trace!(
            columns = self.columns,
            rows = self.rows,
            valid = self.is_valid(),
            "shortest-path tree complete"
        );
    }

    fn is_blocked_at(&self, cell: CellCoord, di: i8, dj: i8) -> bool {
        cell.offset(i32::from(di), i32::from(dj), self.columns, self.rows)
            .and_then(|corner| self.index(corner))
            .map_or(true, |index| self.blocked[index])
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let columns = usize::try_from(self.columns).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(columns)?.checked_add(column)
    }

    fn coord(&self, index: usize) -> CellCoord {
        let columns = usize::try_from(self.columns).unwrap_or(usize::MAX).max(1);
        let column = u32::try_from(index % columns).unwrap_or(u32::MAX);
        let row = u32::try_from(index / columns).unwrap_or(u32::MAX);
        CellCoord::new(column, row)
    }
}
