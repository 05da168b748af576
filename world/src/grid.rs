//! Dense grid of nodes that records occupancy and promoted navigation data.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tower_defence_core::{CellCoord, CreepId, NavDirection, NodeState, OccupantId, TowerId};

/// Contract violations raised by [`GridNode`] mutations.
///
/// Every variant signals corrupted bookkeeping. The world stops applying the
/// offending command and reports the error to its caller.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The creep is already registered on the cell.
    #[error("creep {creep:?} is already registered on {cell:?}")]
    DuplicateCreep {
        /// Creep named by the request.
        creep: CreepId,
        /// Cell that already holds the creep.
        cell: CellCoord,
    },
    /// The creep is not registered on the cell.
    #[error("creep {creep:?} is not registered on {cell:?}")]
    MissingCreep {
        /// Creep named by the request.
        creep: CreepId,
        /// Cell that was expected to hold the creep.
        cell: CellCoord,
    },
    /// The creep was released as flying while registered as ground, or the reverse.
    #[error("creep {creep:?} on {cell:?} was registered with flying = {registered}")]
    FlightMismatch {
        /// Creep named by the request.
        creep: CreepId,
        /// Cell that holds the creep.
        cell: CellCoord,
        /// Flight mode recorded when the creep was admitted.
        registered: bool,
    },
    /// A ground creep was sent into a cell it cannot stand in.
    #[error("ground creep {creep:?} cannot enter {cell:?} while it is {state:?}")]
    NotEnterable {
        /// Creep named by the request.
        creep: CreepId,
        /// Cell the creep tried to enter.
        cell: CellCoord,
        /// State that refused the creep.
        state: NodeState,
    },
    /// An occupant was added to a cell that is not open.
    #[error("cannot place an occupant on {cell:?} while it is {state:?}")]
    CellOccupied {
        /// Cell named by the request.
        cell: CellCoord,
        /// State that refused the occupant.
        state: NodeState,
    },
    /// An occupant was removed by an identifier that does not hold the cell.
    #[error("occupant {requested:?} does not hold {cell:?}")]
    OccupantMismatch {
        /// Cell named by the request.
        cell: CellCoord,
        /// Identifier provided by the caller.
        requested: OccupantId,
    },
    /// An occupant was removed while ground creeps stand on the cell.
    #[error("cannot clear {cell:?} while ground creeps stand on it")]
    Populated {
        /// Cell named by the request.
        cell: CellCoord,
    },
    /// A tower registered twice for the same cell.
    #[error("tower {tower:?} already targets {cell:?}")]
    DuplicateTargetingTower {
        /// Tower named by the request.
        tower: TowerId,
        /// Cell the tower already targets.
        cell: CellCoord,
    },
    /// A tower unregistered from a cell it never targeted.
    #[error("tower {tower:?} does not target {cell:?}")]
    MissingTargetingTower {
        /// Tower named by the request.
        tower: TowerId,
        /// Cell the tower was expected to target.
        cell: CellCoord,
    },
    /// Both halves of a paired borrow named the same cell.
    #[error("{cell:?} cannot be borrowed twice")]
    AliasedCell {
        /// Cell named twice.
        cell: CellCoord,
    },
    /// The cell lies outside the grid.
    #[error("{cell:?} lies outside the grid")]
    OutOfBounds {
        /// Cell named by the request.
        cell: CellCoord,
    },
}

/// Towers that must learn about a creep crossing between two cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeTransition {
    /// Towers targeting the source cell but not the destination.
    pub left: Vec<TowerId>,
    /// Towers targeting the destination cell but not the source.
    pub entered: Vec<TowerId>,
}

/// Occupancy and navigation record of a single cell.
#[derive(Clone, Debug, PartialEq)]
pub struct GridNode {
    cell: CellCoord,
    state: NodeState,
    creeps: BTreeMap<CreepId, bool>,
    ground_creeps: u32,
    flying_creeps: u32,
    occupant: Option<OccupantId>,
    targeting_towers: BTreeSet<TowerId>,
    spt_cost: f64,
    nav_direction: Option<NavDirection>,
}

impl GridNode {
    /// Creates an open node with no promoted navigation data.
    #[must_use]
    pub fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            state: NodeState::Open,
            creeps: BTreeMap::new(),
            ground_creeps: 0,
            flying_creeps: 0,
            occupant: None,
            targeting_towers: BTreeSet::new(),
            spt_cost: f64::INFINITY,
            nav_direction: None,
        }
    }

    /// Coordinate of the node.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current occupancy state.
    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Assigns the state directly. The caller keeps the invariants intact.
    pub fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    /// Creeps registered on the node, ground and flying alike.
    pub fn creeps(&self) -> impl Iterator<Item = CreepId> + '_ {
        self.creeps.keys().copied()
    }

    /// Number of ground creeps on the node.
    #[must_use]
    pub fn ground_creeps(&self) -> u32 {
        self.ground_creeps
    }

    /// Number of flying creeps above the node.
    #[must_use]
    pub fn flying_creeps(&self) -> u32 {
        self.flying_creeps
    }

    /// Non-creep occupant holding the node.
    #[must_use]
    pub fn occupant(&self) -> Option<OccupantId> {
        self.occupant
    }

    /// Towers that have the node within range.
    pub fn targeting_towers(&self) -> impl Iterator<Item = TowerId> + '_ {
        self.targeting_towers.iter().copied()
    }

    /// Promoted cost to the nearest exit.
    #[must_use]
    pub fn spt_cost(&self) -> f64 {
        self.spt_cost
    }

    /// Promoted step toward the nearest exit.
    #[must_use]
    pub fn nav_direction(&self) -> Option<NavDirection> {
        self.nav_direction
    }

    pub(crate) fn promote(&mut self, cost: f64, direction: Option<NavDirection>) {
        self.spt_cost = cost;
        self.nav_direction = direction;
    }

    /// Registers a newly spawned creep and returns the towers to notify.
    ///
    /// An open node becomes populated when its first ground creep arrives.
    /// Entrances keep their state.
    pub fn add_creep(&mut self, creep: CreepId, flying: bool) -> Result<Vec<TowerId>, GridError> {
        self.check_can_admit(creep, flying)?;
        self.admit(creep, flying);
        Ok(self.targeting_towers().collect())
    }

    /// Unregisters a creep that died or left and returns the towers to notify.
    ///
    /// A populated node reverts to open once its last ground creep leaves.
    pub fn remove_creep(
        &mut self,
        creep: CreepId,
        flying: bool,
    ) -> Result<Vec<TowerId>, GridError> {
        self.check_can_release(creep, flying)?;
        self.release(creep, flying);
        Ok(self.targeting_towers().collect())
    }

    /// Re-registers a creep crossing from one node into another.
    ///
    /// Both nodes are checked before either changes. The returned transition
    /// names only the towers whose coverage actually changed for the creep.
    pub fn move_creep_between(
        from: &mut GridNode,
        to: &mut GridNode,
        creep: CreepId,
        flying: bool,
    ) -> Result<RangeTransition, GridError> {
        from.check_can_release(creep, flying)?;
        to.check_can_admit(creep, flying)?;

        from.release(creep, flying);
        to.admit(creep, flying);

        Ok(RangeTransition {
            left: from
                .targeting_towers
                .difference(&to.targeting_towers)
                .copied()
                .collect(),
            entered: to
                .targeting_towers
                .difference(&from.targeting_towers)
                .copied()
                .collect(),
        })
    }

    /// Places a non-creep occupant on an open node.
    pub fn add_object(&mut self, occupant: OccupantId, state: NodeState) -> Result<(), GridError> {
        if self.state != NodeState::Open || self.occupant.is_some() || self.ground_creeps > 0 {
            return Err(GridError::CellOccupied {
                cell: self.cell,
                state: self.state,
            });
        }
        self.occupant = Some(occupant);
        self.state = state;
        Ok(())
    }

    /// Removes the occupant and reopens the node.
    pub fn remove_object(&mut self, occupant: OccupantId) -> Result<(), GridError> {
        if self.occupant != Some(occupant) {
            return Err(GridError::OccupantMismatch {
                cell: self.cell,
                requested: occupant,
            });
        }
        if self.ground_creeps > 0 {
            return Err(GridError::Populated { cell: self.cell });
        }
        self.occupant = None;
        self.state = NodeState::Open;
        Ok(())
    }

    /// Records that a tower covers the node and returns the creeps already here.
    pub fn register_targeting_tower(&mut self, tower: TowerId) -> Result<Vec<CreepId>, GridError> {
        if !self.targeting_towers.insert(tower) {
            return Err(GridError::DuplicateTargetingTower {
                tower,
                cell: self.cell,
            });
        }
        Ok(self.creeps().collect())
    }

    /// Forgets a tower that no longer covers the node.
    pub fn unregister_targeting_tower(&mut self, tower: TowerId) -> Result<(), GridError> {
        if !self.targeting_towers.remove(&tower) {
            return Err(GridError::MissingTargetingTower {
                tower,
                cell: self.cell,
            });
        }
        Ok(())
    }

    fn check_can_admit(&self, creep: CreepId, flying: bool) -> Result<(), GridError> {
        if self.creeps.contains_key(&creep) {
            return Err(GridError::DuplicateCreep {
                creep,
                cell: self.cell,
            });
        }
        if !flying && !self.state.admits_ground_creeps() {
            return Err(GridError::NotEnterable {
                creep,
                cell: self.cell,
                state: self.state,
            });
        }
        Ok(())
    }

    fn check_can_release(&self, creep: CreepId, flying: bool) -> Result<(), GridError> {
        match self.creeps.get(&creep) {
            None => Err(GridError::MissingCreep {
                creep,
                cell: self.cell,
            }),
            Some(&registered) if registered != flying => Err(GridError::FlightMismatch {
                creep,
                cell: self.cell,
                registered,
            }),
            Some(_) => Ok(()),
        }
    }

    fn admit(&mut self, creep: CreepId, flying: bool) {
        let _ = self.creeps.insert(creep, flying);
        if flying {
            self.flying_creeps += 1;
            return;
        }
        self.ground_creeps += 1;
        if self.state == NodeState::Open {
            self.state = NodeState::Populated;
        }
    }

    fn release(&mut self, creep: CreepId, flying: bool) {
        let _ = self.creeps.remove(&creep);
        if flying {
            self.flying_creeps -= 1;
            return;
        }
        self.ground_creeps -= 1;
        if self.state == NodeState::Populated && self.ground_creeps == 0 {
            self.state = NodeState::Open;
        }
    }
}

/// Row-major storage for every node on the board.
#[derive(Clone, Debug, Default)]
pub(crate) struct Grid {
    columns: u32,
    rows: u32,
    nodes: Vec<GridNode>,
}

impl Grid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let mut nodes = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                nodes.push(GridNode::new(CellCoord::new(column, row)));
            }
        }
        Self {
            columns,
            rows,
            nodes,
        }
    }

    pub(crate) fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let columns = usize::try_from(self.columns).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(columns)?.checked_add(column)
    }

    pub(crate) fn node(&self, cell: CellCoord) -> Option<&GridNode> {
        self.index(cell).and_then(|index| self.nodes.get(index))
    }

    pub(crate) fn node_mut(&mut self, cell: CellCoord) -> Result<&mut GridNode, GridError> {
        let index = self.index(cell).ok_or(GridError::OutOfBounds { cell })?;
        self.nodes
            .get_mut(index)
            .ok_or(GridError::OutOfBounds { cell })
    }

    /// Borrows two distinct nodes mutably at once.
    pub(crate) fn pair_mut(
        &mut self,
        first: CellCoord,
        second: CellCoord,
    ) -> Result<(&mut GridNode, &mut GridNode), GridError> {
        let a = self.index(first).ok_or(GridError::OutOfBounds { cell: first })?;
        let b = self
            .index(second)
            .ok_or(GridError::OutOfBounds { cell: second })?;
        if a == b {
            return Err(GridError::AliasedCell { cell: first });
        }
        if a < b {
            let (head, tail) = self.nodes.split_at_mut(b);
            Ok((&mut head[a], &mut tail[0]))
        } else {
            let (head, tail) = self.nodes.split_at_mut(a);
            Ok((&mut tail[0], &mut head[b]))
        }
    }

    /// State of the provided cell. Cells off the grid read as blocked.
    pub(crate) fn state_at(&self, cell: CellCoord) -> NodeState {
        self.node(cell).map_or(NodeState::Blocked, GridNode::state)
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &GridNode> {
        self.nodes.iter()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GridNode> {
        self.nodes.iter_mut()
    }

    /// Renders node states as digits, highest row first.
    pub(crate) fn dump_states(&self) -> String {
        let mut dump = String::new();
        for row in (0..self.rows).rev() {
            for column in 0..self.columns {
                dump.push(self.state_at(CellCoord::new(column, row)).digit());
            }
            dump.push('\n');
        }
        dump
    }
}
