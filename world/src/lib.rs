#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the tower defence board.
//!
//! The world owns the dense grid of [`GridNode`] values, the registries of
//! towers, structures and creeps, and the navigation fields promoted from the
//! latest valid shortest-path tree. Every structural change is validated by
//! speculatively applying it, growing a fresh tree over the result, and
//! committing only when every populated and entrance cell can still reach an
//! exit. Rejected requests leave the grid exactly as it was.

mod creeps;
mod grid;
mod navigation;
mod structures;
mod towers;

use thiserror::Error;
use tower_defence_core::{
    BoardConfig, CellCoord, CellRect, Command, ConfigError, CreepId, CreepKind, Event, NodeState,
    OccupantId, PlacementError, RemovalError, StructureError, StructureId, StructureKind, TowerId,
    TowerKind, UpgradeError, MAX_TOWER_LEVEL,
};
use tower_defence_system_pathfinding::{ShortestPathTree, SptError};
use tracing::{debug, info, trace, warn};

pub use grid::{GridError, GridNode, RangeTransition};

use creeps::CreepRegistry;
use grid::Grid;
use navigation::Navigation;
use structures::StructureRegistry;
use towers::{cells_in_range, TowerRegistry};

/// Fatal failures raised while applying a command.
///
/// These indicate corrupted state or a caller bug. Policy rejections are
/// reported through events instead.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    /// A grid node refused a mutation.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The shortest-path computation failed.
    #[error(transparent)]
    Navigation(#[from] SptError),
    /// The requested board layout is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The command named a creep that is not on the board.
    #[error("creep {creep:?} is not on the board")]
    UnknownCreep {
        /// Identifier provided by the command.
        creep: CreepId,
    },
    /// A tower's footprint cell is held by something else.
    #[error("tower {tower:?} does not hold {cell:?}")]
    FootprintMismatch {
        /// Tower whose footprint was inspected.
        tower: TowerId,
        /// Cell that did not carry the tower.
        cell: CellCoord,
    },
    /// A change that must succeed left some populated or entrance cell stranded.
    #[error("navigation could not be made valid for the current board")]
    NavigationInvalid,
}

/// Represents the authoritative tower defence world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    towers: TowerRegistry,
    structures: StructureRegistry,
    creeps: CreepRegistry,
    navigation: Navigation,
}

impl World {
    /// Creates an empty world. Send [`Command::ConfigureBoard`] before anything else.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: Grid::default(),
            towers: TowerRegistry::new(),
            structures: StructureRegistry::new(),
            creeps: CreepRegistry::new(),
            navigation: Navigation::default(),
        }
    }

    fn configure(&mut self, config: BoardConfig, out: &mut Vec<Event>) -> Result<(), WorldError> {
        config.validate()?;

        *self = Self::new();
        self.grid = Grid::new(config.columns, config.rows);
        for row in 0..config.rows {
            for column in 0..config.columns {
                let cell = CellCoord::new(column, row);
                if let Some(kind) = layout_structure(&config, cell) {
                    let _ = self.insert_structure(kind, cell)?;
                }
            }
        }

        out.push(Event::BoardConfigured {
            columns: config.columns,
            rows: config.rows,
        });
        info!(
            columns = config.columns,
            rows = config.rows,
            structures = self.structures.len(),
            "board configured"
        );

        if !self.rebuild_navigation(out)? {
            return Err(WorldError::NavigationInvalid);
        }
        Ok(())
    }

    fn place_structure(
        &mut self,
        kind: StructureKind,
        cell: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let reason = if !self.grid.contains(cell) {
            Some(StructureError::OutOfBounds)
        } else if self.grid.state_at(cell) != NodeState::Open {
            Some(StructureError::Occupied)
        } else {
            None
        };
        if let Some(reason) = reason {
            reject_structure_placement(kind, cell, reason, out);
            return Ok(());
        }

        self.ensure_navigation(out)?;
        let tree = self.trial_tree(&[cell], kind.state())?;
        if !tree.is_valid() {
            reject_structure_placement(kind, cell, StructureError::Blocking, out);
            return Ok(());
        }

        let structure = self.insert_structure(kind, cell)?;
        self.navigation.invalidate();
        out.push(Event::StructurePlaced {
            structure,
            kind,
            cell,
        });
        info!(?structure, ?kind, ?cell, "structure placed");
        self.commit_tree(&tree, out);
        Ok(())
    }

    fn remove_structure(
        &mut self,
        structure: StructureId,
        out: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let Some(state) = self.structures.get(structure) else {
            reject_structure_removal(structure, StructureError::Missing, out);
            return Ok(());
        };
        let occupant = OccupantId::Structure(structure);
        let node = self
            .grid
            .node(state.cell)
            .ok_or(GridError::OutOfBounds { cell: state.cell })?;
        if node.occupant() != Some(occupant) {
            return Err(GridError::OccupantMismatch {
                cell: state.cell,
                requested: occupant,
            }
            .into());
        }
        if node.ground_creeps() > 0 {
            reject_structure_removal(structure, StructureError::Occupied, out);
            return Ok(());
        }

        self.ensure_navigation(out)?;
        self.grid.node_mut(state.cell)?.remove_object(occupant)?;
        let trial = self.run_fresh_tree();
        if !matches!(&trial, Ok(tree) if tree.is_valid()) {
            self.grid
                .node_mut(state.cell)?
                .add_object(occupant, state.kind.state())?;
            let _ = trial?;
            reject_structure_removal(structure, StructureError::Blocking, out);
            return Ok(());
        }
        let tree = trial?;

        let _ = self.structures.remove(structure);
        self.navigation.invalidate();
        out.push(Event::StructureRemoved {
            structure,
            cell: state.cell,
        });
        info!(?structure, kind = ?state.kind, cell = ?state.cell, "structure removed");
        self.commit_tree(&tree, out);
        Ok(())
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        origin: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let region = CellRect::from_origin_and_size(origin, kind.footprint());
        let reason = if !region.fits_within(self.grid.columns(), self.grid.rows()) {
            Some(PlacementError::OutOfBounds)
        } else if region
            .cells()
            .any(|cell| self.grid.state_at(cell) != NodeState::Open)
        {
            Some(PlacementError::Occupied)
        } else {
            None
        };
        if let Some(reason) = reason {
            reject_tower_placement(kind, origin, reason, out);
            return Ok(());
        }

        self.ensure_navigation(out)?;
        let footprint: Vec<CellCoord> = region.cells().collect();
        let tree = self.trial_tree(&footprint, NodeState::Blocked)?;
        if !tree.is_valid() {
            reject_tower_placement(kind, origin, PlacementError::Blocking, out);
            return Ok(());
        }

        let tower = self.towers.insert(kind, region);
        for &cell in &footprint {
            self.grid
                .node_mut(cell)?
                .add_object(OccupantId::Tower(tower), NodeState::Tower)?;
        }
        self.navigation.invalidate();
        out.push(Event::TowerPlaced {
            tower,
            kind,
            region,
        });
        info!(?tower, ?kind, ?origin, "tower placed");

        self.expand_tower_range(tower, out)?;
        self.commit_tree(&tree, out);
        Ok(())
    }

    fn remove_tower(&mut self, tower: TowerId, out: &mut Vec<Event>) -> Result<(), WorldError> {
        let Some(state) = self.towers.get(tower) else {
            warn!(?tower, "tower removal rejected: missing tower");
            out.push(Event::TowerRemovalRejected {
                tower,
                reason: RemovalError::MissingTower,
            });
            return Ok(());
        };
        let region = state.region;
        let targeted: Vec<CellCoord> = state.targeted.iter().copied().collect();

        for cell in region.cells() {
            let occupant = self.grid.node(cell).and_then(GridNode::occupant);
            if occupant != Some(OccupantId::Tower(tower)) {
                return Err(WorldError::FootprintMismatch { tower, cell });
            }
        }

        for cell in targeted {
            self.grid.node_mut(cell)?.unregister_targeting_tower(tower)?;
        }
        for cell in region.cells() {
            self.grid
                .node_mut(cell)?
                .remove_object(OccupantId::Tower(tower))?;
        }
        let _ = self.towers.remove(tower);
        self.navigation.invalidate();
        out.push(Event::TowerRemoved { tower, region });
        info!(?tower, "tower removed");

        if !self.rebuild_navigation(out)? {
            return Err(WorldError::NavigationInvalid);
        }
        Ok(())
    }

    fn upgrade_tower(&mut self, tower: TowerId, out: &mut Vec<Event>) -> Result<(), WorldError> {
        let level = match self.towers.get(tower) {
            None => Err(UpgradeError::MissingTower),
            Some(state) if state.level >= MAX_TOWER_LEVEL => Err(UpgradeError::MaxLevel),
            Some(state) => Ok(state.level + 1),
        };
        let level = match level {
            Ok(level) => level,
            Err(reason) => {
                warn!(?tower, ?reason, "tower upgrade rejected");
                out.push(Event::TowerUpgradeRejected { tower, reason });
                return Ok(());
            }
        };

        if let Some(state) = self.towers.get_mut(tower) {
            state.level = level;
        }
        out.push(Event::TowerUpgraded { tower, level });
        info!(?tower, level, "tower upgraded");
        self.expand_tower_range(tower, out)
    }

    /// Registers the tower with every in-range cell it does not target yet.
    fn expand_tower_range(
        &mut self,
        tower: TowerId,
        out: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let Some(state) = self.towers.get_mut(tower) else {
            return Ok(());
        };
        let in_range = cells_in_range(
            state.region,
            state.range(),
            self.grid.columns(),
            self.grid.rows(),
        );
        let added: Vec<CellCoord> = in_range
            .into_iter()
            .filter(|cell| state.targeted.insert(*cell))
            .collect();

        for cell in added {
            let present = self.grid.node_mut(cell)?.register_targeting_tower(tower)?;
            for creep in present {
                let kind = self.creep_kind(creep)?;
                out.push(Event::CreepEnteredRange { tower, creep, kind });
            }
        }
        Ok(())
    }

    fn spawn_creep(
        &mut self,
        kind: CreepKind,
        cell: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let creep = self.creeps.peek_next_id();
        let towers = self.grid.node_mut(cell)?.add_creep(creep, kind.is_flying())?;
        let _ = self.creeps.insert(kind, cell);
        self.navigation.discard_pending();

        out.push(Event::CreepSpawned { creep, kind, cell });
        for tower in towers {
            out.push(Event::CreepEnteredRange { tower, creep, kind });
        }
        debug!(?creep, ?kind, ?cell, "creep spawned");
        Ok(())
    }

    fn move_creep(
        &mut self,
        creep: CreepId,
        to: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let state = self
            .creeps
            .get(creep)
            .ok_or(WorldError::UnknownCreep { creep })?;
        if state.cell == to {
            return Ok(());
        }

        let (from_node, to_node) = self.grid.pair_mut(state.cell, to)?;
        let transition =
            GridNode::move_creep_between(from_node, to_node, creep, state.kind.is_flying())?;
        self.creeps.relocate(creep, to);
        self.navigation.discard_pending();

        out.push(Event::CreepMoved {
            creep,
            from: state.cell,
            to,
        });
        for tower in transition.left {
            out.push(Event::CreepLeftRange {
                tower,
                creep,
                kind: state.kind,
            });
        }
        for tower in transition.entered {
            out.push(Event::CreepEnteredRange {
                tower,
                creep,
                kind: state.kind,
            });
        }
        trace!(?creep, from = ?state.cell, ?to, "creep moved");
        Ok(())
    }

    fn remove_creep(&mut self, creep: CreepId, out: &mut Vec<Event>) -> Result<(), WorldError> {
        let state = self
            .creeps
            .get(creep)
            .ok_or(WorldError::UnknownCreep { creep })?;
        let towers = self
            .grid
            .node_mut(state.cell)?
            .remove_creep(creep, state.kind.is_flying())?;
        let _ = self.creeps.remove(creep);
        self.navigation.discard_pending();

        out.push(Event::CreepRemoved {
            creep,
            cell: state.cell,
        });
        for tower in towers {
            out.push(Event::CreepLeftRange {
                tower,
                creep,
                kind: state.kind,
            });
        }
        debug!(?creep, cell = ?state.cell, "creep removed");
        Ok(())
    }

    fn creep_kind(&self, creep: CreepId) -> Result<CreepKind, WorldError> {
        self.creeps
            .get(creep)
            .map(|state| state.kind)
            .ok_or(WorldError::UnknownCreep { creep })
    }

    fn insert_structure(
        &mut self,
        kind: StructureKind,
        cell: CellCoord,
    ) -> Result<StructureId, WorldError> {
        let structure = self.structures.peek_next_id();
        self.grid
            .node_mut(cell)?
            .add_object(OccupantId::Structure(structure), kind.state())?;
        Ok(self.structures.insert(kind, cell))
    }

    fn build_tree(&self) -> Result<ShortestPathTree, SptError> {
        ShortestPathTree::new(self.grid.columns(), self.grid.rows(), |cell| {
            self.grid.state_at(cell)
        })
    }

    fn run_fresh_tree(&self) -> Result<ShortestPathTree, WorldError> {
        let mut tree = self.build_tree()?;
        tree.run()?;
        Ok(tree)
    }

    /// Grows a complete tree over the grid with `cells` speculatively set to
    /// `state`. The marks are reverted before returning, whatever the outcome.
    fn trial_tree(
        &mut self,
        cells: &[CellCoord],
        state: NodeState,
    ) -> Result<ShortestPathTree, WorldError> {
        let mut marked = Vec::with_capacity(cells.len());
        let mut marking = Ok(());
        for &cell in cells {
            let outcome = self
                .grid
                .node_mut(cell)
                .and_then(|node| node.add_object(OccupantId::Speculative, state));
            if let Err(error) = outcome {
                marking = Err(error);
                break;
            }
            marked.push(cell);
        }

        let trial = match marking {
            Ok(()) => self.run_fresh_tree(),
            Err(error) => Err(error.into()),
        };

        for cell in marked {
            self.grid
                .node_mut(cell)?
                .remove_object(OccupantId::Speculative)?;
        }
        trial
    }

    /// Rebuilds navigation until it is valid, failing when it cannot be.
    fn ensure_navigation(&mut self, out: &mut Vec<Event>) -> Result<(), WorldError> {
        if self.navigation.is_valid() {
            return Ok(());
        }
        if self.rebuild_navigation(out)? {
            Ok(())
        } else {
            Err(WorldError::NavigationInvalid)
        }
    }

    /// Runs the pending tree, or a fresh one, to completion and promotes it
    /// when valid. Returns whether the navigation fields are now valid.
    fn rebuild_navigation(&mut self, out: &mut Vec<Event>) -> Result<bool, WorldError> {
        let mut tree = match self.navigation.take_pending() {
            Some(tree) => tree,
            None => self.build_tree()?,
        };
        tree.run()?;
        Ok(self.conclude(&tree, out))
    }

    fn step_navigation(&mut self, out: &mut Vec<Event>) -> Result<(), WorldError> {
        let mut tree = match self.navigation.take_pending() {
            Some(tree) => tree,
            None => self.build_tree()?,
        };
        let finalised = tree.step()?;
        trace!(?finalised, frontier = tree.frontier_len(), "navigation stepped");

        if tree.is_complete() {
            let _ = self.conclude(&tree, out);
        } else {
            self.navigation.park(tree);
        }
        Ok(())
    }

    fn conclude(&mut self, tree: &ShortestPathTree, out: &mut Vec<Event>) -> bool {
        debug!(
            cells = self.grid.nodes().count(),
            valid = tree.is_valid(),
            "navigation rebuilt"
        );
        if tree.is_valid() {
            self.commit_tree(tree, out);
            true
        } else {
            self.navigation.invalidate();
            out.push(Event::NavigationInvalidated);
            false
        }
    }

    /// Copies the costs and directions of a valid tree into the grid.
    fn commit_tree(&mut self, tree: &ShortestPathTree, out: &mut Vec<Event>) {
        for node in self.grid.nodes_mut() {
            match tree.state(node.cell()) {
                Some(state) => node.promote(state.cost(), state.direction()),
                None => node.promote(f64::INFINITY, None),
            }
        }
        self.navigation.mark_promoted();
        out.push(Event::NavigationPromoted);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Structure laid out at `cell` when a board is built from `config`.
fn layout_structure(config: &BoardConfig, cell: CellCoord) -> Option<StructureKind> {
    let (column, row) = (cell.column(), cell.row());
    if row == 0 || row + 1 == config.rows {
        return Some(StructureKind::Wall);
    }

    let thickness = config.side_wall_thickness;
    let in_side_wall = column < thickness || column >= config.columns.saturating_sub(thickness);
    if !in_side_wall {
        return None;
    }
    if !config.opening_rows().contains(&row) {
        return Some(StructureKind::Wall);
    }
    if column == 0 {
        Some(StructureKind::Entrance)
    } else if column + 1 == config.columns {
        Some(StructureKind::Exit)
    } else {
        None
    }
}

fn reject_tower_placement(
    kind: TowerKind,
    origin: CellCoord,
    reason: PlacementError,
    out: &mut Vec<Event>,
) {
    warn!(?kind, ?origin, ?reason, "tower placement rejected");
    out.push(Event::TowerPlacementRejected {
        kind,
        origin,
        reason,
    });
}

fn reject_structure_placement(
    kind: StructureKind,
    cell: CellCoord,
    reason: StructureError,
    out: &mut Vec<Event>,
) {
    warn!(?kind, ?cell, ?reason, "structure placement rejected");
    out.push(Event::StructurePlacementRejected { kind, cell, reason });
}

fn reject_structure_removal(structure: StructureId, reason: StructureError, out: &mut Vec<Event>) {
    warn!(?structure, ?reason, "structure removal rejected");
    out.push(Event::StructureRemovalRejected { structure, reason });
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Policy rejections are reported as events and return `Ok`. An `Err` means
/// the world's bookkeeping is corrupted and simulation must stop.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    match command {
        Command::ConfigureBoard { config } => world.configure(config, out_events),
        Command::PlaceStructure { kind, cell } => world.place_structure(kind, cell, out_events),
        Command::RemoveStructure { structure } => world.remove_structure(structure, out_events),
        Command::PlaceTower { kind, origin } => world.place_tower(kind, origin, out_events),
        Command::RemoveTower { tower } => world.remove_tower(tower, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::SpawnCreep { kind, cell } => world.spawn_creep(kind, cell, out_events),
        Command::MoveCreep { creep, to } => world.move_creep(creep, to, out_events),
        Command::RemoveCreep { creep } => world.remove_creep(creep, out_events),
        Command::RebuildNavigation => world.rebuild_navigation(out_events).map(|_| ()),
        Command::StepNavigation => world.step_navigation(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_defence_core::{
        CellCoord, CreepView, NavigationCell, NavigationView, OccupantId, StructureId,
        StructureKind, TowerId, TowerView,
    };

    use super::{GridNode, World};

    /// Dimensions of the board as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.grid.columns(), world.grid.rows())
    }

    /// Node stored at the provided cell.
    #[must_use]
    pub fn node(world: &World, cell: CellCoord) -> Option<&GridNode> {
        world.grid.node(cell)
    }

    /// Reports whether the promoted navigation fields describe the current board.
    #[must_use]
    pub fn is_navigation_valid(world: &World) -> bool {
        world.navigation.is_valid()
    }

    /// Reports whether a partially stepped tree is waiting for more steps.
    #[must_use]
    pub fn is_navigation_pending(world: &World) -> bool {
        world.navigation.has_pending()
    }

    /// Captures the promoted navigation fields of every cell.
    #[must_use]
    pub fn navigation_view(world: &World) -> NavigationView {
        let cells = world
            .grid
            .nodes()
            .map(|node| NavigationCell {
                state: node.state(),
                cost: node.spt_cost(),
                direction: node.nav_direction(),
            })
            .collect();
        NavigationView::from_cells(
            world.grid.columns(),
            world.grid.rows(),
            world.navigation.is_valid(),
            cells,
        )
        .unwrap_or_default()
    }

    /// Captures a read-only view of the creeps on the board.
    #[must_use]
    pub fn creep_view(world: &World) -> CreepView {
        CreepView::from_snapshots(world.creeps.snapshots())
    }

    /// Captures a read-only view of the towers on the board.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Tower whose footprint covers the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        match world.grid.node(cell)?.occupant()? {
            OccupantId::Tower(tower) => Some(tower),
            OccupantId::Structure(_) | OccupantId::Speculative => None,
        }
    }

    /// Wall, entrance or exit standing on the provided cell, if any.
    #[must_use]
    pub fn structure_at(world: &World, cell: CellCoord) -> Option<(StructureId, StructureKind)> {
        match world.grid.node(cell)?.occupant()? {
            OccupantId::Structure(structure) => world
                .structures
                .get(structure)
                .map(|state| (structure, state.kind)),
            OccupantId::Tower(_) | OccupantId::Speculative => None,
        }
    }

    /// Number of walls, entrances and exits on the board.
    #[must_use]
    pub fn structure_count(world: &World) -> usize {
        world.structures.len()
    }

    /// Renders node states as digits, highest row first.
    ///
    /// `0` open, `1` blocked, `2` populated, `3` entrance, `4` exit, `5` tower.
    #[must_use]
    pub fn dump_state_grid(world: &World) -> String {
        world.grid.dump_states()
    }

    /// Renders the promoted costs, highest row first.
    #[must_use]
    pub fn dump_cost_grid(world: &World) -> String {
        let mut dump = String::new();
        for row in (0..world.grid.rows()).rev() {
            let line: Vec<String> = (0..world.grid.columns())
                .filter_map(|column| world.grid.node(CellCoord::new(column, row)))
                .map(|node| format!("{:.2}", node.spt_cost()))
                .collect();
            dump.push_str(&line.join(" "));
            dump.push('\n');
        }
        dump
    }
}
