#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tower defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Rebuilds the board from scratch using the provided layout configuration.
    ConfigureBoard {
        /// Layout describing the grid dimensions, walls and openings.
        config: BoardConfig,
    },
    /// Requests placement of a single-cell structure after board setup.
    PlaceStructure {
        /// Type of structure to construct.
        kind: StructureKind,
        /// Cell the structure will occupy.
        cell: CellCoord,
    },
    /// Requests removal of an existing structure.
    RemoveStructure {
        /// Identifier of the structure targeted for removal.
        structure: StructureId,
    },
    /// Requests placement of a tower anchored at the provided origin cell.
    PlaceTower {
        /// Type of tower to construct at the origin.
        kind: TowerKind,
        /// Lowest-index cell that defines the tower's footprint.
        origin: CellCoord,
    },
    /// Requests removal (sale) of an existing tower.
    RemoveTower {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Requests that a tower advance to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Registers a new creep on the provided cell.
    SpawnCreep {
        /// Variant of creep to create.
        kind: CreepKind,
        /// Cell the creep appears on.
        cell: CellCoord,
    },
    /// Re-registers a creep that crossed into another cell.
    MoveCreep {
        /// Identifier of the moving creep.
        creep: CreepId,
        /// Cell the creep now occupies.
        to: CellCoord,
    },
    /// Removes a creep that died or escaped through an exit.
    RemoveCreep {
        /// Identifier of the creep to remove.
        creep: CreepId,
    },
    /// Runs the pending shortest-path tree to completion and promotes it when valid.
    RebuildNavigation,
    /// Advances the pending shortest-path tree by a single relaxation.
    StepNavigation,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the board was rebuilt from a configuration.
    BoardConfigured {
        /// Number of columns in the new grid.
        columns: u32,
        /// Number of rows in the new grid.
        rows: u32,
    },
    /// Confirms that a structure was placed into the world.
    StructurePlaced {
        /// Identifier assigned to the structure by the world.
        structure: StructureId,
        /// Type of structure that was placed.
        kind: StructureKind,
        /// Cell occupied by the structure.
        cell: CellCoord,
    },
    /// Confirms that a structure was removed from the world.
    StructureRemoved {
        /// Identifier of the removed structure.
        structure: StructureId,
        /// Cell the structure previously occupied.
        cell: CellCoord,
    },
    /// Reports that a structure placement request was rejected.
    StructurePlacementRejected {
        /// Type of structure requested for placement.
        kind: StructureKind,
        /// Cell named by the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: StructureError,
    },
    /// Reports that a structure removal request was rejected.
    StructureRemovalRejected {
        /// Identifier of the structure targeted for removal.
        structure: StructureId,
        /// Specific reason the removal failed.
        reason: StructureError,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Region of cells occupied by the tower.
        region: CellRect,
    },
    /// Confirms that a tower was removed from the world.
    TowerRemoved {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Region of cells previously occupied by the tower.
        region: CellRect,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached by the tower.
        level: u8,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Origin cell provided in the placement request.
        origin: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for the upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a creep was registered on a cell.
    CreepSpawned {
        /// Identifier assigned to the creep.
        creep: CreepId,
        /// Variant of the creep.
        kind: CreepKind,
        /// Cell the creep occupies.
        cell: CellCoord,
    },
    /// Confirms that a creep moved between two cells.
    CreepMoved {
        /// Identifier of the creep.
        creep: CreepId,
        /// Cell the creep left.
        from: CellCoord,
        /// Cell the creep entered.
        to: CellCoord,
    },
    /// Confirms that a creep left the board.
    CreepRemoved {
        /// Identifier of the removed creep.
        creep: CreepId,
        /// Cell the creep occupied when it was removed.
        cell: CellCoord,
    },
    /// Notifies a tower that a creep entered a cell within its range.
    CreepEnteredRange {
        /// Tower whose purview the creep entered.
        tower: TowerId,
        /// Creep that entered.
        creep: CreepId,
        /// Variant of the creep, used for target filtering.
        kind: CreepKind,
    },
    /// Notifies a tower that a creep left every cell within its range.
    CreepLeftRange {
        /// Tower whose purview the creep left.
        tower: TowerId,
        /// Creep that left.
        creep: CreepId,
        /// Variant of the creep, used for target filtering.
        kind: CreepKind,
    },
    /// Announces that freshly computed navigation data replaced the live fields.
    NavigationPromoted,
    /// Announces that the live navigation data no longer reflects the board.
    NavigationInvalidated,
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// The column is the `i` axis and the row is the `j` axis of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the cell displaced by the provided signed offsets.
    ///
    /// Yields `None` when the result would fall outside a `columns` by `rows`
    /// grid.
    #[must_use]
    pub fn offset(self, di: i32, dj: i32, columns: u32, rows: u32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(di)?;
        let row = self.row.checked_add_signed(dj)?;
        (column < columns && row < rows).then_some(CellCoord::new(column, row))
    }

    /// Returns the neighbour one step along `direction`, if it lies on the grid.
    #[must_use]
    pub fn step(self, direction: NavDirection, columns: u32, rows: u32) -> Option<CellCoord> {
        self.offset(
            i32::from(direction.di()),
            i32::from(direction.dj()),
            columns,
            rows,
        )
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Lowest-index cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle lies entirely inside a `columns` by `rows` grid.
    #[must_use]
    pub fn fits_within(&self, columns: u32, rows: u32) -> bool {
        let right = u64::from(self.origin.column()) + u64::from(self.size.width());
        let bottom = u64::from(self.origin.row()) + u64::from(self.size.height());
        right <= u64::from(columns) && bottom <= u64::from(rows)
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = u64::from(cell.column());
        let row = u64::from(cell.row());
        let left = u64::from(self.origin.column());
        let top = u64::from(self.origin.row());
        column >= left
            && row >= top
            && column < left + u64::from(self.size.width())
            && row < top + u64::from(self.size.height())
    }

    /// Enumerates the covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width())
                .map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Occupancy state of a single grid node. Exactly one applies at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    /// Free for traversal and construction.
    Open,
    /// Permanently walled off, or speculatively blocked during validation.
    Blocked,
    /// Holds at least one ground creep.
    Populated,
    /// Creeps appear here; must stay connected to an exit.
    Entrance,
    /// Creeps leave the board here; roots of the shortest-path tree.
    Exit,
    /// Covered by a tower footprint.
    Tower,
}

impl NodeState {
    /// Reports whether the state blocks ground traversal.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Blocked | Self::Tower)
    }

    /// Reports whether a ground creep may stand in a node with this state.
    #[must_use]
    pub const fn admits_ground_creeps(self) -> bool {
        matches!(self, Self::Open | Self::Populated | Self::Entrance)
    }

    /// Single digit used by the text dumps of the state grid.
    #[must_use]
    pub const fn digit(self) -> char {
        match self {
            Self::Open => '0',
            Self::Blocked => '1',
            Self::Populated => '2',
            Self::Entrance => '3',
            Self::Exit => '4',
            Self::Tower => '5',
        }
    }
}

/// Unit step between a cell and its successor on the shortest path.
///
/// Both components lie in `-1..=1`. The zero direction marks exit cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavDirection {
    di: i8,
    dj: i8,
}

impl NavDirection {
    /// Direction recorded on exit cells, which have no successor.
    pub const ARRIVED: NavDirection = NavDirection { di: 0, dj: 0 };

    /// Creates a direction when both components lie in `-1..=1`.
    #[must_use]
    pub const fn new(di: i8, dj: i8) -> Option<Self> {
        if di < -1 || di > 1 || dj < -1 || dj > 1 {
            return None;
        }
        Some(Self { di, dj })
    }

    /// Column component of the step.
    #[must_use]
    pub const fn di(&self) -> i8 {
        self.di
    }

    /// Row component of the step.
    #[must_use]
    pub const fn dj(&self) -> i8 {
        self.dj
    }

    /// Reports whether the step moves along both axes.
    #[must_use]
    pub const fn is_diagonal(&self) -> bool {
        self.di != 0 && self.dj != 0
    }

    /// Reports whether this is the zero direction carried by exits.
    #[must_use]
    pub const fn is_arrived(&self) -> bool {
        self.di == 0 && self.dj == 0
    }

    /// Cost of travelling one step in this direction.
    #[must_use]
    pub fn step_cost(&self) -> f64 {
        if self.is_diagonal() {
            std::f64::consts::SQRT_2
        } else if self.is_arrived() {
            0.0
        } else {
            1.0
        }
    }
}

/// Unique identifier assigned to a creep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreepId(u32);

impl CreepId {
    /// Creates a new creep identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a wall, entrance or exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the structure identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Non-creep occupant registered on a grid node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OccupantId {
    /// Cell covered by a tower footprint.
    Tower(TowerId),
    /// Cell holding a wall, entrance or exit.
    Structure(StructureId),
    /// Temporary marker used while validating a proposed placement.
    Speculative,
}

/// Single-cell structures laid out during board setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Impassable wall segment.
    Wall,
    /// Cell where creeps appear.
    Entrance,
    /// Cell where creeps leave the board.
    Exit,
}

impl StructureKind {
    /// Node state a cell takes while holding this structure.
    #[must_use]
    pub const fn state(self) -> NodeState {
        match self {
            Self::Wall => NodeState::Blocked,
            Self::Entrance => NodeState::Entrance,
            Self::Exit => NodeState::Exit,
        }
    }
}

/// Creep variants that can roam the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreepKind {
    /// Walks the shortest path at the base speed.
    Basic,
    /// Walks the shortest path quickly.
    Fast,
    /// Flies straight across the board, ignoring walls and towers.
    Flying,
    /// Walks, but leaps over obstacles when the shortcut pays off.
    Jumping,
}

impl CreepKind {
    /// Reports whether the creep flies. Flying creeps never change node state.
    #[must_use]
    pub const fn is_flying(self) -> bool {
        matches!(self, Self::Flying)
    }
}

/// Types of towers that can be constructed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Lobs shells at flying creeps.
    Cannon,
    /// Rapid, light damage against ground creeps.
    Fast,
    /// Slow, heavy damage against ground creeps.
    Heavy,
}

/// Highest level a tower can reach, counting from zero.
pub const MAX_TOWER_LEVEL: u8 = 2;

impl TowerKind {
    /// Firing range in cells at the provided level.
    ///
    /// Levels past [`MAX_TOWER_LEVEL`] report the top-level range.
    #[must_use]
    pub fn range(self, level: u8) -> f64 {
        let ranges: [f64; 3] = match self {
            Self::Cannon => [5.0, 6.25, 7.5],
            Self::Fast => [5.0, 5.5, 6.0],
            Self::Heavy => [5.0, 6.5, 8.0],
        };
        ranges[usize::from(level.min(MAX_TOWER_LEVEL))]
    }

    /// Footprint occupied by the tower. Every kind covers two by two cells.
    #[must_use]
    pub const fn footprint(self) -> CellRectSize {
        CellRectSize::new(2, 2)
    }

    /// Reports whether the tower may target creeps of the provided kind.
    #[must_use]
    pub const fn can_target(self, creep: CreepKind) -> bool {
        match self {
            Self::Cannon => creep.is_flying(),
            Self::Fast | Self::Heavy => !creep.is_flying(),
        }
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested footprint extends beyond the grid bounds.
    OutOfBounds,
    /// The requested footprint overlaps a cell that is not open.
    Occupied,
    /// The placement would seal a populated or entrance cell off from every exit.
    Blocking,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    MissingTower,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower already reached its final level.
    MaxLevel,
}

/// Reasons a structure placement or removal may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell is not open.
    Occupied,
    /// The change would seal a populated or entrance cell off from every exit.
    Blocking,
    /// No structure with the provided identifier exists.
    Missing,
}

/// Layout of a freshly configured board.
///
/// The outermost rows are walls, `side_wall_thickness` columns on either edge
/// are walls, and a vertically centred opening of `opening_span` rows holds
/// the entrances on the left edge and the exits on the right edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Grid width in cells.
    pub columns: u32,
    /// Grid height in cells.
    pub rows: u32,
    /// Number of wall columns on the left and right edges.
    pub side_wall_thickness: u32,
    /// Number of rows spanned by the entrance and exit openings.
    pub opening_span: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: 36,
            rows: 36,
            side_wall_thickness: 2,
            opening_span: 2,
        }
    }
}

impl BoardConfig {
    /// Checks that the layout leaves a non-empty interior and fitting openings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if self.side_wall_thickness == 0 {
            return Err(ConfigError::MissingSideWalls);
        }
        let walls = u64::from(self.side_wall_thickness) * 2;
        if u64::from(self.columns) <= walls || self.rows < 3 {
            return Err(ConfigError::EmptyInterior {
                columns: self.columns,
                rows: self.rows,
            });
        }
        let openings = self.opening_rows();
        if self.opening_span == 0 || openings.start < 1 || openings.end > self.rows - 1 {
            return Err(ConfigError::OpeningTooWide {
                span: self.opening_span,
                rows: self.rows,
            });
        }
        Ok(())
    }

    /// Rows that hold the entrance and exit openings.
    #[must_use]
    pub fn opening_rows(&self) -> Range<u32> {
        let start = (self.rows / 2).saturating_sub(self.opening_span / 2);
        start..start.saturating_add(self.opening_span)
    }
}

/// Reasons a [`BoardConfig`] cannot be laid out.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One of the grid dimensions is zero.
    #[error("board dimensions must be non-zero")]
    EmptyGrid,
    /// The board would have no side walls to carve openings into.
    #[error("side wall thickness must be at least one column")]
    MissingSideWalls,
    /// Walls would consume the whole board.
    #[error("a {columns}x{rows} board leaves no interior inside its walls")]
    EmptyInterior {
        /// Configured number of columns.
        columns: u32,
        /// Configured number of rows.
        rows: u32,
    },
    /// The openings do not fit between the top and bottom walls.
    #[error("an opening of {span} rows does not fit a board with {rows} rows")]
    OpeningTooWide {
        /// Configured opening span.
        span: u32,
        /// Configured number of rows.
        rows: u32,
    },
}

/// Immutable representation of a single creep used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreepSnapshot {
    /// Unique identifier assigned to the creep.
    pub id: CreepId,
    /// Variant of the creep.
    pub kind: CreepKind,
    /// Grid cell currently occupied by the creep.
    pub cell: CellCoord,
}

/// Read-only snapshot describing all creeps on the board.
#[derive(Clone, Debug, Default)]
pub struct CreepView {
    snapshots: Vec<CreepSnapshot>,
}

impl CreepView {
    /// Creates a new creep view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CreepSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured creep snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CreepSnapshot> {
        self.snapshots.iter()
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Current level of the tower.
    pub level: u8,
    /// Region of cells occupied by the tower.
    pub region: CellRect,
}

/// Read-only snapshot describing all towers on the board.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }
}

/// Promoted navigation data of a single cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationCell {
    /// Occupancy state of the cell when the snapshot was taken.
    pub state: NodeState,
    /// Promoted cost to the nearest exit, infinite when unreachable.
    pub cost: f64,
    /// Promoted step toward the nearest exit.
    pub direction: Option<NavDirection>,
}

/// Read-only snapshot of the promoted navigation fields.
///
/// Cells are stored row-major. Systems must not steer creeps while
/// [`NavigationView::is_valid`] reports `false`.
#[derive(Clone, Debug, Default)]
pub struct NavigationView {
    columns: u32,
    rows: u32,
    valid: bool,
    cells: Vec<NavigationCell>,
}

impl NavigationView {
    /// Creates a view from row-major cells covering a `columns` by `rows` grid.
    ///
    /// Returns `None` when the number of cells does not match the dimensions.
    #[must_use]
    pub fn from_cells(
        columns: u32,
        rows: u32,
        valid: bool,
        cells: Vec<NavigationCell>,
    ) -> Option<Self> {
        let expected = u64::from(columns) * u64::from(rows);
        if u64::try_from(cells.len()).ok()? != expected {
            return None;
        }
        Some(Self {
            columns,
            rows,
            valid,
            cells,
        })
    }

    /// Reports whether the promoted fields reflect the current board.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Provides the dimensions of the captured grid.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Navigation data captured for the provided cell.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&NavigationCell> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let columns = usize::try_from(self.columns).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        self.cells.get(row.checked_mul(columns)?.checked_add(column)?)
    }

    /// Occupancy state captured for the provided cell.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<NodeState> {
        self.cell(cell).map(|navigation| navigation.state)
    }

    /// Promoted cost captured for the provided cell.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> Option<f64> {
        self.cell(cell).map(|navigation| navigation.cost)
    }

    /// Promoted direction captured for the provided cell.
    #[must_use]
    pub fn direction(&self, cell: CellCoord) -> Option<NavDirection> {
        self.cell(cell).and_then(|navigation| navigation.direction)
    }
}

/// Target chosen by a tower for the current tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that is aiming.
    pub tower: TowerId,
    /// Creep the tower aims at.
    pub creep: CreepId,
}
