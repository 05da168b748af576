#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Steering system that walks creeps down the promoted navigation field.
//!
//! Ground creeps follow the direction stored on their cell. Flying creeps
//! ignore the field and cross the board along increasing columns. Jumping
//! creeps leap over obstacles when the landing cell is far enough closer to
//! an exit, and otherwise walk.

use std::collections::{BTreeMap, BTreeSet};

use tower_defence_core::{
    CellCoord, Command, CreepId, CreepKind, CreepSnapshot, CreepView, NavDirection,
    NavigationView, NodeState,
};
use tracing::{debug, trace};

/// Offsets a jumping creep may leap across, as `(column, row)` deltas.
///
/// The diagonal hops slip between towers touching at a corner. The long hops
/// clear a whole tower footprint.
const JUMP_OFFSETS: [(i32, i32); 8] = [
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (0, 3),
    (0, -3),
    (3, 0),
    (-3, 0),
];

/// Smallest cost reduction that makes a jump worth taking over walking.
const MIN_JUMP_GAIN: f64 = 7.0;

/// Pure system that reads the navigation field and emits creep commands.
#[derive(Debug, Default)]
pub struct Steering {
    trajectories: BTreeMap<CreepId, Trajectory>,
    recalculated: Vec<CreepId>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Trajectory {
    cell: CellCoord,
    direction: NavDirection,
}

impl Steering {
    /// Emits one movement or removal command per creep that can act.
    ///
    /// Nothing is emitted while the navigation field is invalid.
    pub fn handle(
        &mut self,
        creeps: &CreepView,
        navigation: &NavigationView,
        out: &mut Vec<Command>,
    ) {
        self.recalculated.clear();
        let live: BTreeSet<CreepId> = creeps.iter().map(|creep| creep.id).collect();
        self.trajectories.retain(|creep, _| live.contains(creep));

        if !navigation.is_valid() {
            trace!(creeps = live.len(), "navigation invalid; creeps hold position");
            return;
        }

        for creep in creeps.iter() {
            if let Some(command) = self.steer(creep, navigation) {
                out.push(command);
            }
        }
    }

    /// Creeps whose cell changed direction since they last planned from it.
    ///
    /// Refreshed on every call to [`Steering::handle`].
    #[must_use]
    pub fn recalculated(&self) -> &[CreepId] {
        &self.recalculated
    }

    fn steer(&mut self, creep: &CreepSnapshot, navigation: &NavigationView) -> Option<Command> {
        if navigation.state(creep.cell) == Some(NodeState::Exit) {
            return Some(Command::RemoveCreep { creep: creep.id });
        }

        match creep.kind {
            CreepKind::Flying => {
                let (columns, rows) = navigation.dimensions();
                Some(match creep.cell.offset(1, 0, columns, rows) {
                    Some(to) => Command::MoveCreep { creep: creep.id, to },
                    None => Command::RemoveCreep { creep: creep.id },
                })
            }
            CreepKind::Jumping => match best_jump(creep.cell, navigation) {
                Some(to) => {
                    let _ = self.trajectories.remove(&creep.id);
                    debug!(creep = ?creep.id, from = ?creep.cell, ?to, "creep jumps");
                    Some(Command::MoveCreep { creep: creep.id, to })
                }
                None => self.walk(creep, navigation),
            },
            CreepKind::Basic | CreepKind::Fast => self.walk(creep, navigation),
        }
    }

    fn walk(&mut self, creep: &CreepSnapshot, navigation: &NavigationView) -> Option<Command> {
        let Some(direction) = navigation.direction(creep.cell) else {
            trace!(creep = ?creep.id, cell = ?creep.cell, "creep has no route");
            return None;
        };
        if direction.is_arrived() {
            return Some(Command::RemoveCreep { creep: creep.id });
        }

        let planned = Trajectory {
            cell: creep.cell,
            direction,
        };
        if let Some(previous) = self.trajectories.insert(creep.id, planned) {
            if previous.cell == planned.cell && previous.direction != planned.direction {
                self.recalculated.push(creep.id);
            }
        }

        let (columns, rows) = navigation.dimensions();
        let to = creep.cell.step(direction, columns, rows)?;
        if navigation.state(to) == Some(NodeState::Exit) {
            Some(Command::RemoveCreep { creep: creep.id })
        } else {
            Some(Command::MoveCreep { creep: creep.id, to })
        }
    }
}

/// Cheapest legal landing cell for a jump from `cell`, if the gain is large enough.
///
/// Exits and blocking cells are never landing spots. Ties keep the earliest offset.
fn best_jump(cell: CellCoord, navigation: &NavigationView) -> Option<CellCoord> {
    let (columns, rows) = navigation.dimensions();
    let here = navigation.cost(cell)?;

    let mut best: Option<(CellCoord, f64)> = None;
    for (di, dj) in JUMP_OFFSETS {
        let Some(target) = cell.offset(di, dj, columns, rows) else {
            continue;
        };
        let Some(landing) = navigation.cell(target) else {
            continue;
        };
        if landing.state.is_blocking() || landing.state == NodeState::Exit {
            continue;
        }
        if best.map_or(true, |(_, cost)| landing.cost < cost) {
            best = Some((target, landing.cost));
        }
    }

    let (target, cost) = best?;
    (here - cost >= MIN_JUMP_GAIN).then_some(target)
}
