#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that folds range events into deterministic tower targets.

use std::collections::{BTreeMap, BTreeSet};

use tower_defence_core::{CreepId, Event, TowerId, TowerKind, TowerTarget, TowerView};
use tracing::trace;

/// Tower targeting system that remembers which creeps each tower can see.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: BTreeMap<TowerId, BTreeSet<CreepId>>,
    current: BTreeMap<TowerId, CreepId>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with no tracked towers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the latest world events and assigns one target per tower.
    ///
    /// The output buffer is cleared before populating it. A tower keeps its
    /// current target while that creep stays in range and otherwise picks the
    /// lowest creep identifier it can hit.
    pub fn handle(&mut self, towers: &TowerView, events: &[Event], out: &mut Vec<TowerTarget>) {
        out.clear();

        let kinds: BTreeMap<TowerId, TowerKind> = towers
            .iter()
            .map(|tower| (tower.id, tower.kind))
            .collect();
        for event in events {
            self.fold(&kinds, event);
        }
        self.candidates.retain(|tower, _| kinds.contains_key(tower));
        self.current.retain(|tower, _| kinds.contains_key(tower));

        for (&tower, creeps) in &self.candidates {
            let kept = self
                .current
                .get(&tower)
                .copied()
                .filter(|creep| creeps.contains(creep));
            let Some(creep) = kept.or_else(|| creeps.iter().next().copied()) else {
                let _ = self.current.remove(&tower);
                continue;
            };
            if kept.is_none() {
                trace!(?tower, ?creep, "tower acquired target");
            }
            let _ = self.current.insert(tower, creep);
            out.push(TowerTarget { tower, creep });
        }
    }

    fn fold(&mut self, kinds: &BTreeMap<TowerId, TowerKind>, event: &Event) {
        match event {
            Event::BoardConfigured { .. } => {
                self.candidates.clear();
                self.current.clear();
            }
            Event::CreepEnteredRange { tower, creep, kind } => {
                let Some(tower_kind) = kinds.get(tower) else {
                    return;
                };
                if tower_kind.can_target(*kind) {
                    let _ = self.candidates.entry(*tower).or_default().insert(*creep);
                }
            }
            Event::CreepLeftRange { tower, creep, .. } => {
                if let Some(creeps) = self.candidates.get_mut(tower) {
                    let _ = creeps.remove(creep);
                }
            }
            Event::CreepRemoved { creep, .. } => {
                for creeps in self.candidates.values_mut() {
                    let _ = creeps.remove(creep);
                }
            }
            Event::TowerRemoved { tower, .. } => {
                let _ = self.candidates.remove(tower);
                let _ = self.current.remove(tower);
            }
            _ => {}
        }
    }
}
