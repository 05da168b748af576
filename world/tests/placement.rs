use tower_defence_core::{
    BoardConfig, CellCoord, CellRect, Command, CreepId, CreepKind, Event, NavDirection, NodeState,
    PlacementError, RemovalError, StructureError, StructureId, StructureKind, TowerId, TowerKind,
    UpgradeError,
};
use tower_defence_world::{self as world, query, GridError, GridNode, World, WorldError};

/// Board with two-column side walls and openings on rows 3 and 4.
fn configured(columns: u32, rows: u32) -> World {
    let mut world = World::new();
    let events = apply_ok(
        &mut world,
        Command::ConfigureBoard {
            config: BoardConfig {
                columns,
                rows,
                side_wall_thickness: 2,
                opening_span: 2,
            },
        },
    );
    assert_eq!(events.last(), Some(&Event::NavigationPromoted));
    world
}

fn apply_ok(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command.clone(), &mut events)
        .unwrap_or_else(|error| panic!("{command:?} failed: {error}"));
    events
}

fn snapshot(world: &World) -> Vec<GridNode> {
    let (columns, rows) = query::dimensions(world);
    (0..rows)
        .flat_map(|row| (0..columns).map(move |column| CellCoord::new(column, row)))
        .map(|cell| query::node(world, cell).expect("cell on grid").clone())
        .collect()
}

fn place_tower(column: u32, row: u32) -> Command {
    Command::PlaceTower {
        kind: TowerKind::Fast,
        origin: CellCoord::new(column, row),
    }
}

fn region(column: u32, row: u32) -> CellRect {
    CellRect::from_origin_and_size(CellCoord::new(column, row), TowerKind::Fast.footprint())
}

#[test]
fn third_tower_sealing_the_board_is_rejected() {
    let mut world = configured(12, 8);

    assert_eq!(
        apply_ok(&mut world, place_tower(5, 1)),
        vec![
            Event::TowerPlaced {
                tower: TowerId::new(0),
                kind: TowerKind::Fast,
                region: region(5, 1),
            },
            Event::NavigationPromoted,
        ]
    );
    assert_eq!(
        apply_ok(&mut world, place_tower(5, 3)),
        vec![
            Event::TowerPlaced {
                tower: TowerId::new(1),
                kind: TowerKind::Fast,
                region: region(5, 3),
            },
            Event::NavigationPromoted,
        ]
    );

    let before = snapshot(&world);
    assert_eq!(
        apply_ok(&mut world, place_tower(5, 5)),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Fast,
            origin: CellCoord::new(5, 5),
            reason: PlacementError::Blocking,
        }]
    );
    assert_eq!(before, snapshot(&world), "rejection must leave the grid untouched");
    assert!(query::is_navigation_valid(&world));
    assert_eq!(query::tower_view(&world).iter().count(), 2);
}

#[test]
fn tower_sealing_a_creep_is_rejected() {
    let mut world = configured(12, 8);

    assert_eq!(
        apply_ok(
            &mut world,
            Command::SpawnCreep {
                kind: CreepKind::Basic,
                cell: CellCoord::new(2, 1),
            }
        ),
        vec![Event::CreepSpawned {
            creep: CreepId::new(0),
            kind: CreepKind::Basic,
            cell: CellCoord::new(2, 1),
        }]
    );
    assert_eq!(
        query::node(&world, CellCoord::new(2, 1)).map(GridNode::state),
        Some(NodeState::Populated)
    );

    let events = apply_ok(
        &mut world,
        Command::PlaceStructure {
            kind: StructureKind::Wall,
            cell: CellCoord::new(2, 2),
        },
    );
    assert!(
        matches!(
            events.as_slice(),
            [
                Event::StructurePlaced {
                    kind: StructureKind::Wall,
                    ..
                },
                Event::NavigationPromoted
            ]
        ),
        "unexpected events {events:?}"
    );

    let before = snapshot(&world);
    assert_eq!(
        apply_ok(&mut world, place_tower(3, 1)),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Fast,
            origin: CellCoord::new(3, 1),
            reason: PlacementError::Blocking,
        }]
    );
    let after = snapshot(&world);
    for (left, right) in before.iter().zip(&after) {
        assert_eq!(left.state(), right.state(), "state at {:?}", left.cell());
        assert_eq!(
            left.spt_cost().to_bits(),
            right.spt_cost().to_bits(),
            "cost at {:?}",
            left.cell()
        );
        assert_eq!(left.nav_direction(), right.nav_direction());
    }
}

#[test]
fn sealing_an_empty_pocket_is_legal() {
    let mut world = configured(12, 8);
    let _ = apply_ok(
        &mut world,
        Command::PlaceStructure {
            kind: StructureKind::Wall,
            cell: CellCoord::new(2, 2),
        },
    );

    let events = apply_ok(&mut world, place_tower(3, 1));
    assert!(
        matches!(events.first(), Some(Event::TowerPlaced { .. })),
        "unexpected events {events:?}"
    );
    let pocket = query::node(&world, CellCoord::new(2, 1)).expect("pocket");
    assert!(pocket.spt_cost().is_infinite());
    assert_eq!(pocket.nav_direction(), None);
}

#[test]
fn creep_spawned_mid_step_discards_the_stepped_tree() {
    let mut world = configured(12, 8);
    let _ = apply_ok(
        &mut world,
        Command::PlaceStructure {
            kind: StructureKind::Wall,
            cell: CellCoord::new(2, 2),
        },
    );
    let _ = apply_ok(&mut world, place_tower(3, 1));

    assert!(apply_ok(&mut world, Command::StepNavigation).is_empty());
    assert!(query::is_navigation_pending(&world), "one step leaves the tree parked");

    let pocket = CellCoord::new(2, 1);
    let events = apply_ok(
        &mut world,
        Command::SpawnCreep {
            kind: CreepKind::Basic,
            cell: pocket,
        },
    );
    assert!(matches!(events.first(), Some(Event::CreepSpawned { .. })));
    assert!(
        !query::is_navigation_pending(&world),
        "a newly populated cell discards the parked tree"
    );
    assert!(query::is_navigation_valid(&world), "promoted fields stay in force");

    assert_eq!(
        apply_ok(&mut world, Command::RebuildNavigation),
        vec![Event::NavigationInvalidated],
        "the sealed creep has no route to an exit"
    );
    assert!(!query::is_navigation_valid(&world));
}

#[test]
fn tower_sealing_the_entrances_is_rejected() {
    let mut world = configured(8, 6);

    assert_eq!(
        apply_ok(&mut world, place_tower(2, 2)),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Fast,
            origin: CellCoord::new(2, 2),
            reason: PlacementError::Blocking,
        }]
    );
    let events = apply_ok(&mut world, place_tower(3, 1));
    assert!(matches!(events.first(), Some(Event::TowerPlaced { .. })));
    assert_eq!(query::tower_at(&world, CellCoord::new(4, 2)), Some(TowerId::new(0)));
    assert_eq!(query::tower_at(&world, CellCoord::new(2, 2)), None);
}

#[test]
fn placement_prechecks_bounds_and_occupancy() {
    let mut world = configured(12, 8);

    assert_eq!(
        apply_ok(&mut world, place_tower(11, 6)),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Fast,
            origin: CellCoord::new(11, 6),
            reason: PlacementError::OutOfBounds,
        }]
    );
    assert_eq!(
        apply_ok(&mut world, place_tower(1, 1)),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Fast,
            origin: CellCoord::new(1, 1),
            reason: PlacementError::Occupied,
        }]
    );

    let _ = apply_ok(&mut world, place_tower(5, 1));
    assert_eq!(
        apply_ok(&mut world, place_tower(6, 2)),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Fast,
            origin: CellCoord::new(6, 2),
            reason: PlacementError::Occupied,
        }]
    );
}

#[test]
fn selling_a_tower_restores_navigation() {
    let mut world = configured(12, 8);
    let before = query::dump_cost_grid(&world);

    let _ = apply_ok(&mut world, place_tower(5, 3));
    assert_ne!(before, query::dump_cost_grid(&world));

    assert_eq!(
        apply_ok(
            &mut world,
            Command::RemoveTower {
                tower: TowerId::new(0)
            }
        ),
        vec![
            Event::TowerRemoved {
                tower: TowerId::new(0),
                region: region(5, 3),
            },
            Event::NavigationPromoted,
        ]
    );
    assert_eq!(before, query::dump_cost_grid(&world));
    assert_eq!(
        query::node(&world, CellCoord::new(5, 3)).map(GridNode::state),
        Some(NodeState::Open)
    );

    assert_eq!(
        apply_ok(
            &mut world,
            Command::RemoveTower {
                tower: TowerId::new(0)
            }
        ),
        vec![Event::TowerRemovalRejected {
            tower: TowerId::new(0),
            reason: RemovalError::MissingTower,
        }]
    );
}

#[test]
fn creeps_crossing_range_boundaries_emit_events() {
    let mut world = configured(12, 8);
    let _ = apply_ok(&mut world, place_tower(5, 1));
    let tower = TowerId::new(0);
    let creep = CreepId::new(0);
    let entrance = CellCoord::new(0, 3);
    let inside = CellCoord::new(1, 3);

    assert_eq!(
        apply_ok(
            &mut world,
            Command::SpawnCreep {
                kind: CreepKind::Basic,
                cell: entrance,
            }
        ),
        vec![Event::CreepSpawned {
            creep,
            kind: CreepKind::Basic,
            cell: entrance,
        }],
        "the entrance lies outside the base range"
    );
    assert_eq!(
        apply_ok(&mut world, Command::MoveCreep { creep, to: inside }),
        vec![
            Event::CreepMoved {
                creep,
                from: entrance,
                to: inside,
            },
            Event::CreepEnteredRange {
                tower,
                creep,
                kind: CreepKind::Basic,
            },
        ]
    );
    assert_eq!(
        apply_ok(&mut world, Command::MoveCreep { creep, to: inside }),
        Vec::new(),
        "moving onto the current cell is a no-op"
    );
    assert_eq!(
        apply_ok(&mut world, Command::MoveCreep { creep, to: entrance }),
        vec![
            Event::CreepMoved {
                creep,
                from: inside,
                to: entrance,
            },
            Event::CreepLeftRange {
                tower,
                creep,
                kind: CreepKind::Basic,
            },
        ]
    );

    assert_eq!(
        apply_ok(&mut world, Command::UpgradeTower { tower }),
        vec![Event::TowerUpgraded { tower, level: 1 }]
    );
    assert_eq!(
        apply_ok(&mut world, Command::UpgradeTower { tower }),
        vec![
            Event::TowerUpgraded { tower, level: 2 },
            Event::CreepEnteredRange {
                tower,
                creep,
                kind: CreepKind::Basic,
            },
        ],
        "the top level reaches the entrance"
    );
    assert_eq!(
        apply_ok(&mut world, Command::UpgradeTower { tower }),
        vec![Event::TowerUpgradeRejected {
            tower,
            reason: UpgradeError::MaxLevel,
        }]
    );

    assert_eq!(
        apply_ok(&mut world, Command::RemoveCreep { creep }),
        vec![
            Event::CreepRemoved {
                creep,
                cell: entrance,
            },
            Event::CreepLeftRange {
                tower,
                creep,
                kind: CreepKind::Basic,
            },
        ]
    );
    assert_eq!(query::creep_view(&world).iter().count(), 0);
}

#[test]
fn structures_follow_the_same_protocol() {
    let mut world = configured(12, 8);
    let upper_exit = CellCoord::new(11, 3);
    let lower_exit = CellCoord::new(11, 4);
    let (first, kind) = query::structure_at(&world, upper_exit).expect("exit");
    assert_eq!(kind, StructureKind::Exit);
    let (second, _) = query::structure_at(&world, lower_exit).expect("exit");
    let count = query::structure_count(&world);

    assert_eq!(
        apply_ok(&mut world, Command::RemoveStructure { structure: first }),
        vec![
            Event::StructureRemoved {
                structure: first,
                cell: upper_exit,
            },
            Event::NavigationPromoted,
        ]
    );
    assert_eq!(query::structure_count(&world), count - 1);

    let before = snapshot(&world);
    assert_eq!(
        apply_ok(&mut world, Command::RemoveStructure { structure: second }),
        vec![Event::StructureRemovalRejected {
            structure: second,
            reason: StructureError::Blocking,
        }],
        "the last exit cannot be removed"
    );
    assert_eq!(before, snapshot(&world));

    assert_eq!(
        apply_ok(&mut world, Command::RemoveStructure { structure: first }),
        vec![Event::StructureRemovalRejected {
            structure: first,
            reason: StructureError::Missing,
        }]
    );

    let events = apply_ok(
        &mut world,
        Command::PlaceStructure {
            kind: StructureKind::Exit,
            cell: CellCoord::new(5, 5),
        },
    );
    assert!(matches!(
        events.as_slice(),
        [
            Event::StructurePlaced {
                kind: StructureKind::Exit,
                ..
            },
            Event::NavigationPromoted
        ]
    ));
    let events = apply_ok(&mut world, Command::RemoveStructure { structure: second });
    assert!(
        matches!(events.first(), Some(Event::StructureRemoved { .. })),
        "a second exit frees the first"
    );
}

#[test]
fn structure_requests_are_prechecked() {
    let mut world = configured(12, 8);
    let cell = CellCoord::new(0, 0);

    assert_eq!(
        apply_ok(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Wall,
                cell,
            }
        ),
        vec![Event::StructurePlacementRejected {
            kind: StructureKind::Wall,
            cell,
            reason: StructureError::Occupied,
        }]
    );
    assert_eq!(
        apply_ok(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Wall,
                cell: CellCoord::new(12, 0),
            }
        ),
        vec![Event::StructurePlacementRejected {
            kind: StructureKind::Wall,
            cell: CellCoord::new(12, 0),
            reason: StructureError::OutOfBounds,
        }]
    );

    let entrance = CellCoord::new(0, 3);
    let (structure, _) = query::structure_at(&world, entrance).expect("entrance");
    let _ = apply_ok(
        &mut world,
        Command::SpawnCreep {
            kind: CreepKind::Fast,
            cell: entrance,
        },
    );
    assert_eq!(
        apply_ok(&mut world, Command::RemoveStructure { structure }),
        vec![Event::StructureRemovalRejected {
            structure,
            reason: StructureError::Occupied,
        }]
    );
    assert_eq!(
        apply_ok(
            &mut world,
            Command::RemoveStructure {
                structure: StructureId::new(u32::MAX)
            }
        ),
        vec![Event::StructureRemovalRejected {
            structure: StructureId::new(u32::MAX),
            reason: StructureError::Missing,
        }]
    );
}

#[test]
fn flying_creeps_do_not_populate_nodes() {
    let mut world = configured(12, 8);
    let wall = CellCoord::new(0, 0);
    let _ = apply_ok(
        &mut world,
        Command::SpawnCreep {
            kind: CreepKind::Flying,
            cell: wall,
        },
    );
    let node = query::node(&world, wall).expect("wall");
    assert_eq!(node.state(), NodeState::Blocked);
    assert_eq!(node.flying_creeps(), 1);
    assert_eq!(node.ground_creeps(), 0);
}

#[test]
fn corrupt_requests_are_fatal() {
    let mut world = configured(12, 8);
    let mut events = Vec::new();
    let creep = CreepId::new(7);

    assert_eq!(
        world::apply(
            &mut world,
            Command::MoveCreep {
                creep,
                to: CellCoord::new(3, 3),
            },
            &mut events,
        ),
        Err(WorldError::UnknownCreep { creep })
    );
    assert_eq!(
        world::apply(
            &mut world,
            Command::SpawnCreep {
                kind: CreepKind::Basic,
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        ),
        Err(WorldError::Grid(GridError::NotEnterable {
            creep: CreepId::new(0),
            cell: CellCoord::new(0, 0),
            state: NodeState::Blocked,
        }))
    );
    assert!(events.is_empty());
}

#[test]
fn navigation_view_exposes_promoted_fields() {
    let world = configured(12, 8);
    let view = query::navigation_view(&world);

    assert!(view.is_valid());
    assert_eq!(view.dimensions(), (12, 8));
    assert_eq!(view.state(CellCoord::new(11, 3)), Some(NodeState::Exit));
    assert_eq!(view.cost(CellCoord::new(10, 3)), Some(1.0));
    assert_eq!(
        view.direction(CellCoord::new(10, 3)),
        NavDirection::new(1, 0),
        "directions point towards the exit"
    );
    assert_eq!(view.direction(CellCoord::new(11, 3)), Some(NavDirection::ARRIVED));
    assert_eq!(view.state(CellCoord::new(12, 3)), None);
}
