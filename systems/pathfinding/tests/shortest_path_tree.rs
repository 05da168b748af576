use std::f64::consts::SQRT_2;

use tower_defence_core::{
    CellCoord, NavDirection, NodeState,
    NodeState::{Blocked as B, Entrance as N, Exit as X, Open as O, Populated as P},
};
use tower_defence_system_pathfinding::{ShortestPathTree, TreeState};

/// Builds a tree from a table where each inner array is one column,
/// so `table[i][j]` is the cell at column `i`, row `j`.
fn build<const C: usize, const R: usize>(table: [[NodeState; R]; C]) -> ShortestPathTree {
    let columns = u32::try_from(C).expect("columns");
    let rows = u32::try_from(R).expect("rows");
    ShortestPathTree::new(columns, rows, |cell| {
        table[cell.column() as usize][cell.row() as usize]
    })
    .expect("seed tree")
}

fn run_and_verify<const C: usize, const R: usize>(
    table: [[NodeState; R]; C],
    expected_valid: bool,
) -> ShortestPathTree {
    let mut tree = build(table);
    tree.run().expect("run tree");
    assert!(tree.is_complete(), "run must finish the tree");
    assert_eq!(
        tree.is_valid(),
        expected_valid,
        "unexpected validity for grid {table:?}"
    );
    tree
}

fn cost(tree: &ShortestPathTree, column: u32, row: u32) -> f64 {
    tree.cost(CellCoord::new(column, row)).expect("cell on grid")
}

fn assert_cost(tree: &ShortestPathTree, column: u32, row: u32, expected: f64) {
    let actual = cost(tree, column, row);
    assert!(
        (actual - expected).abs() < 1e-9,
        "cost at ({column}, {row}) was {actual}, expected {expected}"
    );
}

#[test]
fn simple_grid_reaches_far_corner() {
    let tree = run_and_verify([[N, O, O], [O, O, O], [O, O, X]], true);
    assert_cost(&tree, 2, 0, 2.0);
    assert_cost(&tree, 0, 0, 2.0 * SQRT_2);
    assert_cost(&tree, 2, 2, 0.0);
}

#[test]
fn simple_grid_with_exit_beside_entrance() {
    let tree = run_and_verify([[N, X, O], [O, O, O], [O, O, O]], true);
    assert_cost(&tree, 2, 1, 2.0);
    assert_cost(&tree, 0, 0, 1.0);
}

#[test]
fn isolating_empty_cell_is_legal() {
    let tree = run_and_verify([[N, B, O], [O, O, B], [B, O, X]], true);
    assert_cost(&tree, 0, 0, 4.0);
    let isolated = tree.state(CellCoord::new(0, 2)).expect("state");
    assert_eq!(isolated.tree_state(), TreeState::Init);
    assert!(isolated.cost().is_infinite());
}

#[test]
fn isolating_populated_cell_is_illegal() {
    let _ = run_and_verify([[N, B, P], [O, O, B], [B, O, X]], false);
}

#[test]
fn multiple_entrances_and_exits_are_legal() {
    let tree = run_and_verify([[N, O, X], [O, O, O], [X, O, N]], true);
    assert_cost(&tree, 1, 0, 1.0);
}

#[test]
fn wall_between_entrance_and_exit_is_illegal() {
    let _ = run_and_verify([[N, B, O], [O, B, O], [O, B, X]], false);
}

#[test]
fn partitions_with_own_exits_are_legal() {
    let _ = run_and_verify([[N, B, N], [O, B, O], [X, B, X]], true);
}

#[test]
fn partitions_separating_entrances_from_exits_are_illegal() {
    let _ = run_and_verify([[N, O, N], [B, B, B], [X, O, X]], false);
}

#[test]
fn diagonal_past_blocked_corner_is_skipped() {
    // Exit at (0,0), wall at (1,0), entrance at (1,1).
    let tree = run_and_verify([[X, O], [B, N]], true);
    assert_cost(&tree, 1, 1, 2.0);
    assert_eq!(
        tree.direction(CellCoord::new(1, 1)),
        NavDirection::new(-1, 0),
        "entrance must walk around the wall corner"
    );
}

#[test]
fn diagonal_between_two_walls_is_sealed() {
    let _ = run_and_verify([[X, B], [B, N]], false);
}

#[test]
fn populated_cell_inside_ring_of_walls_is_illegal() {
    let tree = run_and_verify(
        [
            [X, O, O, O, O],
            [O, B, B, B, O],
            [O, B, P, B, O],
            [O, B, B, B, O],
            [O, O, O, O, N],
        ],
        false,
    );
    assert_cost(&tree, 4, 4, 8.0);
}

#[test]
fn stepping_matches_running() {
    let table = [
        [N, O, O, O],
        [O, B, B, O],
        [O, O, B, O],
        [P, O, O, X],
    ];
    let mut stepped = build(table);
    let mut steps = 0;
    while stepped.step().expect("step").is_some() {
        steps += 1;
        assert!(steps <= 16, "stepping must terminate");
    }
    let ran = run_and_verify(table, true);

    assert!(stepped.is_complete());
    assert_eq!(stepped.is_valid(), ran.is_valid());
    for ((cell, left), (_, right)) in stepped.states().zip(ran.states()) {
        assert_eq!(
            left.cost().to_bits(),
            right.cost().to_bits(),
            "cost differs at {cell:?}"
        );
    }
}

#[test]
fn completed_tree_ignores_further_steps() {
    let mut tree = run_and_verify([[N, O], [O, X]], true);
    let before: Vec<_> = tree.states().map(|(_, state)| *state).collect();

    assert_eq!(tree.step().expect("step"), None);
    tree.run().expect("run");

    let after: Vec<_> = tree.states().map(|(_, state)| *state).collect();
    assert_eq!(before, after, "complete tree must not change");
    assert_eq!(tree.frontier_len(), 0);
}

#[test]
fn incomplete_tree_is_never_valid() {
    let mut tree = build([[N, O, O, X]]);
    assert!(!tree.is_complete());
    assert!(!tree.is_valid(), "pending trees are invalid");
    let _ = tree.step().expect("step");
    assert!(!tree.is_valid());
    tree.run().expect("run");
    assert!(tree.is_valid());
    assert_cost(&tree, 0, 0, 3.0);
}
