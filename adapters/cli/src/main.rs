#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter that builds a board, places towers and
//! prints the resulting state and navigation grids.

mod layout_transfer;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tower_defence_core::{BoardConfig, CellCoord, Command, Event, TowerId, TowerKind};
use tower_defence_world::{self as world, query, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use layout_transfer::{TowerLayoutSnapshot, TowerLayoutTower};

/// Command-line arguments accepted by the tower defence adapter.
#[derive(Debug, Parser)]
#[command(name = "tower-defence")]
#[command(about = "Builds a tower defence board and reports its navigation fields")]
struct Cli {
    /// TOML file describing the board layout. Defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Tower to place, written as KIND@COLUMN,ROW. May be repeated.
    #[arg(long = "tower", value_name = "KIND@COLUMN,ROW", value_parser = parse_tower_placement)]
    towers: Vec<TowerLayoutTower>,
    /// Layout string previously produced by --export.
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<String>,
    /// Prints the final tower layout as a transfer string.
    #[arg(long, default_value_t = false)]
    export: bool,
    /// Prints the promoted cost grid after the state grid.
    #[arg(long, default_value_t = false)]
    dump_costs: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::ConfigureBoard { config }, &mut events)
        .context("failed to configure the board")?;

    let mut towers = Vec::new();
    if let Some(layout) = cli.layout.as_deref() {
        let snapshot =
            TowerLayoutSnapshot::decode(layout).context("failed to decode the tower layout")?;
        if (snapshot.columns, snapshot.rows) != (config.columns, config.rows) {
            bail!(
                "layout was captured on a {}x{} board but the board is {}x{}",
                snapshot.columns,
                snapshot.rows,
                config.columns,
                config.rows
            );
        }
        towers.extend(snapshot.towers);
    }
    towers.extend(cli.towers);

    let placed = place_towers(&mut world, &towers)?;
    info!(requested = towers.len(), placed, "towers applied");

    print!("{}", query::dump_state_grid(&world));
    if cli.dump_costs {
        println!();
        print!("{}", query::dump_cost_grid(&world));
    }
    if cli.export {
        let (columns, rows) = query::dimensions(&world);
        let snapshot = TowerLayoutSnapshot::capture(columns, rows, &query::tower_view(&world));
        let encoded = snapshot.encode().context("failed to encode the tower layout")?;
        println!("{encoded}");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<BoardConfig> {
    let Some(path) = path else {
        return Ok(BoardConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read board config {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse board config {}", path.display()))
}

/// Places each tower and raises it to its recorded level. Returns how many stood.
fn place_towers(world: &mut World, towers: &[TowerLayoutTower]) -> Result<usize> {
    let mut placed = 0;
    for tower in towers {
        let mut events = Vec::new();
        world::apply(
            world,
            Command::PlaceTower {
                kind: tower.kind,
                origin: tower.origin,
            },
            &mut events,
        )
        .with_context(|| format!("failed to place tower at {:?}", tower.origin))?;

        let Some(id) = placed_tower(&events) else {
            warn!(kind = ?tower.kind, origin = ?tower.origin, "tower was not placed");
            continue;
        };
        placed += 1;

        for _ in 0..tower.level {
            world::apply(world, Command::UpgradeTower { tower: id }, &mut events)
                .with_context(|| format!("failed to upgrade tower {id:?}"))?;
        }
    }
    Ok(placed)
}

fn placed_tower(events: &[Event]) -> Option<TowerId> {
    events.iter().find_map(|event| match event {
        Event::TowerPlaced { tower, .. } => Some(*tower),
        _ => None,
    })
}

fn parse_tower_placement(value: &str) -> Result<TowerLayoutTower, String> {
    let (kind, position) = value
        .split_once('@')
        .ok_or_else(|| format!("expected KIND@COLUMN,ROW, got '{value}'"))?;
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "cannon" => TowerKind::Cannon,
        "fast" => TowerKind::Fast,
        "heavy" => TowerKind::Heavy,
        other => return Err(format!("unknown tower kind '{other}'")),
    };
    let (column, row) = position
        .split_once(',')
        .ok_or_else(|| format!("expected COLUMN,ROW, got '{position}'"))?;
    let column = column
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column '{column}': {error}"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row '{row}': {error}"))?;

    Ok(TowerLayoutTower {
        kind,
        origin: CellCoord::new(column, row),
        level: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tower_flags_parse_kind_and_origin() {
        let cli = Cli::try_parse_from([
            "tower-defence",
            "--tower",
            "fast@5,1",
            "--tower",
            "Heavy@ 7 , 3",
            "--dump-costs",
        ])
        .expect("arguments parse");

        assert!(cli.dump_costs);
        assert!(!cli.export);
        assert_eq!(
            cli.towers,
            vec![
                TowerLayoutTower {
                    kind: TowerKind::Fast,
                    origin: CellCoord::new(5, 1),
                    level: 0,
                },
                TowerLayoutTower {
                    kind: TowerKind::Heavy,
                    origin: CellCoord::new(7, 3),
                    level: 0,
                },
            ]
        );
    }

    #[test]
    fn malformed_tower_flags_are_rejected() {
        assert!(parse_tower_placement("fast").is_err());
        assert!(parse_tower_placement("laser@1,1").is_err());
        assert!(parse_tower_placement("fast@1").is_err());
        assert!(parse_tower_placement("fast@-1,2").is_err());
    }

    #[test]
    fn placed_layout_exports_with_levels() {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureBoard {
                config: BoardConfig {
                    columns: 12,
                    rows: 8,
                    side_wall_thickness: 2,
                    opening_span: 2,
                },
            },
            &mut events,
        )
        .expect("configure");

        let requested = [
            TowerLayoutTower {
                kind: TowerKind::Cannon,
                origin: CellCoord::new(5, 1),
                level: 2,
            },
            TowerLayoutTower {
                kind: TowerKind::Fast,
                origin: CellCoord::new(0, 0),
                level: 0,
            },
        ];
        assert_eq!(place_towers(&mut world, &requested).expect("place"), 1);

        let snapshot = TowerLayoutSnapshot::capture(12, 8, &query::tower_view(&world));
        assert_eq!(snapshot.towers, vec![requested[0]]);
    }
}
