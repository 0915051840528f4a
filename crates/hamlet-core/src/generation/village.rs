//! Village layout generation
//!
//! The village is a street grid with a street every [`BLOCK_TILES`] tiles.
//! Each block's interior (4x4 tiles) can hold one building. A two-tile
//! river runs north-south between streets, bridged wherever a street
//! crosses it.

use crate::village::{terrain_key, Bridge, InteractionPoint, PointKind, Terrain, Village};
use hamlet_logic::building::{Building, BuildingType, SizeClass};
use hamlet_logic::config::WorldConfig;
use hamlet_logic::geometry::PixelPos;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Street spacing in tiles
pub const BLOCK_TILES: i32 = 5;

const BENCH_COUNT: usize = 3;

pub fn generate_village(config: &WorldConfig, rng: &mut impl Rng) -> Village {
    let tile = config.tile_size.max(1);
    let cols = (config.width / tile).max(1);
    let rows = (config.height / tile).max(1);
    let mut village = Village::empty(cols * tile, rows * tile, tile);

    let street_cols = lay_streets(cols, config.path_density, rng);
    let street_rows = lay_streets(rows, config.path_density, rng);
    let river = pick_river_column(cols, rng);

    let mut path_tiles: BTreeSet<(i32, i32)> = BTreeSet::new();
    for &c in &street_cols {
        for r in 0..rows {
            path_tiles.insert((c, r));
        }
    }
    for &r in &street_rows {
        for c in 0..cols {
            path_tiles.insert((c, r));
        }
    }

    let water_cols: Vec<i32> = river.map(|c| vec![c, c + 1]).unwrap_or_default();
    for &c in &water_cols {
        for r in 0..rows {
            let pos = (c * tile, r * tile);
            if path_tiles.contains(&(c, r)) {
                village.terrain.insert(terrain_key(pos), Terrain::Bridge);
            } else {
                village.terrain.insert(terrain_key(pos), Terrain::Water);
                village.water.push(pos);
            }
        }
    }
    if let Some(c) = river {
        for &r in &street_rows {
            village.bridges.push(Bridge {
                position: (c * tile, r * tile),
                horizontal: true,
            });
        }
    }

    for &(c, r) in &path_tiles {
        let pos = (c * tile, r * tile);
        if !water_cols.contains(&c) {
            village.terrain.insert(terrain_key(pos), Terrain::Path);
        }
        village.paths.push(pos);
    }

    place_buildings(&mut village, cols, rows, config.building_count, &water_cols, rng);
    place_points(&mut village, &street_cols, &street_rows, rng);

    info!(
        "Generated {}x{} village: {} buildings, {} path tiles, {} bridges",
        village.width,
        village.height,
        village.buildings.len(),
        village.paths.len(),
        village.bridges.len()
    );
    village
}

/// Street lines along one axis. The middle line is always laid; the rest
/// survive with probability `density`.
fn lay_streets(extent: i32, density: f32, rng: &mut impl Rng) -> Vec<i32> {
    let lines: Vec<i32> = (0..extent).step_by(BLOCK_TILES as usize).collect();
    let middle = lines.get(lines.len() / 2).copied();
    lines
        .into_iter()
        .filter(|&line| Some(line) == middle || rng.gen::<f32>() < density)
        .collect()
}

/// Left column of the river, chosen so both water columns sit between
/// streets. `None` when the village is too narrow for one.
fn pick_river_column(cols: i32, rng: &mut impl Rng) -> Option<i32> {
    let candidates: Vec<i32> = (0..cols - 1)
        .filter(|c| c % BLOCK_TILES == 2)
        .filter(|c| *c >= cols / 4 && *c <= cols * 3 / 4)
        .collect();
    candidates.choose(rng).copied()
}

fn random_size(rng: &mut impl Rng) -> SizeClass {
    let roll = rng.gen::<f32>();
    if roll < 0.5 {
        SizeClass::Small
    } else if roll < 0.8 {
        SizeClass::Medium
    } else {
        SizeClass::Large
    }
}

fn place_buildings(
    village: &mut Village,
    cols: i32,
    rows: i32,
    count: usize,
    water_cols: &[i32],
    rng: &mut impl Rng,
) {
    let tile = village.tile_size;
    let mut blocks: Vec<(i32, i32)> = Vec::new();
    for by in 0..rows / BLOCK_TILES {
        for bx in 0..cols / BLOCK_TILES {
            blocks.push((bx * BLOCK_TILES + 1, by * BLOCK_TILES + 1));
        }
    }
    blocks.shuffle(rng);

    let interior = BLOCK_TILES - 1;
    for (col, row) in blocks {
        if village.buildings.len() >= count {
            break;
        }
        let size = random_size(rng);
        let span = size.multiplier();
        let col = col + rng.gen_range(0..=interior - span);
        let row = row + rng.gen_range(0..=interior - span);

        if (col..col + span).any(|c| water_cols.contains(&c)) {
            debug!("Skipping building site at tile ({}, {}): water", col, row);
            continue;
        }

        let building_type = BuildingType::candidates_for(size)
            .choose(rng)
            .copied()
            .unwrap_or(BuildingType::House);
        let id = village.buildings.len() as i32;
        village
            .buildings
            .push(Building::new(id, (col * tile, row * tile), size, building_type));
    }
}

fn place_points(
    village: &mut Village,
    street_cols: &[i32],
    street_rows: &[i32],
    rng: &mut impl Rng,
) {
    let tile = village.tile_size;
    let crossings: Vec<PixelPos> = street_rows
        .iter()
        .flat_map(|&r| street_cols.iter().map(move |&c| (c * tile, r * tile)))
        .filter(|pos| village.terrain_at(*pos) == Terrain::Path)
        .collect();

    let mut picks = crossings.choose_multiple(rng, 2);
    if let Some(&well) = picks.next() {
        village.interaction_points.push(InteractionPoint {
            kind: PointKind::Well,
            position: well,
        });
    }
    if let Some(&square) = picks.next() {
        village.interaction_points.push(InteractionPoint {
            kind: PointKind::MarketSquare,
            position: square,
        });
    }

    let benches: Vec<PixelPos> = village
        .paths
        .choose_multiple(rng, BENCH_COUNT)
        .copied()
        .collect();
    for position in benches {
        village.interaction_points.push(InteractionPoint {
            kind: PointKind::Bench,
            position,
        });
    }
}
