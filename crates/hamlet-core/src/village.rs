//! Village layout - buildings, terrain, paths, water and points of interest.
//!
//! The building list is the shared roster that housing mutates (types and
//! names). Per-tick systems only read it.

use hamlet_logic::building::{Building, BuildingId};
use hamlet_logic::geometry::{PixelPos, Vec2};
use hamlet_logic::housing::VillageBounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Grass,
    Path,
    Water,
    Bridge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub position: PixelPos,
    /// Crosses a north-south river from west to east
    pub horizontal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Well,
    MarketSquare,
    Bench,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPoint {
    pub kind: PointKind,
    pub position: PixelPos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Village {
    pub width: i32,
    pub height: i32,
    pub tile_size: i32,
    pub buildings: Vec<Building>,
    /// Terrain by tile pixel corner, keyed `"x,y"`
    pub terrain: BTreeMap<String, Terrain>,
    pub water: Vec<PixelPos>,
    pub paths: Vec<PixelPos>,
    pub bridges: Vec<Bridge>,
    pub interaction_points: Vec<InteractionPoint>,
}

impl Village {
    /// An empty village with no buildings or terrain.
    pub fn empty(width: i32, height: i32, tile_size: i32) -> Self {
        Self {
            width,
            height,
            tile_size,
            buildings: Vec::new(),
            terrain: BTreeMap::new(),
            water: Vec::new(),
            paths: Vec::new(),
            bridges: Vec::new(),
            interaction_points: Vec::new(),
        }
    }

    pub fn bounds(&self) -> VillageBounds {
        VillageBounds {
            width: self.width,
            height: self.height,
            tile_size: self.tile_size,
        }
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        id.index().and_then(|i| self.buildings.get(i))
    }

    /// First building whose footprint contains `point`.
    pub fn building_at(&self, point: &Vec2) -> Option<BuildingId> {
        self.buildings
            .iter()
            .find(|b| b.contains(point, self.tile_size))
            .map(|b| b.id)
    }

    pub fn terrain_at(&self, tile: PixelPos) -> Terrain {
        self.terrain
            .get(&terrain_key(tile))
            .copied()
            .unwrap_or(Terrain::Grass)
    }

    /// Center of a path tile, in pixels.
    pub fn tile_center(&self, tile: PixelPos) -> Vec2 {
        let half = self.tile_size as f32 / 2.0;
        Vec2::new(tile.0 as f32 + half, tile.1 as f32 + half)
    }

    /// Distance villagers keep from the map edge: two tiles.
    pub fn edge_margin(&self) -> f32 {
        (2 * self.tile_size) as f32
    }

    /// Pull `point` inside the edge margin. An axis too short for the
    /// margin collapses to its midpoint.
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        let margin = self.edge_margin();
        Vec2::new(
            clamp_axis(point.x, self.width as f32, margin),
            clamp_axis(point.y, self.height as f32, margin),
        )
    }
}

fn clamp_axis(value: f32, extent: f32, margin: f32) -> f32 {
    if extent - margin > margin {
        value.clamp(margin, extent - margin)
    } else {
        extent / 2.0
    }
}

pub fn terrain_key(tile: PixelPos) -> String {
    format!("{},{}", tile.0, tile.1)
}
