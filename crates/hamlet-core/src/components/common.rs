//! Spatial components: where a villager is, where it is going, what it covers.

use hamlet_logic::building::BuildingId;
use hamlet_logic::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Continuous position in village pixel space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position(pub Vec2);

/// Movement toward an optional destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub destination: Option<Vec2>,
    /// Pixels per second
    pub speed: f32,
    /// Seconds left before the next destination pick
    pub idle_timer: f32,
}

impl Movement {
    pub fn new(speed: f32) -> Self {
        Self {
            destination: None,
            speed,
            idle_timer: 0.0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.destination.is_some()
    }
}

/// Visual bounding box, recentered whenever the villager is placed.
///
/// `None` until a renderer (or bed placement) supplies one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub rect: Option<Rect>,
}

/// Building whose footprint currently contains the villager
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub inside: Option<BuildingId>,
}
