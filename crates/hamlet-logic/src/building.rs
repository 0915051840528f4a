//! Buildings - size classes, types, occupancy caps and footprints.

use crate::geometry::{PixelPos, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Index into the village building list; `-1` marks "none/external".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(pub i32);

impl BuildingId {
    pub const NONE: Self = Self(-1);

    pub fn is_none(&self) -> bool {
        self.0 < 0
    }

    /// Position in the building list, if this id refers to one.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl std::fmt::Display for BuildingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Residents a home of this size holds before it is considered full.
    pub fn occupancy_cap(&self) -> usize {
        match self {
            SizeClass::Large => 4,
            SizeClass::Small | SizeClass::Medium => 2,
        }
    }

    /// Footprint edge length in tiles.
    pub fn multiplier(&self) -> i32 {
        match self {
            SizeClass::Small => 1,
            SizeClass::Medium => 2,
            SizeClass::Large => 3,
        }
    }

    pub fn footprint_px(&self, tile_size: i32) -> i32 {
        tile_size * self.multiplier()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    House,
    Cottage,
    Manor,
    Workshop,
    Storage,
    Inn,
    Store,
    Tavern,
    Smithy,
    Bakery,
    #[serde(rename = "Town Hall")]
    TownHall,
    Market,
    Temple,
    Farm,
}

impl BuildingType {
    pub fn is_residential(&self) -> bool {
        matches!(
            self,
            BuildingType::House | BuildingType::Cottage | BuildingType::Manor
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildingType::House => "House",
            BuildingType::Cottage => "Cottage",
            BuildingType::Manor => "Manor",
            BuildingType::Workshop => "Workshop",
            BuildingType::Storage => "Storage",
            BuildingType::Inn => "Inn",
            BuildingType::Store => "Store",
            BuildingType::Tavern => "Tavern",
            BuildingType::Smithy => "Smithy",
            BuildingType::Bakery => "Bakery",
            BuildingType::TownHall => "Town Hall",
            BuildingType::Market => "Market",
            BuildingType::Temple => "Temple",
            BuildingType::Farm => "Farm",
        }
    }

    /// Types a generated building of the given size may take.
    pub fn candidates_for(size: SizeClass) -> &'static [BuildingType] {
        match size {
            SizeClass::Small => &[
                BuildingType::House,
                BuildingType::Cottage,
                BuildingType::Workshop,
                BuildingType::Storage,
            ],
            SizeClass::Medium => &[
                BuildingType::Inn,
                BuildingType::Store,
                BuildingType::Tavern,
                BuildingType::Smithy,
                BuildingType::Bakery,
            ],
            SizeClass::Large => &[
                BuildingType::TownHall,
                BuildingType::Market,
                BuildingType::Temple,
                BuildingType::Manor,
            ],
        }
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A static structure in the village.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    /// Top-left pixel corner
    pub position: PixelPos,
    pub size_class: SizeClass,
    pub building_type: BuildingType,
    pub name: Option<String>,
}

impl Building {
    pub fn new(
        id: i32,
        position: PixelPos,
        size_class: SizeClass,
        building_type: BuildingType,
    ) -> Self {
        Self {
            id: BuildingId(id),
            position,
            size_class,
            building_type,
            name: None,
        }
    }

    pub fn occupancy_cap(&self) -> usize {
        self.size_class.occupancy_cap()
    }

    pub fn footprint(&self, tile_size: i32) -> Rect {
        let size = self.size_class.footprint_px(tile_size) as f32;
        Rect::new(self.position.0 as f32, self.position.1 as f32, size, size)
    }

    pub fn center(&self, tile_size: i32) -> Vec2 {
        self.footprint(tile_size).center()
    }

    pub fn contains(&self, point: &Vec2, tile_size: i32) -> bool {
        self.footprint(tile_size).contains(point)
    }

    /// Display name, falling back to the type label.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.building_type.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_and_multipliers() {
        assert_eq!(SizeClass::Small.occupancy_cap(), 2);
        assert_eq!(SizeClass::Medium.occupancy_cap(), 2);
        assert_eq!(SizeClass::Large.occupancy_cap(), 4);
        assert_eq!(SizeClass::Large.footprint_px(32), 96);
    }

    #[test]
    fn test_residential_types() {
        assert!(BuildingType::Cottage.is_residential());
        assert!(BuildingType::Manor.is_residential());
        assert!(!BuildingType::Inn.is_residential());
    }

    #[test]
    fn test_building_footprint() {
        let b = Building::new(0, (64, 32), SizeClass::Medium, BuildingType::Inn);
        assert_eq!(b.center(32), Vec2::new(96.0, 64.0));
        assert!(b.contains(&Vec2::new(64.0, 32.0), 32));
        assert!(!b.contains(&Vec2::new(128.0, 40.0), 32));
    }

    #[test]
    fn test_building_id_sentinel() {
        assert!(BuildingId::NONE.is_none());
        assert_eq!(BuildingId::NONE.index(), None);
        assert_eq!(BuildingId(3).index(), Some(3));
    }

    #[test]
    fn test_type_serde_label() {
        let json = serde_json::to_string(&BuildingType::TownHall).unwrap();
        assert_eq!(json, "\"Town Hall\"");
        let back: BuildingType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BuildingType::TownHall);
    }
}
