//! Bed slots - non-overlapping sleep positions inside a home.
//!
//! Candidate slots depend on the building size class and how many people
//! share it. Up to [`MAX_BED_ATTEMPTS`] candidates are tried in order; the
//! first whose `"x,y"` key is free in the occupancy map is claimed. When
//! every candidate collides the last one is used unclaimed, so two beds may
//! overlap in a crowded home.
//!
//! A small jitter is applied after the key is claimed. The occupancy map
//! therefore records the slot, while [`BedPlacement::position`] is where the
//! villager actually lies.

use crate::building::{Building, SizeClass};
use crate::geometry::PixelPos;
use rand::Rng;
use std::collections::HashMap;

pub const MAX_BED_ATTEMPTS: u32 = 10;
pub const BED_JITTER_PX: i32 = 3;

/// Claimed slot keys mapped to the villager sleeping there.
pub type OccupiedBeds = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BedPlacement {
    /// Slot before jitter, as recorded in the occupancy map
    pub slot: PixelPos,
    /// Final position after jitter
    pub position: PixelPos,
    /// False when every attempt collided and the slot is shared
    pub claimed: bool,
}

pub fn position_key(pos: PixelPos) -> String {
    format!("{},{}", pos.0, pos.1)
}

/// Candidate slot for a given attempt.
pub fn bed_candidate(
    building: &Building,
    occupant_count: usize,
    attempt: u32,
    tile_size: i32,
) -> PixelPos {
    let (bx, by) = building.position;
    let size_px = building.size_class.footprint_px(tile_size);
    let padding = tile_size / 3;
    let attempt = attempt as i32;
    let center = (bx + size_px / 2, by + size_px / 2);

    match building.size_class {
        SizeClass::Large => {
            let row = attempt % 2;
            let col = (attempt / 2) % 2;
            let cell = (size_px - padding * 2) / 2;
            (
                bx + padding + col * cell + cell / 2,
                by + padding + row * cell + cell / 2,
            )
        }
        SizeClass::Medium if occupant_count > 1 => {
            let col = attempt % 2;
            (
                bx + padding + col * (size_px - padding * 2 - tile_size),
                by + size_px / 2,
            )
        }
        SizeClass::Small if occupant_count > 1 => {
            let step = tile_size / 3;
            let offset_x = (attempt % 3 - 1) * step;
            let offset_y = (attempt / 3 - 1) * step;
            (center.0 + offset_x, center.1 + offset_y)
        }
        SizeClass::Medium | SizeClass::Small => center,
    }
}

/// Resolve a bed for `name` in `building`, claiming a slot in `occupied`.
pub fn resolve_bed(
    name: &str,
    building: &Building,
    occupant_count: usize,
    occupied: &mut OccupiedBeds,
    tile_size: i32,
    rng: &mut impl Rng,
) -> BedPlacement {
    let mut slot = bed_candidate(building, occupant_count, 0, tile_size);
    let mut claimed = false;

    for attempt in 0..MAX_BED_ATTEMPTS {
        slot = bed_candidate(building, occupant_count, attempt, tile_size);
        let key = position_key(slot);
        if !occupied.contains_key(&key) {
            occupied.insert(key, name.to_string());
            claimed = true;
            break;
        }
    }

    if !claimed {
        log::warn!(
            "No free bed slot for {} in building {}; sharing {:?}",
            name,
            building.id,
            slot
        );
    }

    let position = (
        slot.0 + rng.gen_range(-BED_JITTER_PX..=BED_JITTER_PX),
        slot.1 + rng.gen_range(-BED_JITTER_PX..=BED_JITTER_PX),
    );
    BedPlacement {
        slot,
        position,
        claimed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::BuildingType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    const TILE: i32 = 32;

    fn building(size: SizeClass) -> Building {
        Building::new(0, (320, 160), size, BuildingType::House)
    }

    #[test]
    fn test_single_occupant_centered() {
        let b = building(SizeClass::Medium);
        assert_eq!(bed_candidate(&b, 1, 0, TILE), (352, 192));
        let b = building(SizeClass::Small);
        assert_eq!(bed_candidate(&b, 1, 5, TILE), (336, 176));
    }

    #[test]
    fn test_large_quadrants() {
        let b = building(SizeClass::Large);
        // padding 10, cell (96 - 20) / 2 = 38
        assert_eq!(bed_candidate(&b, 4, 0, TILE), (349, 189));
        assert_eq!(bed_candidate(&b, 4, 1, TILE), (349, 227));
        assert_eq!(bed_candidate(&b, 4, 2, TILE), (387, 189));
        assert_eq!(bed_candidate(&b, 4, 3, TILE), (387, 227));
    }

    #[test]
    fn test_medium_side_by_side() {
        let b = building(SizeClass::Medium);
        assert_eq!(bed_candidate(&b, 2, 0, TILE), (330, 192));
        assert_eq!(bed_candidate(&b, 2, 1, TILE), (342, 192));
    }

    #[test]
    fn test_shared_small_home_claims_distinct_slots() {
        let b = building(SizeClass::Small);
        let mut occupied = OccupiedBeds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let slots: Vec<BedPlacement> = (0..10)
            .map(|i| resolve_bed(&format!("V{i}"), &b, 10, &mut occupied, TILE, &mut rng))
            .collect();
        assert!(slots.iter().all(|p| p.claimed));
        let unique: HashSet<PixelPos> = slots.iter().map(|p| p.slot).collect();
        assert_eq!(unique.len(), 10);
        assert_eq!(occupied.len(), 10);
    }

    #[test]
    fn test_exhausted_slots_fall_back_unclaimed() {
        let b = building(SizeClass::Large);
        let mut occupied = OccupiedBeds::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for i in 0..4 {
            assert!(resolve_bed(&format!("V{i}"), &b, 5, &mut occupied, TILE, &mut rng).claimed);
        }
        let fifth = resolve_bed("V4", &b, 5, &mut occupied, TILE, &mut rng);
        assert!(!fifth.claimed);
        // attempt 9: row 1, col 0
        assert_eq!(fifth.slot, (349, 227));
        assert_eq!(occupied.len(), 4);
        assert_eq!(occupied.get(&position_key((349, 227))).map(String::as_str), Some("V1"));
    }

    #[test]
    fn test_jitter_is_bounded_and_key_is_pre_jitter() {
        let b = building(SizeClass::Medium);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..20 {
            let mut occupied = OccupiedBeds::new();
            let placed = resolve_bed("Ada", &b, 1, &mut occupied, TILE, &mut rng);
            assert!((placed.position.0 - placed.slot.0).abs() <= BED_JITTER_PX);
            assert!((placed.position.1 - placed.slot.1).abs() <= BED_JITTER_PX);
            assert!(occupied.contains_key(&position_key(placed.slot)));
        }
    }
}
