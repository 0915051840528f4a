//! Destination selection - where an idle villager walks next
//!
//! Selection sits behind [`DestinationStrategy`] so the engine can swap the
//! policy at construction. [`HomeWorkBiased`] is the default: it pulls
//! villagers back toward their home or workplace some of the time and
//! otherwise roams the village.

use crate::village::Village;
use hamlet_logic::geometry::Vec2;
use hamlet_logic::housing::{HomeAssignment, WorkplaceAssignment};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Read-only view of the villager a destination is picked for
#[derive(Debug, Clone, Copy)]
pub struct AgentView<'a> {
    pub name: &'a str,
    pub position: Vec2,
    pub home: &'a HomeAssignment,
    pub workplace: Option<&'a WorkplaceAssignment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DestinationChoice {
    pub target: Vec2,
    /// Activity label shown while walking there
    pub activity: String,
}

pub trait DestinationStrategy {
    fn select_destination(
        &self,
        agent: &AgentView<'_>,
        village: &Village,
        rng: &mut dyn RngCore,
    ) -> DestinationChoice;
}

/// Home/workplace-aware roaming.
///
/// With probability `anchor_chance` the villager heads home or to work
/// (even odds when it has both). Otherwise it visits a random building,
/// strolls to a path tile or wanders to a random point, preferred in that
/// order with weights 0.5/0.3/0.2.
#[derive(Debug, Clone)]
pub struct HomeWorkBiased {
    pub anchor_chance: f32,
}

impl Default for HomeWorkBiased {
    fn default() -> Self {
        Self { anchor_chance: 0.4 }
    }
}

impl DestinationStrategy for HomeWorkBiased {
    fn select_destination(
        &self,
        agent: &AgentView<'_>,
        village: &Village,
        rng: &mut dyn RngCore,
    ) -> DestinationChoice {
        if rng.gen::<f32>() < self.anchor_chance {
            if let Some(choice) = anchor_destination(agent, village, rng) {
                return choice;
            }
        }
        roam_destination(village, rng)
    }
}

fn anchor_destination(
    agent: &AgentView<'_>,
    village: &Village,
    rng: &mut dyn RngCore,
) -> Option<DestinationChoice> {
    let home = agent.home.is_assigned().then_some(agent.home);
    let go_home = match (home, agent.workplace) {
        (None, None) => return None,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (Some(_), Some(_)) => rng.gen_bool(0.5),
    };

    let tile = village.tile_size as f32;
    if go_home {
        let base = village
            .building(agent.home.building_id)
            .map(|b| b.center(village.tile_size))
            .unwrap_or_else(|| offset_by(Vec2::from_pixel(agent.home.position), tile / 2.0));
        Some(DestinationChoice {
            target: jitter(base, tile / 2.0, rng),
            activity: "At home".to_string(),
        })
    } else {
        let work = agent.workplace?;
        let base = village
            .building(work.building_id)
            .map(|b| b.center(village.tile_size))
            .unwrap_or_else(|| Vec2::from_pixel(work.position));
        Some(DestinationChoice {
            target: jitter(base, tile / 2.0, rng),
            activity: format!("Working at {}", work.label),
        })
    }
}

fn roam_destination(village: &Village, rng: &mut dyn RngCore) -> DestinationChoice {
    let roll = rng.gen::<f32>();
    let tile = village.tile_size as f32;

    if roll < 0.5 {
        if let Some(building) = village.buildings.choose(rng) {
            let center = building.center(village.tile_size);
            return DestinationChoice {
                target: jitter(center, tile / 2.0, rng),
                activity: format!("Visiting {}", building.display_name()),
            };
        }
    }
    if roll < 0.8 {
        if let Some(&tile_pos) = village.paths.choose(rng) {
            return DestinationChoice {
                target: village.tile_center(tile_pos),
                activity: "Taking a stroll".to_string(),
            };
        }
    }

    let target = Vec2::new(
        span(rng, tile, village.width as f32 - tile),
        span(rng, tile, village.height as f32 - tile),
    );
    DestinationChoice {
        target,
        activity: "Wandering".to_string(),
    }
}

fn offset_by(point: Vec2, amount: f32) -> Vec2 {
    Vec2::new(point.x + amount, point.y + amount)
}

fn jitter(point: Vec2, radius: f32, rng: &mut dyn RngCore) -> Vec2 {
    Vec2::new(
        span(rng, point.x - radius, point.x + radius),
        span(rng, point.y - radius, point.y + radius),
    )
}

/// Uniform in `[lo, hi)`, or `lo` when the span is empty.
fn span(rng: &mut dyn RngCore, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamlet_logic::building::{Building, BuildingId, BuildingType, SizeClass};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn village_with_home() -> Village {
        let mut village = Village::empty(640, 640, 32);
        village
            .buildings
            .push(Building::new(0, (64, 64), SizeClass::Small, BuildingType::House));
        village
            .buildings
            .push(Building::new(1, (320, 320), SizeClass::Medium, BuildingType::Bakery));
        village.paths.push((0, 192));
        village
    }

    fn home_in(id: i32) -> HomeAssignment {
        HomeAssignment {
            building_id: BuildingId(id),
            position: (64, 64),
            ..HomeAssignment::unassigned()
        }
    }

    #[test]
    fn test_always_anchored_without_workplace_goes_home() {
        let village = village_with_home();
        let home = home_in(0);
        let agent = AgentView {
            name: "Otto Reed",
            position: Vec2::new(300.0, 300.0),
            home: &home,
            workplace: None,
        };
        let strategy = HomeWorkBiased { anchor_chance: 1.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..20 {
            let choice = strategy.select_destination(&agent, &village, &mut rng);
            assert_eq!(choice.activity, "At home");
            // center of the 32px house is (80, 80); jitter is half a tile
            assert!((choice.target.x - 80.0).abs() <= 16.0);
            assert!((choice.target.y - 80.0).abs() <= 16.0);
        }
    }

    #[test]
    fn test_anchored_worker_splits_between_home_and_work() {
        let village = village_with_home();
        let home = home_in(0);
        let work = WorkplaceAssignment {
            building_id: BuildingId(1),
            label: "Bakery".into(),
            position: (320, 320),
            is_external: false,
        };
        let agent = AgentView {
            name: "Greta Baker",
            position: Vec2::ZERO,
            home: &home,
            workplace: Some(&work),
        };
        let strategy = HomeWorkBiased { anchor_chance: 1.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let mut at_home = 0;
        let mut at_work = 0;
        for _ in 0..200 {
            match strategy.select_destination(&agent, &village, &mut rng).activity.as_str() {
                "At home" => at_home += 1,
                "Working at Bakery" => at_work += 1,
                other => panic!("unexpected activity {other}"),
            }
        }
        assert!(at_home > 50 && at_work > 50, "home {at_home} work {at_work}");
    }

    #[test]
    fn test_unanchored_villager_stays_in_bounds() {
        let village = village_with_home();
        let home = HomeAssignment::unassigned();
        let agent = AgentView {
            name: "Kai Dale",
            position: Vec2::ZERO,
            home: &home,
            workplace: None,
        };
        let strategy = HomeWorkBiased::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for _ in 0..100 {
            let choice = strategy.select_destination(&agent, &village, &mut rng);
            assert!(choice.target.x >= 0.0 && choice.target.x <= 640.0);
            assert!(choice.target.y >= 0.0 && choice.target.y <= 640.0);
            assert_ne!(choice.activity, "At home");
        }
    }

    #[test]
    fn test_empty_village_wanders() {
        let village = Village::empty(320, 320, 32);
        let home = HomeAssignment::unassigned();
        let agent = AgentView {
            name: "Vera Gray",
            position: Vec2::ZERO,
            home: &home,
            workplace: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let choice = HomeWorkBiased::default().select_destination(&agent, &village, &mut rng);
        assert_eq!(choice.activity, "Wandering");
    }
}
