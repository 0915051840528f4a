//! Villager generation

use super::names::generate_unique_name;
use crate::components::*;
use crate::village::Village;
use hamlet_logic::config::VillagerConfig;
use hamlet_logic::geometry::{Rect, Vec2};
use hamlet_logic::jobs::Job;
use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Generate `config.count` villagers with ids starting at `first_id`.
///
/// Names are unique against villagers already in `world`.
pub fn generate_villagers(
    world: &mut World,
    village: &Village,
    config: &VillagerConfig,
    first_id: u32,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut taken: HashSet<String> = world
        .query::<&Identity>()
        .iter()
        .map(|(_, identity)| identity.name.clone())
        .collect();

    let mut entities = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let name = generate_unique_name(&taken, rng);
        taken.insert(name.clone());
        let job = Job::ALL.choose(rng).copied().unwrap_or(Job::Farmer);
        let position = spawn_point(village, rng);
        let speed = if config.speed_range.max > config.speed_range.min {
            rng.gen_range(config.speed_range.min..=config.speed_range.max)
        } else {
            config.speed_range.min
        };

        let id = VillagerId(first_id + i as u32);
        entities.push(spawn_villager(world, id, name, job, position, speed, village.tile_size, rng));
    }
    entities
}

/// Spawn one villager, asleep, with randomized cosmetic stats and a sleep
/// window derived from its job.
#[allow(clippy::too_many_arguments)]
pub fn spawn_villager(
    world: &mut World,
    id: VillagerId,
    name: String,
    job: Job,
    position: Vec2,
    speed: f32,
    tile_size: i32,
    rng: &mut impl Rng,
) -> Entity {
    let ((wake_lo, wake_hi), (sleep_lo, sleep_hi)) = job.sleep_window();
    let wake_hour = rng.gen_range(wake_lo..=wake_hi);
    let sleep_hour = rng.gen_range(sleep_lo..=sleep_hi);

    let identity = Identity {
        name,
        job,
        mood: Mood::ALL.choose(rng).copied().unwrap_or(Mood::Neutral),
        health: rng.gen_range(70..=100),
        energy: rng.gen_range(50..=100),
        money: rng.gen_range(10..=100),
        personality: Temperament::ALL
            .choose(rng)
            .copied()
            .unwrap_or(Temperament::Social),
    };
    let size = tile_size as f32;

    world.spawn((
        id,
        identity,
        Position(position),
        Movement::new(speed),
        SleepCycle::new(wake_hour, sleep_hour),
        Activity::new("Sleeping"),
        Home::default(),
        Workplace::default(),
        Schedule::default(),
        Talk::default(),
        Location::default(),
        Bounds {
            rect: Some(Rect::centered_on(position, size, size)),
        },
    ))
}

/// A random path tile nudged by up to half a tile, or a random point inside
/// the edge margin when the village has no paths.
fn spawn_point(village: &Village, rng: &mut impl Rng) -> Vec2 {
    let half = village.tile_size as f32 / 2.0;
    if let Some(&tile) = village.paths.choose(rng) {
        let center = village.tile_center(tile);
        let nudged = Vec2::new(
            center.x + rng.gen_range(-half..=half),
            center.y + rng.gen_range(-half..=half),
        );
        return village.clamp(nudged);
    }

    let margin = village.edge_margin();
    Vec2::new(
        inset(village.width, margin, rng),
        inset(village.height, margin, rng),
    )
}

fn inset(extent: i32, margin: f32, rng: &mut impl Rng) -> f32 {
    let hi = extent as f32 - margin;
    if hi > margin {
        rng.gen_range(margin..hi)
    } else {
        extent as f32 / 2.0
    }
}
