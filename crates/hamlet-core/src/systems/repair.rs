//! Bulk repair operations - put everyone to bed, resync sleep with the clock,
//! and force villagers awake or asleep by name.

use crate::components::{Activity, Bounds, Home, Identity, Movement, Position, SleepCycle};
use crate::events::{EventSink, SimEvent};
use crate::village::Village;
use hamlet_logic::beds::{resolve_bed, OccupiedBeds};
use hamlet_logic::geometry::{Rect, Vec2};
use hecs::{Entity, World};
use log::{info, warn};
use rand::Rng;

use super::agent::{override_sleep_state, reconcile_sleep, villager_entities};

/// Result of [`force_all_to_homes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomeReport {
    pub with_home: usize,
    pub without_home: usize,
}

/// Place every villager with a valid home asleep in a freshly resolved bed.
///
/// Beds are resolved against an empty occupancy map, in villager id order,
/// so running this twice gives the same slots.
pub fn force_all_to_homes(
    world: &mut World,
    village: &Village,
    rng: &mut impl Rng,
    sink: &mut dyn EventSink,
) -> HomeReport {
    let mut occupied = OccupiedBeds::new();
    let mut report = HomeReport::default();
    let tile = village.tile_size as f32;

    for entity in villager_entities(world) {
        let Ok((identity, position, movement, sleep, activity, home, bounds)) = world
            .query_one_mut::<(
                &Identity,
                &mut Position,
                &mut Movement,
                &mut SleepCycle,
                &mut Activity,
                &mut Home,
                &mut Bounds,
            )>(entity)
        else {
            continue;
        };

        let Some(building) = village.building(home.0.building_id) else {
            if home.0.is_assigned() {
                warn!(
                    "{} has home {} which is not in the village",
                    identity.name, home.0.building_id
                );
            }
            report.without_home += 1;
            continue;
        };

        let occupants = home.0.roommates.len().max(1);
        let bed = resolve_bed(&identity.name, building, occupants, &mut occupied, village.tile_size, rng);
        home.0.bed_position = Some(bed.position);
        let target = Vec2::from_pixel(bed.position);

        let rect = bounds.rect.get_or_insert_with(|| {
            warn!("{} had no bounding box, using a default one", identity.name);
            Rect::centered_on(target, tile, tile)
        });
        rect.set_center(target);

        let from = position.0;
        position.0 = target;
        movement.destination = None;
        sleep.sleep_override = None;

        if !sleep.is_sleeping {
            sleep.is_sleeping = true;
            sink.emit(SimEvent::SleepChanged {
                name: identity.name.clone(),
                is_sleeping: true,
            });
        }
        if activity.label != "Sleeping" {
            let previous = std::mem::replace(&mut activity.label, "Sleeping".to_string());
            sink.emit(SimEvent::ActivityChanged {
                name: identity.name.clone(),
                from: previous,
                to: activity.label.clone(),
            });
        }
        if from.distance_squared(&target) > 1.0 {
            sink.emit(SimEvent::VillagerMoved {
                name: identity.name.clone(),
                from,
                to: target,
            });
        }
        report.with_home += 1;
    }

    info!(
        "Sent {} villagers home to sleep ({} without a home)",
        report.with_home, report.without_home
    );
    report
}

/// Reconcile every villager's sleep state with `hour`, dropping any active
/// override. Returns how many villagers were corrected.
pub fn fix_sleep_states(
    world: &mut World,
    hour: f32,
    rng: &mut impl Rng,
    sink: &mut dyn EventSink,
) -> usize {
    let mut fixed = 0;
    for entity in villager_entities(world) {
        let Ok((identity, movement, sleep, activity)) = world
            .query_one_mut::<(&Identity, &mut Movement, &mut SleepCycle, &mut Activity)>(entity)
        else {
            continue;
        };

        sleep.sleep_override = None;
        let previous = activity.label.clone();
        if reconcile_sleep(sleep, activity, movement, hour, rng) {
            fixed += 1;
            sink.emit(SimEvent::SleepChanged {
                name: identity.name.clone(),
                is_sleeping: sleep.is_sleeping,
            });
            sink.emit(SimEvent::ActivityChanged {
                name: identity.name.clone(),
                from: previous,
                to: activity.label.clone(),
            });
        }
    }
    if fixed > 0 {
        info!("Fixed sleep state for {} villagers", fixed);
    }
    fixed
}

/// Who a wake/sleep command applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    /// First villager whose name contains this, case-insensitively
    Named(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideOutcome {
    /// Names the target resolved to
    pub matched: Vec<String>,
    /// How many of them actually changed state
    pub changed: usize,
}

/// Force matching villagers awake (`force_awake`) or asleep for
/// `duration_secs`. Villagers already in the requested state are left alone.
pub fn override_sleep(
    world: &mut World,
    target: &Target,
    force_awake: bool,
    duration_secs: f32,
    village: &Village,
    sink: &mut dyn EventSink,
) -> OverrideOutcome {
    let mut candidates: Vec<(Entity, String, bool)> = villager_entities(world)
        .into_iter()
        .filter_map(|entity| {
            let identity = world.get::<&Identity>(entity).ok()?;
            let sleep = world.get::<&SleepCycle>(entity).ok()?;
            Some((entity, identity.name.clone(), sleep.is_sleeping))
        })
        .collect();

    if let Target::Named(needle) = target {
        let needle = needle.to_lowercase();
        candidates.retain(|(_, name, _)| name.to_lowercase().contains(&needle));
        candidates.truncate(1);
    }

    let mut outcome = OverrideOutcome::default();
    for (entity, name, is_sleeping) in candidates {
        outcome.matched.push(name.clone());
        if is_sleeping != force_awake {
            continue;
        }
        match override_sleep_state(world, entity, force_awake, duration_secs, village, sink) {
            Ok(true) => outcome.changed += 1,
            Ok(false) => {}
            Err(e) => warn!("Could not override sleep for {}: {}", name, e),
        }
    }
    outcome
}
