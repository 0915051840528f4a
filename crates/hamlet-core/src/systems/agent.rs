//! Villager agent system - sleep reconciliation, movement and building proximity
//!
//! Each tick every villager, in id order:
//! 1. counts down any sleep override,
//! 2. reconciles its sleep state with the clock unless overridden,
//! 3. stays pinned to its bed while asleep, otherwise walks toward its
//!    destination or picks a new one once its idle timer runs out, keeping
//!    clear of the map edge,
//! 4. relabels its activity from its schedule every few seconds while it
//!    stands still,
//! 5. reports what changed to the event sink.
//!
//! A failure for one villager is logged and the tick continues for the rest.

use crate::components::{
    Activity, Bounds, Home, Identity, Location, Movement, Position, Schedule, SleepCycle,
    SleepOverride, Talk, VillagerId, Workplace,
};
use crate::events::{EventSink, SimEvent};
use crate::village::Village;
use hamlet_logic::building::BuildingId;
use hamlet_logic::clock::DayPeriod;
use hamlet_logic::geometry::Vec2;
use hamlet_logic::housing::{HomeAssignment, WorkplaceAssignment};
use hamlet_logic::schedule::Whereabouts;
use hecs::{Entity, World};
use log::warn;
use rand::Rng;
use thiserror::Error;

use super::destination::{AgentView, DestinationStrategy};

/// Closer than this counts as arrived
pub const ARRIVAL_DISTANCE: f32 = 2.0;

/// Seconds between activity relabels
pub const ACTIVITY_RECHECK_SECS: std::ops::Range<f32> = 5.0..10.0;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("villager is missing a component: {0}")]
    Query(#[from] hecs::QueryOneError),
    #[error("{name} has a non-finite position")]
    NonFinitePosition { name: String },
}

/// Per-tick inputs shared by every villager
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub hour: f32,
    /// Real seconds since the last tick
    pub dt: f32,
    pub village: &'a Village,
}

/// All villager entities ordered by id.
pub fn villager_entities(world: &World) -> Vec<Entity> {
    let mut found: Vec<(VillagerId, Entity)> = world
        .query::<&VillagerId>()
        .iter()
        .map(|(entity, id)| (*id, entity))
        .collect();
    found.sort_by_key(|(id, _)| *id);
    found.into_iter().map(|(_, entity)| entity).collect()
}

/// Look up a villager by exact name.
pub fn find_villager(world: &World, name: &str) -> Option<Entity> {
    world
        .query::<&Identity>()
        .iter()
        .find(|(_, identity)| identity.name == name)
        .map(|(entity, _)| entity)
}

pub fn villager_system(
    world: &mut World,
    ctx: &TickContext<'_>,
    strategy: &dyn DestinationStrategy,
    rng: &mut impl Rng,
    sink: &mut dyn EventSink,
) {
    for entity in villager_entities(world) {
        if let Err(e) = update_villager(world, entity, ctx, strategy, rng, sink) {
            warn!("Skipping villager {:?} this tick: {}", entity, e);
        }
    }
}

fn update_villager(
    world: &mut World,
    entity: Entity,
    ctx: &TickContext<'_>,
    strategy: &dyn DestinationStrategy,
    rng: &mut impl Rng,
    sink: &mut dyn EventSink,
) -> Result<(), AgentError> {
    let (
        identity,
        position,
        movement,
        sleep,
        activity,
        home,
        workplace,
        schedule,
        talk,
        location,
        bounds,
    ) = world.query_one_mut::<(
        &Identity,
        &mut Position,
        &mut Movement,
        &mut SleepCycle,
        &mut Activity,
        &Home,
        &Workplace,
        &Schedule,
        &Talk,
        &mut Location,
        &mut Bounds,
    )>(entity)?;

    if !position.0.is_finite() {
        return Err(AgentError::NonFinitePosition {
            name: identity.name.clone(),
        });
    }

    let village = ctx.village;
    let start = position.0;
    let was_sleeping = sleep.is_sleeping;
    let previous_activity = activity.label.clone();

    tick_override(sleep, ctx.dt);
    if !sleep.is_overridden() {
        reconcile_sleep(sleep, activity, movement, ctx.hour, rng);
    }

    if sleep.is_sleeping {
        movement.destination = None;
        if let Some(bed) = sleep_anchor(&home.0, village) {
            position.0 = bed;
        }
    } else {
        if !talk.is_talking {
            let view = AgentView {
                name: &identity.name,
                position: position.0,
                home: &home.0,
                workplace: workplace.0.as_ref(),
            };
            step_movement(&view, position, movement, activity, village, strategy, ctx.dt, rng);
        }
        // sleepers stay on their bed even inside the margin
        position.0 = village.clamp(position.0);
    }

    if let Some(rect) = bounds.rect.as_mut() {
        rect.set_center(position.0);
    }
    let inside = village.building_at(&position.0);

    if !sleep.is_sleeping && !sleep.is_overridden() && !movement.is_moving() {
        activity.recheck_in -= ctx.dt;
        if activity.recheck_in <= 0.0 {
            let place = whereabouts(
                inside,
                position.0,
                &home.0,
                workplace.0.as_ref(),
                village.tile_size,
            );
            activity.label =
                schedule
                    .0
                    .activity_for(identity.job, DayPeriod::from_hour(ctx.hour), place, rng);
            activity.recheck_in = rng.gen_range(ACTIVITY_RECHECK_SECS);
        }
    }

    let name = &identity.name;
    if sleep.is_sleeping != was_sleeping {
        sink.emit(SimEvent::SleepChanged {
            name: name.clone(),
            is_sleeping: sleep.is_sleeping,
        });
    }
    if activity.label != previous_activity {
        sink.emit(SimEvent::ActivityChanged {
            name: name.clone(),
            from: previous_activity,
            to: activity.label.clone(),
        });
    }
    if start.distance_squared(&position.0) > 1.0 {
        sink.emit(SimEvent::VillagerMoved {
            name: name.clone(),
            from: start,
            to: position.0,
        });
    }

    if inside != location.inside {
        if let Some(building_id) = location.inside {
            sink.emit(SimEvent::BuildingExited {
                name: name.clone(),
                building_id,
            });
        }
        if let Some(building_id) = inside {
            sink.emit(SimEvent::BuildingEntered {
                name: name.clone(),
                building_id,
            });
        }
        location.inside = inside;
    }

    Ok(())
}

fn tick_override(sleep: &mut SleepCycle, dt: f32) {
    if let Some(active) = sleep.sleep_override.as_mut() {
        active.remaining_secs -= dt;
        if active.remaining_secs <= 0.0 {
            sleep.sleep_override = None;
        }
    }
}

/// Bring `is_sleeping` in line with the clock. Returns true if it flipped.
pub fn reconcile_sleep(
    sleep: &mut SleepCycle,
    activity: &mut Activity,
    movement: &mut Movement,
    hour: f32,
    rng: &mut impl Rng,
) -> bool {
    let should_sleep = sleep.should_sleep_at(hour);
    if should_sleep == sleep.is_sleeping {
        return false;
    }

    sleep.is_sleeping = should_sleep;
    if should_sleep {
        activity.label = "Sleeping".to_string();
        movement.destination = None;
    } else {
        activity.label = "Waking up".to_string();
        activity.recheck_in = rng.gen_range(ACTIVITY_RECHECK_SECS);
        movement.idle_timer = rng.gen_range(1.0..3.0);
    }
    true
}

/// Work means inside the workplace building, or within two tiles of an
/// external workplace. Home means inside the home building.
fn whereabouts(
    inside: Option<BuildingId>,
    position: Vec2,
    home: &HomeAssignment,
    workplace: Option<&WorkplaceAssignment>,
    tile_size: i32,
) -> Whereabouts {
    if let Some(work) = workplace {
        let at_work = if work.is_external {
            let reach = 2.0 * tile_size as f32;
            position.distance_squared(&Vec2::from_pixel(work.position)) <= reach * reach
        } else {
            inside == Some(work.building_id)
        };
        if at_work {
            return Whereabouts::Work;
        }
    }
    if home.is_assigned() && inside == Some(home.building_id) {
        Whereabouts::Home
    } else {
        Whereabouts::Elsewhere
    }
}

/// Where a sleeping villager lies: its bed, else its home's centre.
pub fn sleep_anchor(home: &HomeAssignment, village: &Village) -> Option<Vec2> {
    if let Some(bed) = home.bed_position {
        return Some(Vec2::from_pixel(bed));
    }
    if !home.is_assigned() {
        return None;
    }
    let center = village
        .building(home.building_id)
        .map(|b| b.center(village.tile_size))
        .unwrap_or_else(|| {
            let half = village.tile_size as f32 / 2.0;
            Vec2::new(home.position.0 as f32 + half, home.position.1 as f32 + half)
        });
    Some(center)
}

#[allow(clippy::too_many_arguments)]
fn step_movement(
    view: &AgentView<'_>,
    position: &mut Position,
    movement: &mut Movement,
    activity: &mut Activity,
    village: &Village,
    strategy: &dyn DestinationStrategy,
    dt: f32,
    rng: &mut impl Rng,
) {
    match movement.destination {
        Some(target) => {
            let to_target = target - position.0;
            let distance = to_target.length();
            let step = movement.speed * dt;
            if distance < ARRIVAL_DISTANCE || distance <= step {
                position.0 = target;
                movement.destination = None;
                movement.idle_timer = rng.gen_range(2.0..5.0);
            } else {
                position.0 = position.0 + to_target.normalize() * step;
            }
        }
        None => {
            movement.idle_timer -= dt;
            if movement.idle_timer <= 0.0 {
                let choice = strategy.select_destination(view, village, rng);
                movement.destination = Some(village.clamp(choice.target));
                movement.idle_timer = 0.0;
                activity.label = choice.activity;
            }
        }
    }
}

/// Force a villager awake or asleep for `duration_secs`, suppressing clock
/// reconciliation until the countdown ends.
///
/// The override is recorded even when the villager is already in the
/// requested state. Returns whether the sleep state flipped.
pub fn override_sleep_state(
    world: &mut World,
    entity: Entity,
    force_awake: bool,
    duration_secs: f32,
    village: &Village,
    sink: &mut dyn EventSink,
) -> Result<bool, AgentError> {
    let (identity, position, movement, sleep, activity, home, bounds) = world
        .query_one_mut::<(
            &Identity,
            &mut Position,
            &mut Movement,
            &mut SleepCycle,
            &mut Activity,
            &Home,
            &mut Bounds,
        )>(entity)?;

    sleep.sleep_override = Some(SleepOverride {
        force_awake,
        remaining_secs: duration_secs,
    });

    let sleeping = !force_awake;
    if sleep.is_sleeping == sleeping {
        return Ok(false);
    }
    sleep.is_sleeping = sleeping;

    let previous = std::mem::take(&mut activity.label);
    if force_awake {
        activity.label = "Waking up (forced)".to_string();
        movement.idle_timer = 0.0;
    } else {
        activity.label = "Sleeping (forced)".to_string();
        movement.destination = None;
        if let Some(bed) = sleep_anchor(&home.0, village) {
            position.0 = bed;
            if let Some(rect) = bounds.rect.as_mut() {
                rect.set_center(bed);
            }
        }
    }

    sink.emit(SimEvent::SleepChanged {
        name: identity.name.clone(),
        is_sleeping: sleeping,
    });
    sink.emit(SimEvent::ActivityChanged {
        name: identity.name.clone(),
        from: previous,
        to: activity.label.clone(),
    });
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Mood, Temperament};
    use crate::events::NullSink;
    use crate::systems::HomeWorkBiased;
    use hamlet_logic::building::{Building, BuildingId, BuildingType, SizeClass};
    use hamlet_logic::jobs::Job;
    use hamlet_logic::schedule::DailySchedule;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn village() -> Village {
        let mut village = Village::empty(640, 640, 32);
        village
            .buildings
            .push(Building::new(0, (320, 320), SizeClass::Small, BuildingType::House));
        village
            .buildings
            .push(Building::new(1, (160, 320), SizeClass::Small, BuildingType::Workshop));
        village
    }

    fn spawn(world: &mut World, id: u32, at: Vec2, sleeping: bool) -> Entity {
        let mut sleep = SleepCycle::new(6.0, 22.0);
        sleep.is_sleeping = sleeping;
        world.spawn((
            VillagerId(id),
            Identity {
                name: format!("Villager{id} Field"),
                job: Job::Farmer,
                mood: Mood::Content,
                health: 90,
                energy: 90,
                money: 20,
                personality: Temperament::Social,
            },
            Position(at),
            Movement::new(40.0),
            sleep,
            Activity::new(if sleeping { "Sleeping" } else { "Idle" }),
            Home(HomeAssignment {
                building_id: BuildingId(0),
                position: (320, 320),
                roommates: vec![format!("Villager{id} Field")],
                bed_position: Some((336, 336)),
                ..HomeAssignment::unassigned()
            }),
            Workplace(None),
            crate::components::Schedule(DailySchedule::default()),
            Talk::default(),
            Location::default(),
            Bounds::default(),
        ))
    }

    fn tick(world: &mut World, village: &Village, hour: f32, dt: f32, events: &mut Vec<SimEvent>) {
        let ctx = TickContext { hour, dt, village };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        villager_system(world, &ctx, &HomeWorkBiased::default(), &mut rng, events);
    }

    #[test]
    fn test_wakes_at_wake_hour() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(336.0, 336.0), true);
        let mut events = Vec::new();

        tick(&mut world, &village, 6.0, 0.1, &mut events);

        assert!(!world.get::<&SleepCycle>(e).unwrap().is_sleeping);
        assert_eq!(world.get::<&Activity>(e).unwrap().label, "Waking up");
        assert!(events.contains(&SimEvent::SleepChanged {
            name: "Villager1 Field".into(),
            is_sleeping: false,
        }));
    }

    #[test]
    fn test_sleeper_pinned_to_bed() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(100.0, 100.0), false);
        let mut events = Vec::new();

        tick(&mut world, &village, 23.0, 0.1, &mut events);

        assert!(world.get::<&SleepCycle>(e).unwrap().is_sleeping);
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(336.0, 336.0));
        assert!(world.get::<&Movement>(e).unwrap().destination.is_none());
        assert!(events.contains(&SimEvent::BuildingEntered {
            name: "Villager1 Field".into(),
            building_id: BuildingId(0),
        }));
    }

    #[test]
    fn test_walks_toward_destination_and_arrives() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(100.0, 100.0), false);
        world.get::<&mut Movement>(e).unwrap().destination = Some(Vec2::new(140.0, 100.0));

        let mut events = Vec::new();
        tick(&mut world, &village, 12.0, 0.5, &mut events);
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(120.0, 100.0));
        assert!(matches!(events[0], SimEvent::VillagerMoved { .. }));

        tick(&mut world, &village, 12.0, 0.5, &mut events);
        let movement = world.get::<&Movement>(e).unwrap();
        assert!(movement.destination.is_none());
        assert!((2.0..5.0).contains(&movement.idle_timer));
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(140.0, 100.0));
    }

    #[test]
    fn test_idle_villager_picks_destination() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(100.0, 100.0), false);
        let mut events = Vec::new();

        tick(&mut world, &village, 12.0, 0.1, &mut events);

        assert!(world.get::<&Movement>(e).unwrap().destination.is_some());
        assert_ne!(world.get::<&Activity>(e).unwrap().label, "Idle");
    }

    #[test]
    fn test_talking_villager_holds_position() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(100.0, 100.0), false);
        world.get::<&mut Movement>(e).unwrap().destination = Some(Vec2::new(200.0, 100.0));
        world.get::<&mut Talk>(e).unwrap().is_talking = true;

        tick(&mut world, &village, 12.0, 1.0, &mut Vec::new());
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_override_survives_reconciliation_then_expires() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(336.0, 336.0), true);
        let mut events = Vec::new();

        // 2 AM, forced awake for 1 second
        let flipped = override_sleep_state(&mut world, e, true, 1.0, &village, &mut events).unwrap();
        assert!(flipped);
        assert_eq!(world.get::<&Activity>(e).unwrap().label, "Waking up (forced)");

        tick(&mut world, &village, 2.0, 0.5, &mut events);
        assert!(!world.get::<&SleepCycle>(e).unwrap().is_sleeping);

        tick(&mut world, &village, 2.0, 0.6, &mut events);
        let sleep = world.get::<&SleepCycle>(e).unwrap();
        assert!(sleep.is_sleeping);
        assert!(!sleep.is_overridden());
    }

    #[test]
    fn test_forced_sleep_pins_to_bed() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(50.0, 50.0), false);

        let flipped = override_sleep_state(&mut world, e, false, 30.0, &village, &mut NullSink).unwrap();
        assert!(flipped);
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(336.0, 336.0));
        assert_eq!(world.get::<&Activity>(e).unwrap().label, "Sleeping (forced)");

        // noon, but the override holds
        tick(&mut world, &village, 12.0, 1.0, &mut Vec::new());
        assert!(world.get::<&SleepCycle>(e).unwrap().is_sleeping);
    }

    #[test]
    fn test_override_without_flip_still_recorded() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(50.0, 50.0), false);
        let mut events = Vec::new();

        let flipped = override_sleep_state(&mut world, e, true, 5.0, &village, &mut events).unwrap();
        assert!(!flipped);
        assert!(events.is_empty());
        assert!(world.get::<&SleepCycle>(e).unwrap().is_overridden());
    }

    #[test]
    fn test_broken_villager_does_not_stop_others() {
        let village = village();
        let mut world = World::new();
        let broken = spawn(&mut world, 1, Vec2::new(f32::NAN, 0.0), true);
        let healthy = spawn(&mut world, 2, Vec2::new(336.0, 336.0), true);

        tick(&mut world, &village, 12.0, 0.1, &mut Vec::new());

        assert!(world.get::<&SleepCycle>(broken).unwrap().is_sleeping);
        assert!(!world.get::<&SleepCycle>(healthy).unwrap().is_sleeping);
    }

    #[test]
    fn test_activity_follows_the_clock() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(176.0, 336.0), false);
        world.get::<&mut Workplace>(e).unwrap().0 = Some(WorkplaceAssignment {
            building_id: BuildingId(1),
            label: "Workshop".into(),
            position: (160, 320),
            is_external: false,
        });
        world.get::<&mut Movement>(e).unwrap().idle_timer = 1000.0;
        let mut events = Vec::new();

        tick(&mut world, &village, 9.0, 0.1, &mut events);
        let morning = world.get::<&Activity>(e).unwrap().label.clone();
        assert!(Job::Farmer.activities().contains(&morning.as_str()), "{morning}");

        // still inside the workshop, but the day's work is over
        tick(&mut world, &village, 18.0, 10.0, &mut events);
        assert_eq!(world.get::<&Activity>(e).unwrap().label, "Heading home");
        assert!(events.contains(&SimEvent::ActivityChanged {
            name: "Villager1 Field".into(),
            from: morning,
            to: "Heading home".into(),
        }));

        tick(&mut world, &village, 23.0, 0.1, &mut events);
        assert_eq!(world.get::<&Activity>(e).unwrap().label, "Sleeping");
    }

    #[test]
    fn test_evening_at_home_uses_closing_activity() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(336.0, 336.0), false);
        world.get::<&mut crate::components::Schedule>(e).unwrap().0 =
            DailySchedule::from_activities(vec![
                "Mend clothes at home".into(),
                "Plant crops".into(),
            ]);
        world.get::<&mut Movement>(e).unwrap().idle_timer = 1000.0;

        tick(&mut world, &village, 19.5, 0.1, &mut Vec::new());

        let activity = world.get::<&Activity>(e).unwrap();
        assert_eq!(activity.label, "Mend clothes at home");
        assert!(ACTIVITY_RECHECK_SECS.contains(&activity.recheck_in));
    }

    #[test]
    fn test_walking_villager_keeps_travel_label() {
        let village = village();
        let mut world = World::new();
        let e = spawn(&mut world, 1, Vec2::new(100.0, 100.0), false);
        world.get::<&mut Movement>(e).unwrap().destination = Some(Vec2::new(400.0, 100.0));
        world.get::<&mut Activity>(e).unwrap().label = "Taking a stroll".into();

        tick(&mut world, &village, 12.0, 1.0, &mut Vec::new());

        assert_eq!(world.get::<&Activity>(e).unwrap().label, "Taking a stroll");
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(140.0, 100.0));
    }

    #[test]
    fn test_walkers_keep_off_the_edge() {
        let village = village();
        let mut world = World::new();
        let walker = spawn(&mut world, 1, Vec2::new(10.0, 600.0), false);
        world.get::<&mut Movement>(walker).unwrap().idle_timer = 1000.0;
        let sleeper = spawn(&mut world, 2, Vec2::new(336.0, 336.0), true);
        world.get::<&mut Home>(sleeper).unwrap().0.bed_position = Some((40, 40));

        tick(&mut world, &village, 12.0, 0.1, &mut Vec::new());
        assert_eq!(world.get::<&Position>(walker).unwrap().0, Vec2::new(64.0, 576.0));

        tick(&mut world, &village, 23.0, 0.1, &mut Vec::new());
        assert_eq!(world.get::<&Position>(sleeper).unwrap().0, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_whereabouts() {
        let home = HomeAssignment {
            building_id: BuildingId(0),
            ..HomeAssignment::unassigned()
        };
        let mine = WorkplaceAssignment {
            building_id: BuildingId::NONE,
            label: "Miner Workplace".into(),
            position: (64, 300),
            is_external: true,
        };
        let near = Vec2::new(90.0, 310.0);
        let far = Vec2::new(300.0, 300.0);

        assert_eq!(whereabouts(None, near, &home, Some(&mine), 32), Whereabouts::Work);
        assert_eq!(whereabouts(None, far, &home, Some(&mine), 32), Whereabouts::Elsewhere);
        assert_eq!(
            whereabouts(Some(BuildingId(0)), far, &home, Some(&mine), 32),
            Whereabouts::Home
        );
        assert_eq!(
            whereabouts(Some(BuildingId(0)), far, &HomeAssignment::unassigned(), None, 32),
            Whereabouts::Elsewhere
        );
    }

    #[test]
    fn test_entities_sorted_by_id() {
        let mut world = World::new();
        let late = spawn(&mut world, 9, Vec2::ZERO, false);
        let early = spawn(&mut world, 2, Vec2::ZERO, false);
        assert_eq!(villager_entities(&world), vec![early, late]);
        assert_eq!(find_villager(&world, "Villager9 Field"), Some(late));
    }
}
