//! Scenario tests for the engine: sleep repair, conversations, overrides,
//! housing determinism and save/load.
//!
//! Every engine is seeded so the runs are reproducible.

use hamlet_core::persistence::{self, PersistError};
use hamlet_core::prelude::*;
use hamlet_logic::geometry::Vec2;
use hamlet_logic::jobs::Job;
use hecs::Entity;
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn engine(seed: u64) -> SimulationEngine<Vec<SimEvent>> {
    SimulationEngine::with_sink(SimConfig::default().with_seed(seed), Vec::new())
}

fn set_window(engine: &mut SimulationEngine<Vec<SimEvent>>, entity: Entity, wake: f32, sleep: f32) {
    let mut cycle = engine.world.get::<&mut SleepCycle>(entity).unwrap();
    cycle.wake_hour = wake;
    cycle.sleep_hour = sleep;
}

fn is_sleeping(engine: &SimulationEngine<Vec<SimEvent>>, entity: Entity) -> bool {
    engine.world.get::<&SleepCycle>(entity).unwrap().is_sleeping
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("hamlet-{}-{}", std::process::id(), name))
}

// ── Sleep repair ───────────────────────────────────────────────────────

#[test]
fn fix_wakes_villager_at_wake_hour() {
    let mut engine = engine(1);
    let v = engine.spawn_villager("Clara Reed", Job::Farmer, Vec2::new(100.0, 100.0));
    set_window(&mut engine, v, 6.0, 22.0);
    engine.set_time(6.0).unwrap();
    assert!(is_sleeping(&engine, v));

    let fixed = engine.fix_sleep_states();

    assert_eq!(fixed, 1);
    assert!(!is_sleeping(&engine, v));
    assert_eq!(engine.world.get::<&Activity>(v).unwrap().label, "Waking up");
}

#[test]
fn fix_sleep_states_is_idempotent() {
    let mut engine = engine(2);
    engine.generate();
    engine.set_time(12.0).unwrap();

    let first = engine.fix_sleep_states();
    let second = engine.fix_sleep_states();

    assert_eq!(first, engine.villager_count());
    assert_eq!(second, 0);
}

#[test]
fn force_all_to_homes_puts_everyone_to_bed() {
    let mut engine = engine(3);
    engine.generate();
    engine.set_time(12.0).unwrap();
    for _ in 0..20 {
        engine.update(0.5);
    }
    assert_eq!(engine.sleeping_count(), 0);

    let report = engine.force_all_to_homes();

    assert_eq!(report.with_home + report.without_home, engine.villager_count());
    assert_eq!(engine.sleeping_count(), report.with_home);
}

// ── Activities ─────────────────────────────────────────────────────────

#[test]
fn activity_label_tracks_the_time_of_day() {
    let mut engine = engine(14);
    let v = engine.spawn_villager("Rosa Field", Job::Farmer, Vec2::new(300.0, 300.0));
    set_window(&mut engine, v, 6.0, 22.0);
    engine.set_time(10.0).unwrap();
    engine.update(0.1);
    assert_eq!(engine.world.get::<&Activity>(v).unwrap().label, "Waking up");
    engine.world.get::<&mut Movement>(v).unwrap().idle_timer = 1000.0;

    let mut seen = Vec::new();
    for hour in [10.0, 12.0, 18.0] {
        engine.set_time(hour).unwrap();
        engine.update(10.5);
        seen.push(engine.world.get::<&Activity>(v).unwrap().label.clone());
    }
    assert_eq!(seen, vec!["Running errands", "Having lunch", "Heading home"]);

    engine.set_time(22.5).unwrap();
    engine.update(0.1);
    assert_eq!(engine.world.get::<&Activity>(v).unwrap().label, "Sleeping");

    let changes = engine
        .sink()
        .iter()
        .filter(|e| matches!(e, SimEvent::ActivityChanged { name, .. } if name == "Rosa Field"))
        .count();
    assert_eq!(changes, 5);
}

// ── Conversations ──────────────────────────────────────────────────────

#[test]
fn neighbours_strike_up_exactly_one_conversation() {
    let mut engine = engine(4);
    let a = engine.spawn_villager("Otto Stone", Job::Carpenter, Vec2::new(200.0, 200.0));
    let b = engine.spawn_villager("Petra Hill", Job::Merchant, Vec2::new(230.0, 200.0));
    engine.set_time(12.0).unwrap();
    engine.interactions.set_conversation_chance(1.0);

    engine.update(0.01);

    assert!(engine.world.get::<&Talk>(a).unwrap().is_talking);
    assert!(engine.world.get::<&Talk>(b).unwrap().is_talking);
    assert_eq!(engine.interactions.active().len(), 1);

    for _ in 0..10 {
        engine.update(0.01);
    }
    assert_eq!(engine.interactions.active().len(), 1);
    let started = engine
        .sink()
        .iter()
        .filter(|e| matches!(e, SimEvent::InteractionStarted { .. }))
        .count();
    assert_eq!(started, 1);
}

#[test]
fn conversation_ends_and_cools_down() {
    let mut engine = engine(5);
    engine.spawn_villager("Otto Stone", Job::Carpenter, Vec2::new(200.0, 200.0));
    engine.spawn_villager("Petra Hill", Job::Merchant, Vec2::new(230.0, 200.0));
    engine.set_time(12.0).unwrap();
    engine.interactions.set_conversation_chance(1.0);
    engine.update(0.01);
    assert_eq!(engine.talking_count(), 2);

    // longest conversation is 15s; the shortest cooldown is 10s
    engine.update(15.5);

    assert_eq!(engine.talking_count(), 0);
    assert!(engine.interactions.active().is_empty());
    assert!(engine
        .sink()
        .iter()
        .any(|e| matches!(e, SimEvent::InteractionEnded { .. })));
}

// ── Overrides ──────────────────────────────────────────────────────────

#[test]
fn wake_all_on_awake_roster_changes_nothing() {
    let mut engine = engine(6);
    for (i, name) in ["Ivan Brook", "Julia Dale", "Kai Ford"].iter().enumerate() {
        engine.spawn_villager(*name, Job::Farmer, Vec2::new(100.0 + 100.0 * i as f32, 300.0));
    }
    engine.set_time(12.0).unwrap();
    engine.update(0.01);
    assert_eq!(engine.sleeping_count(), 0);

    let out = engine.run_command("wake all");

    assert!(!out.success);
    assert_eq!(out.lines, vec!["Forced 0 villagers to wake up"]);
    assert_eq!(engine.sleeping_count(), 0);
}

#[test]
fn forced_wake_survives_until_it_expires() {
    let mut engine = engine(7);
    let v = engine.spawn_villager("Nina Gray", Job::Farmer, Vec2::new(100.0, 100.0));
    engine.set_time(2.0).unwrap();
    engine.update(0.01);
    assert!(is_sleeping(&engine, v));

    let outcome = engine.wake(&Target::Named("nina".into()), Some(5.0));
    assert_eq!(outcome.changed, 1);

    for _ in 0..3 {
        engine.update(1.0);
        assert!(!is_sleeping(&engine, v), "override undone by the clock");
    }
    for _ in 0..3 {
        engine.update(1.0);
    }
    assert!(is_sleeping(&engine, v));
}

// ── Housing ────────────────────────────────────────────────────────────

#[test]
fn same_seed_gives_same_assignments() {
    let mut first = engine(8);
    let mut second = engine(8);
    first.generate();
    second.generate();
    assert_eq!(first.last_assignments(), second.last_assignments());

    let again_first = first.assign_housing().clone();
    let again_second = second.assign_housing().clone();
    assert_eq!(again_first, again_second);
}

#[test]
fn assign_new_then_reload_restores_homes() {
    let mut engine = engine(9);
    engine.generate();
    let path = temp_path("assignments.json");
    engine.set_assignments_path(&path);

    assert!(engine.run_command("assign new").success);
    let written = engine.last_assignments().cloned().unwrap();
    let before = engine.houses();

    assert!(engine.run_command("assign reload").success);
    assert_eq!(engine.last_assignments(), Some(&written));
    assert_eq!(engine.houses(), before);

    std::fs::remove_file(&path).ok();
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn save_load_round_trip() {
    let mut engine = engine(10);
    engine.generate();
    engine.set_time(9.25).unwrap();
    engine.set_day_length(480.0).unwrap();
    for _ in 0..30 {
        engine.update(0.2);
    }

    let mut bytes = Vec::new();
    engine.save_json(&mut bytes).unwrap();

    let mut restored = SimulationEngine::new(SimConfig::default().with_seed(99));
    restored.load_json(&bytes[..]).unwrap();

    assert_eq!(restored.hour_of_day(), engine.hour_of_day());
    assert_eq!(restored.clock.day_length_seconds(), 480.0);
    assert_eq!(restored.houses(), engine.houses());

    let original = persistence::villager_records(&engine.world);
    let loaded = persistence::villager_records(&restored.world);
    assert_eq!(original.len(), loaded.len());
    for (a, b) in original.iter().zip(&loaded) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.home.building_id, b.home.building_id);
        assert_eq!(
            a.workplace.as_ref().map(|w| w.building_id),
            b.workplace.as_ref().map(|w| w.building_id)
        );
        assert_eq!(a.is_sleeping, b.is_sleeping);
    }
}

#[test]
fn bincode_checkpoint_round_trip() {
    let mut engine = engine(11);
    engine.generate();
    engine.update(1.0);

    let mut bytes = Vec::new();
    engine.save(&mut bytes).unwrap();
    let mut restored = SimulationEngine::new(SimConfig::default());
    restored.load(&bytes[..]).unwrap();

    assert_eq!(restored.snapshot(), engine.snapshot());
}

#[test]
fn failed_load_keeps_current_state() {
    let mut engine = engine(12);
    engine.generate();
    let before = engine.snapshot();

    let missing = engine.load_from_path(temp_path("does-not-exist.json"));
    assert!(matches!(missing, Err(PersistError::Io(_))));

    let out = engine.run_command("load does-not-exist-either");
    assert!(!out.success);
    assert!(out.lines[0].starts_with("Failed to load game"));
    assert!(!engine.is_paused());

    assert_eq!(engine.snapshot(), before);
}

#[test]
fn save_command_writes_loadable_file() {
    let mut engine = engine(13);
    engine.generate();
    let path = temp_path("save-command");
    let file = format!("{}.json", path.display());

    let out = engine.run_command(&format!("save {}", path.display()));
    assert!(out.success, "{:?}", out.lines);

    let mut other = SimulationEngine::new(SimConfig::default());
    other.load_from_path(&file).unwrap();
    assert_eq!(other.villager_count(), engine.villager_count());

    std::fs::remove_file(&file).ok();
}

// ── Properties ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn generated_villages_respect_home_caps(seed in any::<u64>()) {
        let mut engine = SimulationEngine::new(SimConfig::default().with_seed(seed));
        engine.generate();
        let overflow = engine.last_assignments().map(|s| s.overflow_count()).unwrap_or(0);

        for house in engine.houses() {
            let building = engine.village.building(house.building_id).unwrap();
            if building.building_type.is_residential() && overflow == 0 {
                prop_assert!(house.residents.len() <= building.occupancy_cap());
            }
        }
    }
}
