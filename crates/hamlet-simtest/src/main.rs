//! Hamlet Headless Simulation Harness
//!
//! Generates a village, runs it for a while and checks the scheduling and
//! housing invariants. Runs entirely in-process, no rendering.
//!
//! Usage:
//!   cargo run -p hamlet-simtest
//!   cargo run -p hamlet-simtest -- --seed 7 --ticks 5000 --verbose

use clap::Parser;
use hamlet_core::persistence;
use hamlet_core::prelude::*;
use hamlet_core::systems::HomeWorkBiased;
use hamlet_logic::beds::{resolve_bed, OccupiedBeds};
use hamlet_logic::config::SimConfig;
use hamlet_logic::schedule::is_home_activity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hamlet-simtest")]
#[command(version, about, long_about = None)]
struct Args {
    /// RNG seed for village generation and the run
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of villagers (overrides the config file)
    #[arg(long)]
    villagers: Option<usize>,

    /// Ticks to simulate at 60 FPS
    #[arg(short, long, default_value_t = 3000)]
    ticks: u32,

    /// Config file; missing means defaults
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep the save written by the round-trip check at this path
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Print passing checks and lower the log level to debug
    #[arg(short, long)]
    verbose: bool,
}

const TICK: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    println!("=== Hamlet Simulation Harness ===\n");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };
    info!(seed = args.seed, villagers = config.villagers.count, "starting run");

    let mut engine = SimulationEngine::with_sink(config.clone(), Vec::new());
    engine.generate();

    let mut results = Vec::new();

    // 1. Generated village and population
    results.extend(validate_generation(&engine, &config));

    // 2. Housing invariants
    results.extend(validate_housing(&engine));

    // 3. Determinism
    results.extend(validate_determinism(&engine, &config));

    // 4. Run the clock and check sleep/conversation state
    results.extend(validate_run(&mut engine, args.ticks));

    // 5. Schedule-driven activities on a commuting population
    results.extend(validate_activities(&config));

    // 6. Console commands
    results.extend(validate_commands(&mut engine));

    // 7. Save/load round trip
    results.extend(validate_persistence(&mut engine, args.save.as_ref()));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<SimConfig, hamlet_logic::config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(count) = args.villagers {
        config.villagers.count = count;
    }
    let config = config.with_seed(args.seed);
    config.validate()?;
    Ok(config)
}

// ── 1. Generation ───────────────────────────────────────────────────────

fn validate_generation(engine: &SimulationEngine<Vec<SimEvent>>, config: &SimConfig) -> Vec<TestResult> {
    println!("--- Generation ---");
    let mut results = Vec::new();

    results.push(TestResult::new(
        "village_has_buildings",
        engine.building_count() > 0,
        format!("{} buildings", engine.building_count()),
    ));

    results.push(TestResult::new(
        "population_size",
        engine.villager_count() == config.villagers.count,
        format!(
            "{} villagers (expected {})",
            engine.villager_count(),
            config.villagers.count
        ),
    ));

    results.push(TestResult::new(
        "everyone_starts_asleep",
        engine.sleeping_count() == engine.villager_count(),
        format!(
            "{}/{} asleep after generation",
            engine.sleeping_count(),
            engine.villager_count()
        ),
    ));

    let ids_match = engine
        .village
        .buildings
        .iter()
        .enumerate()
        .all(|(i, b)| b.id.index() == Some(i));
    results.push(TestResult::new(
        "building_ids_are_indices",
        ids_match,
        "building id equals list position",
    ));

    results
}

// ── 2. Housing ──────────────────────────────────────────────────────────

fn validate_housing(engine: &SimulationEngine<Vec<SimEvent>>) -> Vec<TestResult> {
    println!("--- Housing ---");
    let mut results = Vec::new();
    let Some(set) = engine.last_assignments() else {
        results.push(TestResult::new("assignments_exist", false, "no assignment set"));
        return results;
    };

    let overflow = set.overflow_count();
    let over_cap: Vec<String> = engine
        .houses()
        .iter()
        .filter_map(|house| {
            let building = engine.village.building(house.building_id)?;
            (building.building_type.is_residential()
                && house.residents.len() > building.occupancy_cap())
            .then(|| format!("{} ({}/{})", house.name, house.residents.len(), building.occupancy_cap()))
        })
        .collect();
    results.push(TestResult::new(
        "homes_within_capacity",
        over_cap.is_empty() || overflow > 0,
        if over_cap.is_empty() {
            "no home over its cap".to_string()
        } else {
            format!("over cap with {} overflows: {}", overflow, over_cap.join(", "))
        },
    ));

    let mut exclusive: HashMap<i32, Vec<&str>> = HashMap::new();
    for v in &set.villagers {
        if !v.job.has_exclusive_workplace() {
            continue;
        }
        if let Some(work) = v.workplace.as_ref().filter(|w| !w.is_external) {
            exclusive.entry(work.building_id.0).or_default().push(&v.name);
        }
    }
    let shared: Vec<String> = exclusive
        .iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(id, names)| format!("building {}: {}", id, names.join(", ")))
        .collect();
    results.push(TestResult::new(
        "exclusive_workplaces",
        shared.is_empty(),
        if shared.is_empty() {
            "every Baker/Blacksmith/Innkeeper workplace has one worker".to_string()
        } else {
            shared.join("; ")
        },
    ));

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let mut unclaimed = Vec::new();
    for house in engine.houses() {
        let Some(building) = engine.village.building(house.building_id) else {
            continue;
        };
        if house.residents.len() > building.occupancy_cap() {
            continue;
        }
        let mut occupied = OccupiedBeds::new();
        for (name, _) in &house.residents {
            let bed = resolve_bed(
                name,
                building,
                house.residents.len(),
                &mut occupied,
                engine.village.tile_size,
                &mut rng,
            );
            if !bed.claimed {
                unclaimed.push(name.clone());
            }
        }
        debug!(house = %house.name, beds = occupied.len(), "resolved beds");
    }
    results.push(TestResult::new(
        "distinct_bed_slots",
        unclaimed.is_empty(),
        if unclaimed.is_empty() {
            "every resident got an unshared bed slot".to_string()
        } else {
            format!("shared slots for: {}", unclaimed.join(", "))
        },
    ));

    let outside_jobs_external = set
        .villagers
        .iter()
        .filter(|v| v.job.works_outside_village())
        .all(|v| v.workplace.as_ref().is_some_and(|w| w.is_external));
    results.push(TestResult::new(
        "miners_and_hunters_work_outside",
        outside_jobs_external,
        "external workplaces sit on the village edge",
    ));

    results
}

// ── 3. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(engine: &SimulationEngine<Vec<SimEvent>>, config: &SimConfig) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut twin = SimulationEngine::new(config.clone());
    twin.generate();

    vec![
        TestResult::new(
            "same_seed_same_village",
            twin.village == engine.village,
            "village layout reproduces from the seed",
        ),
        TestResult::new(
            "same_seed_same_assignments",
            twin.last_assignments() == engine.last_assignments(),
            "housing assignments reproduce from the seed",
        ),
    ]
}

// ── 4. Run ──────────────────────────────────────────────────────────────

fn validate_run(engine: &mut SimulationEngine<Vec<SimEvent>>, ticks: u32) -> Vec<TestResult> {
    println!("--- Run ({} ticks) ---", ticks);
    let mut results = Vec::new();
    let mut talk_mismatch = 0;

    for _ in 0..ticks {
        engine.update(TICK);
        if engine.talking_count() != engine.interactions.active().len() * 2 {
            talk_mismatch += 1;
        }
    }
    info!(
        hour = engine.hour_of_day(),
        events = engine.sink().len(),
        "run finished"
    );

    results.push(TestResult::new(
        "talk_flags_match_conversations",
        talk_mismatch == 0,
        format!("{} ticks with a stray talk flag", talk_mismatch),
    ));

    let first = engine.fix_sleep_states();
    let second = engine.fix_sleep_states();
    results.push(TestResult::new(
        "sleep_matches_clock",
        first == 0,
        format!("{} villagers out of step at {:.2}h", first, engine.hour_of_day()),
    ));
    results.push(TestResult::new(
        "fix_sleepers_idempotent",
        second == 0,
        format!("second pass corrected {}", second),
    ));

    let moved = engine
        .sink()
        .iter()
        .filter(|e| matches!(e, SimEvent::VillagerMoved { .. }))
        .count();
    debug!(moved, "movement events");

    results
}

// ── 5. Activities ───────────────────────────────────────────────────────

fn validate_activities(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Activities ---");
    let mut engine = SimulationEngine::with_sink(config.clone(), Vec::new())
        .with_strategy(HomeWorkBiased { anchor_chance: 1.0 });
    engine.generate();
    let setup = engine
        .set_day_length(3600.0)
        .and_then(|_| engine.set_time(10.0));
    if let Err(e) = setup {
        return vec![TestResult::new("activities_setup", false, e.to_string())];
    }

    // two minutes of commuting stays inside the morning
    for _ in 0..7200 {
        engine.update(TICK);
    }

    let mut working = 0;
    for (_, (identity, activity)) in engine.world.query::<(&Identity, &Activity)>().iter() {
        let label = activity.label.as_str();
        if identity.job.activities().contains(&label) && !is_home_activity(label) {
            working += 1;
        }
    }
    debug!(working, hour = engine.hour_of_day(), "villagers on a work activity");

    vec![TestResult::new(
        "morning_workers_take_up_work",
        working > 0,
        format!("{} villagers on a work activity at {:.2}h", working, engine.hour_of_day()),
    )]
}

// ── 6. Commands ─────────────────────────────────────────────────────────

fn validate_commands(engine: &mut SimulationEngine<Vec<SimEvent>>) -> Vec<TestResult> {
    println!("--- Commands ---");
    let mut results = Vec::new();

    let out = engine.run_command("daytime 12:00");
    results.push(TestResult::new(
        "daytime_sets_clock",
        out.success && (engine.hour_of_day() - 12.0).abs() < 1e-4,
        out.lines.join(" / "),
    ));

    engine.run_command("fix sleepers");
    let awake_before = engine.villager_count() - engine.sleeping_count();
    let out = engine.run_command("wake all");
    results.push(TestResult::new(
        "wake_all_when_awake",
        !out.success && engine.villager_count() - engine.sleeping_count() == awake_before,
        out.lines.join(" / "),
    ));

    let out = engine.run_command("timespeed 30");
    results.push(TestResult::new(
        "timespeed_rejects_short_day",
        !out.success && engine.clock.day_length_seconds() >= 60.0,
        out.lines.join(" / "),
    ));

    let out = engine.run_command("fix homes");
    let housed: usize = engine.houses().iter().map(|h| h.residents.len()).sum();
    results.push(TestResult::new(
        "fix_homes_beds_everyone",
        out.success && engine.sleeping_count() == housed,
        format!("{} asleep, {} housed", engine.sleeping_count(), housed),
    ));

    let out = engine.run_command("houses");
    results.push(TestResult::new(
        "houses_lists_residents",
        out.success && out.lines.len() > 1,
        format!("{} lines", out.lines.len()),
    ));

    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(
    engine: &mut SimulationEngine<Vec<SimEvent>>,
    keep: Option<&PathBuf>,
) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let path = keep.cloned().unwrap_or_else(|| {
        std::env::temp_dir().join(format!("hamlet-simtest-{}.json", std::process::id()))
    });
    if let Err(e) = engine.save_to_path(&path) {
        results.push(TestResult::new("save", false, e.to_string()));
        return results;
    }

    let mut restored = SimulationEngine::new(engine.config().clone());
    match restored.load_from_path(&path) {
        Ok(()) => {
            let before = persistence::villager_records(&engine.world);
            let after = persistence::villager_records(&restored.world);
            let same_villagers = before.len() == after.len()
                && before.iter().zip(&after).all(|(a, b)| {
                    a.name == b.name
                        && a.home.building_id == b.home.building_id
                        && a.workplace.as_ref().map(|w| w.building_id)
                            == b.workplace.as_ref().map(|w| w.building_id)
                        && a.is_sleeping == b.is_sleeping
                });
            results.push(TestResult::new(
                "round_trip_clock",
                restored.hour_of_day() == engine.hour_of_day()
                    && restored.clock.day_length_seconds() == engine.clock.day_length_seconds(),
                restored.clock.time_string(),
            ));
            results.push(TestResult::new(
                "round_trip_villagers",
                same_villagers && restored.houses() == engine.houses(),
                format!("{} villagers restored", after.len()),
            ));
        }
        Err(e) => results.push(TestResult::new("load", false, e.to_string())),
    }

    let before = engine.snapshot();
    let bad = engine.load_from_path(path.with_extension("missing"));
    results.push(TestResult::new(
        "failed_load_keeps_state",
        bad.is_err() && engine.snapshot() == before,
        "missing file leaves the engine untouched",
    ));

    if keep.is_none() {
        std::fs::remove_file(&path).ok();
    }
    results
}
