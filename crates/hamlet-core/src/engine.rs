//! Simulation engine - main entry point for running the village
//!
//! The engine owns the ECS world, the village layout, the clock, the
//! interaction coordinator, the seeded RNG and the event sink. One call to
//! [`SimulationEngine::update`] is one tick, run in a fixed order:
//! clock, villagers, interactions.
//!
//! Housing only changes through explicit calls ([`SimulationEngine::generate`],
//! [`SimulationEngine::assign_housing`], [`SimulationEngine::apply_assignments`]
//! and snapshot loads), never from inside a tick.

use crate::components::*;
use crate::events::{EventSink, NullSink, SimEvent};
use crate::generation::{generate_village, generate_villagers, spawn_villager};
use crate::persistence::{self, Camera, Flags, PersistError, Snapshot, TimeState};
use crate::systems::*;
use crate::village::Village;
use hamlet_logic::building::{BuildingId, BuildingType};
use hamlet_logic::clock::{ClockError, WorldClock};
use hamlet_logic::config::SimConfig;
use hamlet_logic::geometry::Vec2;
use hamlet_logic::housing::{self, AssignmentSet, HomeAssignment, ResidentProfile};
use hamlet_logic::jobs::Job;
use hecs::{Entity, World};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// A building with its residents, for the `houses` listing
#[derive(Debug, Clone, PartialEq)]
pub struct HouseListing {
    pub building_id: BuildingId,
    pub name: String,
    pub building_type: BuildingType,
    pub residents: Vec<(String, Job)>,
}

/// Read-only summary of one villager
#[derive(Debug, Clone, PartialEq)]
pub struct VillagerStatus {
    pub name: String,
    pub job: Job,
    pub activity: String,
    pub is_sleeping: bool,
    pub is_talking: bool,
    pub position: Vec2,
    pub home: BuildingId,
    pub workplace: Option<String>,
}

/// Main simulation engine
pub struct SimulationEngine<S: EventSink = NullSink> {
    /// ECS world containing all villagers
    pub world: World,
    pub village: Village,
    pub clock: WorldClock,
    pub interactions: InteractionCoordinator,
    pub camera: Camera,
    pub flags: Flags,
    config: SimConfig,
    rng: ChaCha8Rng,
    strategy: Box<dyn DestinationStrategy>,
    sink: S,
    /// Real seconds simulated since start (pauses excluded)
    elapsed_secs: f64,
    selected: Option<String>,
    next_villager_id: u32,
    assignments_path: PathBuf,
    last_assignments: Option<AssignmentSet>,
}

impl SimulationEngine<NullSink> {
    /// Create an empty simulation that discards its events
    pub fn new(config: SimConfig) -> Self {
        Self::with_sink(config, NullSink)
    }
}

impl Default for SimulationEngine<NullSink> {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl<S: EventSink> SimulationEngine<S> {
    /// Create an empty simulation emitting into `sink`
    pub fn with_sink(config: SimConfig, sink: S) -> Self {
        let clock = WorldClock::new(config.time.start_hour, config.time.day_length_seconds)
            .unwrap_or_else(|e| {
                warn!("Invalid clock settings ({}), using defaults", e);
                WorldClock::default()
            });
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let world_cfg = &config.world;

        Self {
            world: World::new(),
            village: Village::empty(world_cfg.width, world_cfg.height, world_cfg.tile_size),
            clock,
            interactions: InteractionCoordinator::new(config.interaction.clone()),
            camera: Camera::default(),
            flags: Flags {
                time_scale: config.time.time_scale,
                ..Flags::default()
            },
            config,
            rng,
            strategy: Box::new(HomeWorkBiased::default()),
            sink,
            elapsed_secs: 0.0,
            selected: None,
            next_villager_id: 1,
            assignments_path: PathBuf::from(persistence::ASSIGNMENTS_FILE),
            last_assignments: None,
        }
    }

    /// Replace the destination strategy
    pub fn with_strategy(mut self, strategy: impl DestinationStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Where `assign new` writes and `assign reload` reads
    pub fn set_assignments_path(&mut self, path: impl Into<PathBuf>) {
        self.assignments_path = path.into();
    }

    pub fn assignments_path(&self) -> &Path {
        &self.assignments_path
    }

    /// Generate a village and its population, house everyone and put them
    /// to bed. Replaces any existing villagers.
    pub fn generate(&mut self) {
        self.village = generate_village(&self.config.world, &mut self.rng);
        self.world = World::new();
        self.interactions.clear(&mut self.world);
        self.selected = None;
        self.next_villager_id = 1;

        let spawned = generate_villagers(
            &mut self.world,
            &self.village,
            &self.config.villagers,
            self.next_villager_id,
            &mut self.rng,
        );
        self.next_villager_id += spawned.len() as u32;

        self.assign_housing();
    }

    /// Add one villager at `position`. It starts asleep and unhoused.
    pub fn spawn_villager(&mut self, name: impl Into<String>, job: Job, position: Vec2) -> Entity {
        let range = self.config.villagers.speed_range;
        let speed = if range.max > range.min {
            self.rng.gen_range(range.min..=range.max)
        } else {
            range.min
        };
        let id = VillagerId(self.next_villager_id);
        self.next_villager_id += 1;
        spawn_villager(
            &mut self.world,
            id,
            name.into(),
            job,
            position,
            speed,
            self.village.tile_size,
            &mut self.rng,
        )
    }

    /// Update the simulation by `delta_seconds` of real time
    pub fn update(&mut self, delta_seconds: f32) {
        if self.flags.paused || delta_seconds <= 0.0 {
            return;
        }
        self.elapsed_secs += delta_seconds as f64;

        if let Some(change) = self.clock.advance(delta_seconds, self.flags.time_scale) {
            debug!("Time of day: {} -> {}", change.previous, change.current);
            self.sink.emit(SimEvent::PeriodChanged {
                previous: change.previous,
                current: change.current,
            });
        }

        let ctx = TickContext {
            hour: self.clock.current_hour(),
            dt: delta_seconds,
            village: &self.village,
        };
        villager_system(
            &mut self.world,
            &ctx,
            self.strategy.as_ref(),
            &mut self.rng,
            &mut self.sink,
        );

        self.interactions
            .update(&mut self.world, self.elapsed_secs, &mut self.rng, &mut self.sink);
    }

    // ---- housing ----

    /// Run the allocator over the current roster and apply the result.
    pub fn assign_housing(&mut self) -> &AssignmentSet {
        let residents: Vec<ResidentProfile> = villager_entities(&self.world)
            .into_iter()
            .filter_map(|e| {
                let identity = self.world.get::<&Identity>(e).ok()?;
                Some(ResidentProfile::new(identity.name.clone(), identity.job))
            })
            .collect();

        let set = housing::assign(
            &residents,
            &self.village.buildings,
            self.village.bounds(),
            &mut self.rng,
        );
        self.apply_assignments(&set);
        self.last_assignments.insert(set)
    }

    /// Apply an assignment set by villager name, then send everyone home to
    /// sleep. Returns how many villagers were updated.
    pub fn apply_assignments(&mut self, set: &AssignmentSet) -> usize {
        housing::apply_house_names(&mut self.village.buildings, set);

        let mut applied = 0;
        for assignment in &set.villagers {
            let Some(entity) = find_villager(&self.world, &assignment.name) else {
                warn!("Assignment for unknown villager {}, skipping", assignment.name);
                continue;
            };

            let mut home = assignment.home.clone();
            if home.is_assigned() && self.village.building(home.building_id).is_none() {
                warn!(
                    "{} assigned to missing building {}, leaving unhoused",
                    assignment.name, home.building_id
                );
                home = HomeAssignment::unassigned();
            }
            let home_id = home.building_id;
            let workplace_id = assignment.workplace.as_ref().map(|w| w.building_id);

            let Ok((home_c, work_c, schedule_c)) = self
                .world
                .query_one_mut::<(&mut Home, &mut Workplace, &mut Schedule)>(entity)
            else {
                warn!("{} is missing housing components, skipping", assignment.name);
                continue;
            };
            home_c.0 = home;
            work_c.0 = assignment.workplace.clone();
            schedule_c.0 = assignment.daily_activities.clone();
            applied += 1;

            self.sink.emit(SimEvent::HousingAssigned {
                name: assignment.name.clone(),
                home: home_id,
                workplace: workplace_id,
            });
        }

        info!("Applied housing to {} of {} villagers", applied, set.villagers.len());
        self.force_all_to_homes();
        applied
    }

    /// `assign new`: reassign and write the result to the assignments file.
    pub fn assign_new(&mut self) -> Result<usize, PersistError> {
        let path = self.assignments_path.clone();
        let set = self.assign_housing();
        let count = set.villagers.len();
        persistence::save_assignments(&path, set)?;
        Ok(count)
    }

    /// `assign reload`: read the assignments file and apply it.
    pub fn reload_assignments(&mut self) -> Result<usize, PersistError> {
        let set = persistence::load_assignments(&self.assignments_path)?;
        let applied = self.apply_assignments(&set);
        self.last_assignments = Some(set);
        Ok(applied)
    }

    pub fn last_assignments(&self) -> Option<&AssignmentSet> {
        self.last_assignments.as_ref()
    }

    // ---- repairs ----

    pub fn force_all_to_homes(&mut self) -> HomeReport {
        force_all_to_homes(&mut self.world, &self.village, &mut self.rng, &mut self.sink)
    }

    pub fn fix_sleep_states(&mut self) -> usize {
        let hour = self.clock.current_hour();
        fix_sleep_states(&mut self.world, hour, &mut self.rng, &mut self.sink)
    }

    /// Force matching villagers awake. `None` uses the configured duration.
    pub fn wake(&mut self, target: &Target, duration_secs: Option<f32>) -> OverrideOutcome {
        let duration = duration_secs.unwrap_or(self.config.overrides.default_duration_secs);
        override_sleep(&mut self.world, target, true, duration, &self.village, &mut self.sink)
    }

    /// Force matching villagers asleep. `None` uses the configured duration.
    pub fn sleep(&mut self, target: &Target, duration_secs: Option<f32>) -> OverrideOutcome {
        let duration = duration_secs.unwrap_or(self.config.overrides.default_duration_secs);
        override_sleep(&mut self.world, target, false, duration, &self.village, &mut self.sink)
    }

    // ---- time ----

    pub fn set_time(&mut self, hour: f32) -> Result<(), ClockError> {
        self.clock.set_time(hour)?;
        self.sink.emit(SimEvent::TimeChanged { hour });
        Ok(())
    }

    pub fn set_day_length(&mut self, seconds: f32) -> Result<(), ClockError> {
        self.clock.set_day_length(seconds)
    }

    /// Set clock speed (1.0 = configured day length, 2.0 = twice as fast)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.flags.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.flags.time_scale
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.flags.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused
    }

    pub fn hour_of_day(&self) -> f32 {
        self.clock.current_hour()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    // ---- queries ----

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn villager_count(&self) -> usize {
        self.world.query::<&VillagerId>().iter().count()
    }

    pub fn building_count(&self) -> usize {
        self.village.buildings.len()
    }

    pub fn sleeping_count(&self) -> usize {
        self.world
            .query::<&SleepCycle>()
            .iter()
            .filter(|(_, sleep)| sleep.is_sleeping)
            .count()
    }

    pub fn talking_count(&self) -> usize {
        self.world
            .query::<&Talk>()
            .iter()
            .filter(|(_, talk)| talk.is_talking)
            .count()
    }

    /// Buildings with at least one resident, in id order. Residents are
    /// listed in villager id order.
    pub fn houses(&self) -> Vec<HouseListing> {
        let mut listings: Vec<HouseListing> = Vec::new();
        for entity in villager_entities(&self.world) {
            let Ok(mut query) = self.world.query_one::<(&Identity, &Home)>(entity) else {
                continue;
            };
            let Some((identity, home)) = query.get() else {
                continue;
            };
            let Some(building) = self.village.building(home.0.building_id) else {
                continue;
            };

            let resident = (identity.name.clone(), identity.job);
            match listings.iter_mut().find(|l| l.building_id == building.id) {
                Some(listing) => listing.residents.push(resident),
                None => listings.push(HouseListing {
                    building_id: building.id,
                    name: building.display_name().to_string(),
                    building_type: building.building_type,
                    residents: vec![resident],
                }),
            }
        }
        listings.sort_by_key(|l| l.building_id);
        listings
    }

    pub fn villager_status(&self, name: &str) -> Option<VillagerStatus> {
        let entity = find_villager(&self.world, name)?;
        let mut query = self
            .world
            .query_one::<(&Identity, &Activity, &SleepCycle, &Talk, &Position, &Home, &Workplace)>(
                entity,
            )
            .ok()?;
        let (identity, activity, sleep, talk, position, home, workplace) = query.get()?;
        Some(VillagerStatus {
            name: identity.name.clone(),
            job: identity.job,
            activity: activity.label.clone(),
            is_sleeping: sleep.is_sleeping,
            is_talking: talk.is_talking,
            position: position.0,
            home: home.0.building_id,
            workplace: workplace.0.as_ref().map(|w| w.label.clone()),
        })
    }

    /// Select a villager by exact name. Returns false if none matches.
    pub fn select_villager(&mut self, name: &str) -> bool {
        if find_villager(&self.world, name).is_none() {
            return false;
        }
        self.selected = Some(name.to_string());
        self.sink.emit(SimEvent::VillagerSelected {
            name: name.to_string(),
        });
        true
    }

    pub fn selected_villager(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: persistence::SNAPSHOT_VERSION,
            camera: self.camera,
            time: TimeState::from(&self.clock),
            flags: self.flags,
            village_data: self.village.clone(),
            villagers: persistence::villager_records(&self.world),
            selected_villager_name: self.selected.clone(),
            elapsed_secs: self.elapsed_secs,
        }
    }

    /// Replace engine state with a validated snapshot. On error nothing
    /// changes.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), PersistError> {
        snapshot.validate()?;
        let clock = WorldClock::new(snapshot.time.current_hour, snapshot.time.day_length_seconds)
            .map_err(|e| PersistError::InvalidSnapshot(e.to_string()))?;

        let next_id = snapshot
            .villagers
            .iter()
            .map(|r| r.id.0 + 1)
            .max()
            .unwrap_or(1);
        let world = persistence::build_world(snapshot.villagers);

        self.world = world;
        self.village = snapshot.village_data;
        self.clock = clock;
        self.camera = snapshot.camera;
        self.flags = snapshot.flags;
        self.elapsed_secs = snapshot.elapsed_secs;
        self.next_villager_id = next_id;
        self.interactions.clear(&mut self.world);
        self.selected = snapshot
            .selected_villager_name
            .filter(|name| find_villager(&self.world, name).is_some());
        Ok(())
    }

    /// Write a pretty JSON snapshot
    pub fn save_json<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        persistence::write_json(writer, &self.snapshot())
    }

    pub fn load_json<R: Read>(&mut self, reader: R) -> Result<(), PersistError> {
        let snapshot = persistence::read_json(reader)?;
        self.restore(snapshot)
    }

    /// Write a compact bincode checkpoint
    pub fn save<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        persistence::write_bincode(writer, &self.snapshot())
    }

    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), PersistError> {
        let snapshot = persistence::read_bincode(reader)?;
        self.restore(snapshot)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.save_json(&mut writer)?;
        writer.flush()?;
        info!("Saved {} villagers to {}", self.villager_count(), path.display());
        Ok(())
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        self.load_json(BufReader::new(file))?;
        info!("Loaded {} villagers from {}", self.villager_count(), path.display());
        Ok(())
    }
}
