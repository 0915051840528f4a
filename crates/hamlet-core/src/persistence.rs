//! Save/Load functionality for persisting simulation state
//!
//! A [`Snapshot`] holds everything the engine reads back: the camera, clock,
//! flags, village layout and one [`VillagerRecord`] per villager. It is
//! written as pretty JSON for save files and as bincode for fast in-memory
//! checkpoints.
//!
//! JSON loads are lenient per villager: a malformed villager entry is logged
//! and skipped, while a malformed top level fails the whole load. Nothing in
//! this module touches a live engine; callers swap state in only after a
//! snapshot has been read and validated.

use crate::components::*;
use crate::village::Village;
use hamlet_logic::clock::WorldClock;
use hamlet_logic::geometry::Vec2;
use hamlet_logic::housing::{AssignmentSet, HomeAssignment, WorkplaceAssignment};
use hamlet_logic::jobs::Job;
use hamlet_logic::schedule::DailySchedule;
use hecs::World;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Version number for the snapshot format (increment when it changes)
pub const SNAPSHOT_VERSION: u32 = 1;

pub const DEFAULT_SAVE_FILE: &str = "savegame.json";
pub const ASSIGNMENTS_FILE: &str = "village_assignments.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeState {
    pub current_hour: f32,
    pub day_length_seconds: f32,
}

impl From<&WorldClock> for TimeState {
    fn from(clock: &WorldClock) -> Self {
        Self {
            current_hour: clock.current_hour(),
            day_length_seconds: clock.day_length_seconds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flags {
    pub paused: bool,
    /// Clock speed multiplier
    pub time_scale: f32,
    pub debug_overlay: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            paused: false,
            time_scale: 1.0,
            debug_overlay: false,
        }
    }
}

/// One villager, flattened to plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillagerRecord {
    pub id: VillagerId,
    pub name: String,
    pub job: Job,
    pub mood: Mood,
    pub health: u8,
    pub energy: u8,
    pub money: u32,
    pub personality: Temperament,
    pub position: Vec2,
    pub destination: Option<Vec2>,
    pub speed: f32,
    pub is_sleeping: bool,
    pub wake_hour: f32,
    pub sleep_hour: f32,
    pub sleep_override: Option<SleepOverride>,
    pub current_activity: String,
    pub home: HomeAssignment,
    pub workplace: Option<WorkplaceAssignment>,
    pub daily_activities: DailySchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub camera: Camera,
    pub time: TimeState,
    pub flags: Flags,
    pub village_data: Village,
    pub villagers: Vec<VillagerRecord>,
    pub selected_villager_name: Option<String>,
    /// Simulation seconds since the engine started
    pub elapsed_secs: f64,
}

/// JSON shape with villagers left unparsed so bad entries can be skipped
#[derive(Deserialize)]
struct LenientSnapshot {
    version: u32,
    #[serde(default)]
    camera: Camera,
    time: TimeState,
    #[serde(default)]
    flags: Flags,
    village_data: Village,
    #[serde(default)]
    villagers: Vec<serde_json::Value>,
    #[serde(default)]
    selected_villager_name: Option<String>,
    #[serde(default)]
    elapsed_secs: f64,
}

impl Snapshot {
    /// Check the parts that would leave the engine inconsistent.
    pub fn validate(&self) -> Result<(), PersistError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: self.version,
            });
        }
        WorldClock::new(self.time.current_hour, self.time.day_length_seconds)
            .map_err(|e| PersistError::InvalidSnapshot(e.to_string()))?;
        if self.village_data.tile_size <= 0 {
            return Err(PersistError::InvalidSnapshot(format!(
                "tile size {} is not positive",
                self.village_data.tile_size
            )));
        }
        for (i, building) in self.village_data.buildings.iter().enumerate() {
            if building.id.index() != Some(i) {
                return Err(PersistError::InvalidSnapshot(format!(
                    "building at index {} has id {}",
                    i, building.id
                )));
            }
        }
        let mut ids = HashSet::new();
        for record in &self.villagers {
            if !ids.insert(record.id) {
                return Err(PersistError::InvalidSnapshot(format!(
                    "duplicate villager id {}",
                    record.id
                )));
            }
        }
        Ok(())
    }
}

pub fn write_json<W: Write>(writer: W, snapshot: &Snapshot) -> Result<(), PersistError> {
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

/// Read a JSON snapshot, skipping villager entries that fail to parse.
pub fn read_json<R: Read>(reader: R) -> Result<Snapshot, PersistError> {
    let raw: LenientSnapshot = serde_json::from_reader(reader)?;

    let mut villagers = Vec::with_capacity(raw.villagers.len());
    for (i, value) in raw.villagers.into_iter().enumerate() {
        match serde_json::from_value::<VillagerRecord>(value) {
            Ok(record) => villagers.push(record),
            Err(e) => warn!("Skipping malformed villager entry {}: {}", i, e),
        }
    }

    let snapshot = Snapshot {
        version: raw.version,
        camera: raw.camera,
        time: raw.time,
        flags: raw.flags,
        village_data: raw.village_data,
        villagers,
        selected_villager_name: raw.selected_villager_name,
        elapsed_secs: raw.elapsed_secs,
    };
    snapshot.validate()?;
    Ok(snapshot)
}

pub fn write_bincode<W: Write>(writer: W, snapshot: &Snapshot) -> Result<(), PersistError> {
    bincode::serialize_into(writer, snapshot)?;
    Ok(())
}

pub fn read_bincode<R: Read>(reader: R) -> Result<Snapshot, PersistError> {
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Flatten every villager in `world` into records, ordered by id.
pub fn villager_records(world: &World) -> Vec<VillagerRecord> {
    let mut records: Vec<VillagerRecord> = world
        .query::<(
            &VillagerId,
            &Identity,
            &Position,
            &Movement,
            &SleepCycle,
            &Activity,
            &Home,
            &Workplace,
            &Schedule,
        )>()
        .iter()
        .map(
            |(_, (id, identity, position, movement, sleep, activity, home, workplace, schedule))| {
                VillagerRecord {
                    id: *id,
                    name: identity.name.clone(),
                    job: identity.job,
                    mood: identity.mood,
                    health: identity.health,
                    energy: identity.energy,
                    money: identity.money,
                    personality: identity.personality,
                    position: position.0,
                    destination: movement.destination,
                    speed: movement.speed,
                    is_sleeping: sleep.is_sleeping,
                    wake_hour: sleep.wake_hour,
                    sleep_hour: sleep.sleep_hour,
                    sleep_override: sleep.sleep_override,
                    current_activity: activity.label.clone(),
                    home: home.0.clone(),
                    workplace: workplace.0.clone(),
                    daily_activities: schedule.0.clone(),
                }
            },
        )
        .collect();
    records.sort_by_key(|r| r.id);
    records
}

/// Build a fresh world from records. Talk state and bounding boxes are not
/// saved, so villagers come back silent and without a box.
pub fn build_world(records: Vec<VillagerRecord>) -> World {
    let mut world = World::new();
    for record in records {
        let mut movement = Movement::new(record.speed);
        movement.destination = record.destination;

        world.spawn((
            record.id,
            Identity {
                name: record.name,
                job: record.job,
                mood: record.mood,
                health: record.health,
                energy: record.energy,
                money: record.money,
                personality: record.personality,
            },
            Position(record.position),
            movement,
            SleepCycle {
                is_sleeping: record.is_sleeping,
                wake_hour: record.wake_hour,
                sleep_hour: record.sleep_hour,
                sleep_override: record.sleep_override,
            },
            Activity::new(record.current_activity),
            Home(record.home),
            Workplace(record.workplace),
            Schedule(record.daily_activities),
            Talk::default(),
            Location::default(),
            Bounds::default(),
        ));
    }
    world
}

pub fn save_assignments(path: impl AsRef<Path>, set: &AssignmentSet) -> Result<(), PersistError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), set)?;
    info!(
        "Saved {} housing assignments to {}",
        set.villagers.len(),
        path.display()
    );
    Ok(())
}

pub fn load_assignments(path: impl AsRef<Path>) -> Result<AssignmentSet, PersistError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let set: AssignmentSet = serde_json::from_reader(std::io::BufReader::new(file))?;
    info!(
        "Loaded {} housing assignments from {}",
        set.villagers.len(),
        path.display()
    );
    Ok(set)
}

/// `name` with `.json` appended unless it already ends with it.
pub fn save_file_name(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => DEFAULT_SAVE_FILE.to_string(),
        Some(n) if n.ends_with(".json") => n.to_string(),
        Some(n) => format!("{n}.json"),
    }
}
