//! Villager components: identity, sleep cycle, talk state, assignments.

use hamlet_logic::housing::{HomeAssignment, WorkplaceAssignment};
use hamlet_logic::jobs::Job;
use hamlet_logic::schedule::DailySchedule;
use serde::{Deserialize, Serialize};

/// Stable villager identifier, unique within a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VillagerId(pub u32);

impl std::fmt::Display for VillagerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who a villager is. Mood and stats are cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub job: Job,
    pub mood: Mood,
    pub health: u8,
    pub energy: u8,
    pub money: u32,
    pub personality: Temperament,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Content,
    Neutral,
    Tired,
    Excited,
    Curious,
    Busy,
    Relaxed,
    Bored,
    Worried,
}

impl Mood {
    pub const ALL: [Mood; 10] = [
        Mood::Happy,
        Mood::Content,
        Mood::Neutral,
        Mood::Tired,
        Mood::Excited,
        Mood::Curious,
        Mood::Busy,
        Mood::Relaxed,
        Mood::Bored,
        Mood::Worried,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Temperament {
    Social,
    Solitary,
    Industrious,
    Lazy,
}

impl Temperament {
    pub const ALL: [Temperament; 4] = [
        Temperament::Social,
        Temperament::Solitary,
        Temperament::Industrious,
        Temperament::Lazy,
    ];
}

/// Clock-driven sleep state.
///
/// A villager is awake while the hour is in `[wake_hour, sleep_hour)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepCycle {
    pub is_sleeping: bool,
    pub wake_hour: f32,
    pub sleep_hour: f32,
    pub sleep_override: Option<SleepOverride>,
}

impl SleepCycle {
    pub fn new(wake_hour: f32, sleep_hour: f32) -> Self {
        Self {
            is_sleeping: true,
            wake_hour,
            sleep_hour,
            sleep_override: None,
        }
    }

    pub fn should_sleep_at(&self, hour: f32) -> bool {
        !(self.wake_hour..self.sleep_hour).contains(&hour)
    }

    /// True while an override suppresses clock reconciliation.
    pub fn is_overridden(&self) -> bool {
        self.sleep_override.is_some()
    }
}

/// Temporary forced sleep/wake state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepOverride {
    pub force_awake: bool,
    pub remaining_secs: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talk {
    pub is_talking: bool,
}

/// Human-readable current activity label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub label: String,
    /// Seconds until the label is next chosen from the schedule
    #[serde(default)]
    pub recheck_in: f32,
}

impl Activity {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            recheck_in: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Home(pub HomeAssignment);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workplace(pub Option<WorkplaceAssignment>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule(pub DailySchedule);
