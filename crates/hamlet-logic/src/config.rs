//! Simulation configuration.
//!
//! Every field has a default, so a partial JSON file only overrides what it
//! names and a missing file yields [`SimConfig::default`].

use crate::clock::MIN_DAY_LENGTH_SECS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {}", join_problems(.0))]
    Invalid(Vec<ConfigProblem>),
}

fn join_problems(problems: &[ConfigProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigProblem {
    #[error("day length {0}s is below {}s", MIN_DAY_LENGTH_SECS)]
    DayTooShort(f32),
    #[error("start hour {0} is outside 0-24")]
    StartHourOutOfRange(f32),
    #[error("time scale must be positive, got {0}")]
    NonPositiveTimeScale(f32),
    #[error("range '{name}' is empty or inverted ({min}..{max})")]
    BadRange { name: &'static str, min: f32, max: f32 },
    #[error("interaction radius must not be negative, got {0}")]
    NegativeRadius(f32),
    #[error("conversation chance {0} is outside 0-1")]
    ChanceOutOfRange(f32),
    #[error("tile size must be positive, got {0}")]
    BadTileSize(i32),
    #[error("village of {width}x{height} px is smaller than one tile")]
    VillageTooSmall { width: i32, height: i32 },
}

/// Inclusive `[min, max]` range of floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &'static str) -> Option<ConfigProblem> {
        let valid = self.min.is_finite() && self.max.is_finite() && self.min <= self.max;
        (!valid).then_some(ConfigProblem::BadRange {
            name,
            min: self.min,
            max: self.max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub tile_size: i32,
    pub width: i32,
    pub height: i32,
    pub building_count: usize,
    /// Fraction of grid streets laid down as path tiles
    pub path_density: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            width: 1280,
            height: 1280,
            building_count: 16,
            path_density: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VillagerConfig {
    pub count: usize,
    /// Walking speed in px per second
    pub speed_range: Range,
}

impl Default for VillagerConfig {
    fn default() -> Self {
        Self {
            count: 10,
            speed_range: Range::new(18.0, 60.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub day_length_seconds: f32,
    pub start_hour: f32,
    pub time_scale: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            day_length_seconds: 300.0,
            start_hour: 6.0,
            time_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub radius: f32,
    /// Per-pair probability of starting a conversation each tick
    pub conversation_chance: f32,
    pub duration_secs: Range,
    pub cooldown_secs: Range,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            radius: 50.0,
            conversation_chance: 0.01,
            duration_secs: Range::new(5.0, 15.0),
            cooldown_secs: Range::new(10.0, 30.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    pub default_duration_secs: f32,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 30.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub villagers: VillagerConfig,
    pub time: TimeConfig,
    pub interaction: InteractionConfig,
    pub overrides: OverrideConfig,
    /// RNG seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl SimConfig {
    /// Load from a JSON file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// All validation failures, empty when the config is usable.
    pub fn problems(&self) -> Vec<ConfigProblem> {
        let mut problems = Vec::new();

        let world = &self.world;
        if world.tile_size <= 0 {
            problems.push(ConfigProblem::BadTileSize(world.tile_size));
        } else if world.width < world.tile_size || world.height < world.tile_size {
            problems.push(ConfigProblem::VillageTooSmall {
                width: world.width,
                height: world.height,
            });
        }

        let time = &self.time;
        if !(time.day_length_seconds >= MIN_DAY_LENGTH_SECS) {
            problems.push(ConfigProblem::DayTooShort(time.day_length_seconds));
        }
        if !(0.0..=24.0).contains(&time.start_hour) {
            problems.push(ConfigProblem::StartHourOutOfRange(time.start_hour));
        }
        if !(time.time_scale > 0.0) {
            problems.push(ConfigProblem::NonPositiveTimeScale(time.time_scale));
        }

        let interaction = &self.interaction;
        if !(interaction.radius >= 0.0) {
            problems.push(ConfigProblem::NegativeRadius(interaction.radius));
        }
        if !(0.0..=1.0).contains(&interaction.conversation_chance) {
            problems.push(ConfigProblem::ChanceOutOfRange(
                interaction.conversation_chance,
            ));
        }

        problems.extend(
            [
                self.villagers.speed_range.check("villagers.speed_range"),
                interaction.duration_secs.check("interaction.duration_secs"),
                interaction.cooldown_secs.check("interaction.cooldown_secs"),
            ]
            .into_iter()
            .flatten(),
        );

        problems
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
