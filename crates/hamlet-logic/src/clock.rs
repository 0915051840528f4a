//! World clock - 24-hour day cycle with named periods and lighting curves.
//!
//! The clock advances by real elapsed seconds scaled to a configurable day
//! length. Hours are in `[0, 24)` after any advance; `set_time` also accepts
//! exactly 24.0, which wraps on the next advance.
//!
//! ```
//! use hamlet_logic::clock::{DayPeriod, WorldClock};
//!
//! let mut clock = WorldClock::new(6.0, 240.0).unwrap();
//! assert_eq!(clock.period(), DayPeriod::Dawn);
//!
//! // 10 real seconds on a 240 s day is one game hour
//! clock.advance(10.0, 1.0);
//! assert!((clock.current_hour() - 7.0).abs() < 1e-4);
//! assert_eq!(clock.period(), DayPeriod::Morning);
//! ```

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use thiserror::Error;

/// Shortest day length the clock accepts, in seconds.
pub const MIN_DAY_LENGTH_SECS: f32 = 60.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    #[error("hour {0} is outside 0-24")]
    HourOutOfRange(f32),
    #[error("day length {0}s is below the {}s minimum", MIN_DAY_LENGTH_SECS)]
    DayTooShort(f32),
}

/// Named time-of-day period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPeriod {
    Dawn,
    Morning,
    Noon,
    Afternoon,
    Evening,
    Dusk,
    Night,
}

impl DayPeriod {
    pub fn from_hour(hour: f32) -> Self {
        match hour {
            h if !(5.0..21.0).contains(&h) => DayPeriod::Night,
            h if h < 7.0 => DayPeriod::Dawn,
            h if h < 11.0 => DayPeriod::Morning,
            h if h < 13.0 => DayPeriod::Noon,
            h if h < 17.0 => DayPeriod::Afternoon,
            h if h < 19.0 => DayPeriod::Evening,
            _ => DayPeriod::Dusk,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DayPeriod::Dawn => "Dawn",
            DayPeriod::Morning => "Morning",
            DayPeriod::Noon => "Noon",
            DayPeriod::Afternoon => "Afternoon",
            DayPeriod::Evening => "Evening",
            DayPeriod::Dusk => "Dusk",
            DayPeriod::Night => "Night",
        }
    }
}

impl std::fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A period boundary crossed during an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodChange {
    pub previous: DayPeriod,
    pub current: DayPeriod,
}

/// Shared world time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldClock {
    current_hour: f32,
    day_length_seconds: f32,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self {
            current_hour: 6.0,
            day_length_seconds: 300.0,
        }
    }
}

impl WorldClock {
    pub fn new(start_hour: f32, day_length_seconds: f32) -> Result<Self, ClockError> {
        let mut clock = Self::default();
        clock.set_day_length(day_length_seconds)?;
        clock.set_time(start_hour)?;
        Ok(clock)
    }

    pub fn current_hour(&self) -> f32 {
        self.current_hour
    }

    pub fn day_length_seconds(&self) -> f32 {
        self.day_length_seconds
    }

    /// Advance by `dt_seconds` of real time, multiplied by `time_scale`.
    ///
    /// Returns the period change if the advance crossed a period boundary.
    pub fn advance(&mut self, dt_seconds: f32, time_scale: f32) -> Option<PeriodChange> {
        let previous = self.period();
        let seconds_per_hour = self.day_length_seconds / 24.0;
        let hour_change = dt_seconds * time_scale / seconds_per_hour;
        self.current_hour = (self.current_hour + hour_change).rem_euclid(24.0);

        let current = self.period();
        (current != previous).then_some(PeriodChange { previous, current })
    }

    pub fn set_time(&mut self, hour: f32) -> Result<(), ClockError> {
        if !(0.0..=24.0).contains(&hour) {
            return Err(ClockError::HourOutOfRange(hour));
        }
        self.current_hour = hour;
        Ok(())
    }

    pub fn set_day_length(&mut self, seconds: f32) -> Result<(), ClockError> {
        if !seconds.is_finite() || seconds < MIN_DAY_LENGTH_SECS {
            return Err(ClockError::DayTooShort(seconds));
        }
        self.day_length_seconds = seconds;
        Ok(())
    }

    pub fn period(&self) -> DayPeriod {
        DayPeriod::from_hour(self.current_hour)
    }

    /// "H:MM AM (Period)" with a 12-hour display.
    pub fn time_string(&self) -> String {
        let hours = self.current_hour as u32;
        let minutes = ((self.current_hour % 1.0) * 60.0) as u32;
        let am_pm = if hours < 12 { "AM" } else { "PM" };
        let display_hour = match hours % 12 {
            0 => 12,
            h => h,
        };
        format!("{}:{:02} {} ({})", display_hour, minutes, am_pm, self.period())
    }

    /// Light level from 0.0 (dark) to 1.0 (noon).
    ///
    /// Cosine curve over the 5:00-21:00 daylight span; linear ramps at night
    /// from 0.3 at 21:00 down to 0.1 at midnight and back to 0.3 at 5:00.
    pub fn light_level(&self) -> f32 {
        let hour = self.current_hour;
        if (5.0..21.0).contains(&hour) {
            let phase = (hour - 5.0) / 16.0;
            0.5 + 0.5 * (PI * (phase - 0.5)).cos()
        } else if hour < 5.0 {
            0.1 + 0.2 * (hour / 5.0)
        } else {
            0.3 - 0.2 * ((hour - 21.0) / 3.0)
        }
    }

    /// Shadow length multiplier: 2.0 at sunrise, 0.2 at noon, 0.0 at night.
    pub fn shadow_length(&self) -> f32 {
        let hour = self.current_hour;
        if !(5.0..19.0).contains(&hour) {
            0.0
        } else if hour < 12.0 {
            2.0 - 1.8 * ((hour - 5.0) / 7.0)
        } else {
            0.2 + 1.8 * ((hour - 12.0) / 7.0)
        }
    }
}

/// Parse "H" or "H:MM" into fractional hours.
pub fn parse_hour(text: &str) -> Result<f32, ParseHourError> {
    let hour = match text.split_once(':') {
        Some((h, m)) => {
            let hour: f32 = h.trim().parse().map_err(|_| ParseHourError::Invalid(text.into()))?;
            let minute: f32 = m.trim().parse().map_err(|_| ParseHourError::Invalid(text.into()))?;
            if !(0.0..60.0).contains(&minute) {
                return Err(ParseHourError::Minutes(minute));
            }
            hour + minute / 60.0
        }
        None => text
            .trim()
            .parse()
            .map_err(|_| ParseHourError::Invalid(text.into()))?,
    };
    if !(0.0..=24.0).contains(&hour) {
        return Err(ParseHourError::Clock(ClockError::HourOutOfRange(hour)));
    }
    Ok(hour)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseHourError {
    #[error("invalid time format '{0}', use <hour> or <hour:minute>")]
    Invalid(String),
    #[error("minutes must be between 0 and 59, got {0}")]
    Minutes(f32),
    #[error(transparent)]
    Clock(#[from] ClockError),
}
