//! Simulation events and the sink they are emitted into.
//!
//! The engine owns a sink chosen by whoever constructs it. Events are
//! emitted at every documented transition whether or not anything listens;
//! the default [`NullSink`] drops them.

use hamlet_logic::building::BuildingId;
use hamlet_logic::clock::DayPeriod;
use hamlet_logic::geometry::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Only emitted for moves longer than one pixel in a tick
    VillagerMoved {
        name: String,
        from: Vec2,
        to: Vec2,
    },
    ActivityChanged {
        name: String,
        from: String,
        to: String,
    },
    SleepChanged {
        name: String,
        is_sleeping: bool,
    },
    VillagerSelected {
        name: String,
    },
    InteractionStarted {
        first: String,
        second: String,
    },
    InteractionEnded {
        first: String,
        second: String,
    },
    Discussion {
        participants: Vec<String>,
        position: Vec2,
        topic: String,
    },
    BuildingEntered {
        name: String,
        building_id: BuildingId,
    },
    BuildingExited {
        name: String,
        building_id: BuildingId,
    },
    HousingAssigned {
        name: String,
        home: BuildingId,
        workplace: Option<BuildingId>,
    },
    TimeChanged {
        hour: f32,
    },
    PeriodChanged {
        previous: DayPeriod,
        current: DayPeriod,
    },
}

/// Receiver of simulation events
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: SimEvent) {}
}

/// In-memory recorder, mostly for tests and the harness
impl EventSink for Vec<SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: SimEvent) {
        (**self).emit(event);
    }
}
