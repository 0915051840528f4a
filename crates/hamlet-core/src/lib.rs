//! Hamlet Core - Village Simulation Engine
//!
//! An ECS-based simulation of a small village whose residents keep homes,
//! jobs, sleep cycles and the occasional chat with a neighbour.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Villagers
//! - **Components**: Pure data attached to entities (Position, SleepCycle, Home, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! The village layout, clock and conversation bookkeeping live beside the
//! world in [`engine::SimulationEngine`]. Housing rules and the clock itself
//! come from `hamlet-logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use hamlet_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default().with_seed(7));
//!
//! // Generate a village, house everyone and put them to bed
//! engine.generate();
//!
//! // Run simulation
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod commands;
pub mod components;
pub mod engine;
pub mod events;
pub mod generation;
pub mod persistence;
pub mod systems;
pub mod village;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::commands::{Command, CommandOutput};
    pub use crate::components::*;
    pub use crate::engine::SimulationEngine;
    pub use crate::events::{EventSink, NullSink, SimEvent};
    pub use crate::systems::Target;
    pub use hamlet_logic::config::SimConfig;
}
