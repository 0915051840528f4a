//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to villager entities.
//! Every villager carries the full set, with explicit "unassigned" values
//! where data is missing, so systems never query for optional components.

mod common;
mod villager;

pub use common::*;
pub use villager::*;
