//! Systems - per-tick logic and bulk operations over villager entities

mod agent;
mod destination;
mod interaction;
mod repair;

pub use agent::*;
pub use destination::*;
pub use interaction::*;
pub use repair::*;
