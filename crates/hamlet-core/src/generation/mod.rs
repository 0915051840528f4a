//! Generation - procedural creation of the village and its population

mod names;
mod village;
mod villagers;

pub use names::*;
pub use village::*;
pub use villagers::*;
