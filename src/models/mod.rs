//! Core data models for the clan tracker.

mod ids;
mod match_result;
mod performance;
mod player;
mod scheduled_match;
mod stats;
mod validation;
mod window;

pub use ids::*;
pub use match_result::*;
pub use performance::*;
pub use player::*;
pub use scheduled_match::*;
pub use stats::*;
pub use validation::ValidationError;
pub use window::*;
