//! Motion planning
//!
//! Step scheduling for constant-acceleration moves and the position types
//! shared across the controller.

pub mod planner;
pub mod position;

pub use planner::{Direction, StepPlanner, DEFAULT_ACCELERATION, DEFAULT_MAX_SPEED};
pub use position::{AxisId, Position, TravelRange};
