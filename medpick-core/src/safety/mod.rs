//! Safety monitoring
//!
//! Detects limit switch trips outside homing.

pub mod monitor;

pub use monitor::{LimitEdge, SafetyMonitor, SafetyStatus};
