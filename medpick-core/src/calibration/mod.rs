//! Axis calibration
//!
//! Establishes a trusted origin and measured travel for both axes by
//! driving them into their limit switches.

pub mod homing;

pub use homing::{
    CalibrationFailure, CalibrationState, FailureReason, Homing, HomingStatus,
};
