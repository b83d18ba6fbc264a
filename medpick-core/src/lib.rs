//! Board-agnostic core logic for the medication picker firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Axis abstraction trait
//! - Step scheduling (trapezoidal acceleration)
//! - Limit-switch calibration
//! - Slot grid and GRAB sequencing
//! - Dispatcher state machine and command handling
//! - Limit switch supervision
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod logging;

pub mod calibration;
pub mod config;
pub mod controller;
pub mod grid;
pub mod motion;
pub mod safety;
pub mod sequencer;
pub mod state;
pub mod traits;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use controller::{Controller, OUTBOX_LEN};
