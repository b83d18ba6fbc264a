//! Grab/drop-off sequencing
//!
//! Turns a GRAB batch into a series of moves: slot, drop-off, next slot.

pub mod batch;

pub use batch::{BatchEvent, BatchPhase, GrabBatch};
