//! Slot grid
//!
//! Maps dispenser slots onto row/column positions.

pub mod table;

pub use table::{GridError, GridTable, Slot, SLOT_COUNT};
