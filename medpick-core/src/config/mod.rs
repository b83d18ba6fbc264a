//! Configuration types
//!
//! Board-agnostic configuration structures, filled from `machine.toml`
//! by the firmware.

pub mod hardware;
pub mod types;

pub use hardware::*;
pub use types::*;
