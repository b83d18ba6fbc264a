//! Dispatcher state machine
//!
//! Defines which commands the controller accepts at any moment.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::State;
