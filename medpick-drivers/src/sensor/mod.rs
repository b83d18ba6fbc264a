//! Sensor implementations

pub mod limit_switch;

pub use limit_switch::LimitSwitch;
