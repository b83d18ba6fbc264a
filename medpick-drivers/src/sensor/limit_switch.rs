//! Limit switch input
//!
//! Mechanical end stops are usually wired normally-open to ground with a
//! pull-up, so they read low when pressed. Optical end stops vary.

use embedded_hal::digital::InputPin;

/// A limit switch on a GPIO input
pub struct LimitSwitch<P> {
    pin: P,
    /// If true, asserted = pin LOW
    active_low: bool,
}

impl<P: InputPin> LimitSwitch<P> {
    /// Create a new limit switch
    ///
    /// # Arguments
    /// - `pin`: Input pin the switch is wired to
    /// - `active_low`: If true, the switch reads LOW when pressed
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    /// Read the switch
    ///
    /// A failed read reports the switch as asserted so motion stops.
    pub fn is_asserted(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(_) => true,
        }
    }
}
