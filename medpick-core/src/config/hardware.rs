//! Hardware configuration types
//!
//! Driver polarity and timing plus the top-level [`MachineConfig`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::{AxisConfig, CalibrationConfig, GridConfig, SafetyConfig};
use crate::motion::AxisId;

/// Step driver signalling for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverHwConfig {
    /// Enable input is active-low
    pub enable_inverted: bool,
    /// Swap the meaning of the direction line
    pub dir_inverted: bool,
    /// Step pulse high time in microseconds
    pub step_pulse_us: u32,
    /// Limit switches read low when triggered
    pub limit_active_low: bool,
}

impl Default for DriverHwConfig {
    fn default() -> Self {
        Self {
            enable_inverted: true,
            dir_inverted: false,
            step_pulse_us: 2,
            limit_active_low: true,
        }
    }
}

/// Host serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SerialHwConfig {
    /// UART baud rate
    pub baud_rate: u32,
}

impl Default for SerialHwConfig {
    fn default() -> Self {
        Self { baud_rate: 115_200 }
    }
}

/// Configuration errors reported by [`MachineConfig::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Speed not positive and finite
    InvalidSpeed(AxisId),
    /// Acceleration not positive and finite
    InvalidAcceleration(AxisId),
    /// Homing distance not positive
    InvalidHomingDistance,
    /// Homing timeout is zero
    InvalidHomingTimeout,
    /// Debounce sample count is zero
    InvalidDebounce,
    /// Baud rate is zero
    InvalidBaudRate,
}

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineConfig {
    /// Horizontal (column) axis profile
    pub horizontal: AxisConfig,
    /// Vertical (row) axis profile
    pub vertical: AxisConfig,
    /// Horizontal driver signalling
    pub horizontal_driver: DriverHwConfig,
    /// Vertical driver signalling
    pub vertical_driver: DriverHwConfig,
    /// Homing parameters
    pub calibration: CalibrationConfig,
    /// Limit switch supervision
    pub safety: SafetyConfig,
    /// Compiled-in grid values
    pub grid: GridConfig,
    /// Host link
    pub serial: SerialHwConfig,
    /// Reject commands until the host sends `HANDSHAKE`
    pub require_handshake: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            horizontal: AxisConfig::default(),
            vertical: AxisConfig::default(),
            horizontal_driver: DriverHwConfig::default(),
            vertical_driver: DriverHwConfig::default(),
            calibration: CalibrationConfig::default(),
            safety: SafetyConfig::default(),
            grid: GridConfig::default(),
            serial: SerialHwConfig::default(),
            require_handshake: true,
        }
    }
}

impl MachineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Motion profile for one axis
    pub fn axis(&self, id: AxisId) -> &AxisConfig {
        match id {
            AxisId::Horizontal => &self.horizontal,
            AxisId::Vertical => &self.vertical,
        }
    }

    /// Mutable motion profile for one axis
    pub fn axis_mut(&mut self, id: AxisId) -> &mut AxisConfig {
        match id {
            AxisId::Horizontal => &mut self.horizontal,
            AxisId::Vertical => &mut self.vertical,
        }
    }

    /// Driver signalling for one axis
    pub fn driver(&self, id: AxisId) -> &DriverHwConfig {
        match id {
            AxisId::Horizontal => &self.horizontal_driver,
            AxisId::Vertical => &self.vertical_driver,
        }
    }

    /// Mutable driver signalling for one axis
    pub fn driver_mut(&mut self, id: AxisId) -> &mut DriverHwConfig {
        match id {
            AxisId::Horizontal => &mut self.horizontal_driver,
            AxisId::Vertical => &mut self.vertical_driver,
        }
    }

    /// Check the configuration for values the controller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for id in AxisId::ALL {
            let axis = self.axis(id);
            if !is_positive(axis.max_speed) || !is_positive(axis.homing_speed) {
                return Err(ConfigError::InvalidSpeed(id));
            }
            if !is_positive(axis.acceleration) || !is_positive(axis.homing_acceleration) {
                return Err(ConfigError::InvalidAcceleration(id));
            }
        }

        if self.calibration.homing_distance <= 0 {
            return Err(ConfigError::InvalidHomingDistance);
        }
        if self.calibration.homing_timeout_ms == 0 {
            return Err(ConfigError::InvalidHomingTimeout);
        }
        if self.safety.limit_debounce_samples == 0 {
            return Err(ConfigError::InvalidDebounce);
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate);
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}
