//! Configuration type definitions
//!
//! Motion, homing, safety and grid parameters. Defaults match the
//! values the gantry was commissioned with; the firmware overrides them
//! from `machine.toml` at boot.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::{Position, DEFAULT_ACCELERATION, DEFAULT_MAX_SPEED};

/// Number of grid rows
pub const ROW_COUNT: usize = 3;

/// Number of grid columns
pub const COLUMN_COUNT: usize = 8;

/// Default row positions (vertical axis)
pub const DEFAULT_ROWS: [i32; ROW_COUNT] = [10, 20, 30];

/// Default column positions (horizontal axis)
pub const DEFAULT_COLUMNS: [i32; COLUMN_COUNT] = [10, 20, 30, 40, 50, 60, 70, 80];

/// Default drop-off position
pub const DEFAULT_DROP_OFF: Position = Position::new(1000, 5000);

/// Maximum distance a single homing leg may command, in steps
pub const DEFAULT_HOMING_DISTANCE: i32 = 100_000;

/// Default time budget for one homing leg
pub const DEFAULT_HOMING_TIMEOUT_MS: u32 = 120_000;

/// Per-axis motion profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisConfig {
    /// Maximum speed for GO / GRAB moves in steps/s
    pub max_speed: f32,
    /// Acceleration for GO / GRAB moves in steps/s²
    pub acceleration: f32,
    /// Maximum speed while homing in steps/s
    pub homing_speed: f32,
    /// Acceleration while homing in steps/s²
    pub homing_acceleration: f32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            homing_speed: DEFAULT_MAX_SPEED,
            homing_acceleration: DEFAULT_ACCELERATION,
        }
    }
}

/// Where both axes rest after a successful calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReturnPolicy {
    /// Return to the origin established by the minimum switch
    #[default]
    Zero,
    /// Return to the centre of the measured travel
    Midpoint,
}

/// Homing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Steps commanded per homing leg; reaching it without the switch
    /// asserting fails calibration
    pub homing_distance: i32,
    /// Time budget per homing leg
    pub homing_timeout_ms: u32,
    /// Resting position after calibration
    pub return_policy: ReturnPolicy,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            homing_distance: DEFAULT_HOMING_DISTANCE,
            homing_timeout_ms: DEFAULT_HOMING_TIMEOUT_MS,
            return_policy: ReturnPolicy::Zero,
        }
    }
}

/// Limit switch supervision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyConfig {
    /// Consecutive asserted samples before a trip outside homing counts;
    /// 1 reacts to the raw read
    pub limit_debounce_samples: u8,
    /// Watch limit switches during GO / GRAB motion
    pub monitor_limits: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            limit_debounce_samples: 1,
            monitor_limits: true,
        }
    }
}

/// Compiled-in grid table values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridConfig {
    /// Vertical position of rows 1..=3
    pub rows: [i32; ROW_COUNT],
    /// Horizontal position of columns 1..=8
    pub columns: [i32; COLUMN_COUNT],
    /// Drop-off position visited after every grab
    pub drop_off: Position,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            drop_off: DEFAULT_DROP_OFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let axis = AxisConfig::default();
        assert_eq!(axis.max_speed, 1000.0);
        assert_eq!(axis.acceleration, 500.0);

        let cal = CalibrationConfig::default();
        assert_eq!(cal.homing_distance, 100_000);
        assert_eq!(cal.homing_timeout_ms, 120_000);
        assert_eq!(cal.return_policy, ReturnPolicy::Zero);

        assert_eq!(SafetyConfig::default().limit_debounce_samples, 1);
    }

    #[test]
    fn test_grid_defaults() {
        let grid = GridConfig::default();
        assert_eq!(grid.rows, [10, 20, 30]);
        assert_eq!(grid.columns[0], 10);
        assert_eq!(grid.columns[7], 80);
        assert_eq!(grid.drop_off, Position::new(1000, 5000));
    }
}
