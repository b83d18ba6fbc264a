//! Position types shared by calibration, the grid and the controller

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisId {
    /// Column travel
    Horizontal,
    /// Row travel
    Vertical,
}

impl AxisId {
    /// Both axes in reporting order
    pub const ALL: [AxisId; 2] = [AxisId::Horizontal, AxisId::Vertical];

    /// Name used in protocol error lines
    pub const fn name(self) -> &'static str {
        match self {
            AxisId::Horizontal => "HORIZONTAL",
            AxisId::Vertical => "VERTICAL",
        }
    }
}

/// An absolute target for both axes, in steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub horizontal: i32,
    pub vertical: i32,
}

impl Position {
    /// Create a new position
    pub const fn new(horizontal: i32, vertical: i32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Component for one axis
    pub fn get(&self, axis: AxisId) -> i32 {
        match axis {
            AxisId::Horizontal => self.horizontal,
            AxisId::Vertical => self.vertical,
        }
    }

    /// Overwrite the component for one axis
    pub fn set(&mut self, axis: AxisId, value: i32) {
        match axis {
            AxisId::Horizontal => self.horizontal = value,
            AxisId::Vertical => self.vertical = value,
        }
    }
}

/// Measured travel of a homed axis: `[0, max]` in steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TravelRange {
    /// Position at which the maximum limit switch asserted
    pub max: i32,
}

impl TravelRange {
    /// Create a range from the measured maximum
    pub const fn new(max: i32) -> Self {
        Self { max }
    }

    /// Check if a position is within the measured travel
    pub fn contains(&self, position: i32) -> bool {
        position >= 0 && position <= self.max
    }

    /// Clamp a position to the measured travel
    pub fn clamp(&self, position: i32) -> i32 {
        position.clamp(0, self.max.max(0))
    }

    /// Centre of travel
    pub fn midpoint(&self) -> i32 {
        self.max / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_names() {
        assert_eq!(AxisId::Horizontal.name(), "HORIZONTAL");
        assert_eq!(AxisId::Vertical.name(), "VERTICAL");
        assert_eq!(AxisId::ALL.len(), 2);
    }

    #[test]
    fn test_position_accessors() {
        let mut pos = Position::new(10, 20);
        assert_eq!(pos.get(AxisId::Horizontal), 10);
        assert_eq!(pos.get(AxisId::Vertical), 20);

        pos.set(AxisId::Vertical, -5);
        assert_eq!(pos, Position::new(10, -5));
    }

    #[test]
    fn test_travel_range() {
        let range = TravelRange::new(4000);
        assert!(range.contains(0));
        assert!(range.contains(4000));
        assert!(!range.contains(-1));
        assert!(!range.contains(4001));
        assert_eq!(range.clamp(-50), 0);
        assert_eq!(range.clamp(9000), 4000);
        assert_eq!(range.midpoint(), 2000);
    }

    #[test]
    fn test_degenerate_range_clamps_to_zero() {
        let range = TravelRange::new(-10);
        assert_eq!(range.clamp(5), 0);
    }
}
