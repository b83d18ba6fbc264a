//! Limit switch monitor
//!
//! While a GO or GRAB job runs, a limit switch should never assert on the
//! way toward it. The one expected contact is the calibrated end of travel
//! itself: position 0 sits exactly where the minimum switch first asserted
//! during homing, and the measured maximum where the maximum switch did.
//!
//! A switch therefore trips the monitor when it reads asserted while the
//! axis is being driven toward it and is not parked on that calibrated end.
//! Readings are debounced over `limit_debounce_samples` consecutive samples.

use crate::config::SafetyConfig;
use crate::motion::{AxisId, TravelRange};
use crate::traits::Axis;

/// Which switch of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitEdge {
    Min,
    Max,
}

/// Monitor result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// No unexpected contact
    Ok,
    /// A switch asserted unexpectedly
    LimitTripped { axis: AxisId, edge: LimitEdge },
}

/// Limit switch supervisor for both axes
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    enabled: bool,
    debounce_samples: u8,
    /// Travel per axis; `None` while disarmed
    ranges: [Option<TravelRange>; 2],
    /// Consecutive qualifying samples per axis and edge
    counts: [[u8; 2]; 2],
}

impl SafetyMonitor {
    /// Create a disarmed monitor
    pub fn new(config: &SafetyConfig) -> Self {
        Self {
            enabled: config.monitor_limits,
            debounce_samples: config.limit_debounce_samples.max(1),
            ranges: [None; 2],
            counts: [[0; 2]; 2],
        }
    }

    /// Start supervising with the measured travel of both axes
    pub fn arm(&mut self, horizontal: TravelRange, vertical: TravelRange) {
        self.ranges = [Some(horizontal), Some(vertical)];
        self.counts = [[0; 2]; 2];
    }

    /// Stop supervising (calibration lost)
    pub fn disarm(&mut self) {
        self.ranges = [None; 2];
        self.counts = [[0; 2]; 2];
    }

    /// Check if the monitor has ranges to supervise
    pub fn is_armed(&self) -> bool {
        self.ranges.iter().all(Option::is_some)
    }

    /// Sample both axes
    pub fn check<H: Axis, V: Axis>(&mut self, horizontal: &mut H, vertical: &mut V) -> SafetyStatus {
        if !self.enabled {
            return SafetyStatus::Ok;
        }
        if let Some(edge) = self.sample(horizontal, AxisId::Horizontal) {
            return SafetyStatus::LimitTripped {
                axis: AxisId::Horizontal,
                edge,
            };
        }
        if let Some(edge) = self.sample(vertical, AxisId::Vertical) {
            return SafetyStatus::LimitTripped {
                axis: AxisId::Vertical,
                edge,
            };
        }
        SafetyStatus::Ok
    }

    fn sample<A: Axis>(&mut self, axis: &mut A, id: AxisId) -> Option<LimitEdge> {
        let range = self.ranges[id as usize]?;
        let position = axis.current_position();
        let to_go = axis.distance_to_go();

        let min_hit = to_go < 0 && position != 0 && axis.read_limit_min();
        let max_hit = to_go > 0 && position != range.max && axis.read_limit_max();

        let counts = &mut self.counts[id as usize];
        counts[0] = if min_hit { counts[0].saturating_add(1) } else { 0 };
        counts[1] = if max_hit { counts[1].saturating_add(1) } else { 0 };

        if counts[0] >= self.debounce_samples {
            Some(LimitEdge::Min)
        } else if counts[1] >= self.debounce_samples {
            Some(LimitEdge::Max)
        } else {
            None
        }
    }
}
