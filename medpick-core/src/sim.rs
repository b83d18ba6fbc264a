//! Simulated axis for host-side tests and tooling
//!
//! [`SimAxis`] runs the real [`StepPlanner`] against a virtual carriage.
//! The carriage has a physical position independent of the logical step
//! counter, so homing can be exercised from an arbitrary starting point.
//! Limit switches assert whenever the carriage is at or beyond their
//! physical location.

use heapless::Vec;

use crate::motion::StepPlanner;
use crate::traits::Axis;

/// Number of `move_to` targets remembered for inspection
pub const TARGET_LOG_LEN: usize = 64;

/// Simulated stepper axis
#[derive(Debug, Clone)]
pub struct SimAxis {
    planner: StepPlanner,
    enabled: bool,
    physical: i64,
    limit_min_at: i64,
    limit_max_at: i64,
    forced_min: Option<bool>,
    forced_max: Option<bool>,
    steps: u32,
    targets: Vec<i32, TARGET_LOG_LEN>,
}

impl SimAxis {
    /// Create an axis whose carriage starts at `start` with switches at
    /// `limit_min_at` and `limit_max_at` (physical coordinates)
    pub fn new(start: i64, limit_min_at: i64, limit_max_at: i64) -> Self {
        Self {
            planner: StepPlanner::default(),
            enabled: true,
            physical: start,
            limit_min_at,
            limit_max_at,
            forced_min: None,
            forced_max: None,
            steps: 0,
            targets: Vec::new(),
        }
    }

    /// Physical carriage position
    pub fn physical_position(&self) -> i64 {
        self.physical
    }

    /// Move the carriage without stepping (as if pushed by hand)
    pub fn displace(&mut self, physical: i64) {
        self.physical = physical;
    }

    /// Remove the maximum switch so it never asserts
    pub fn disconnect_limit_max(&mut self) {
        self.limit_max_at = i64::MAX;
    }

    /// Remove the minimum switch so it never asserts
    pub fn disconnect_limit_min(&mut self) {
        self.limit_min_at = i64::MIN;
    }

    /// Override the minimum switch reading (`None` restores physics)
    pub fn force_limit_min(&mut self, state: Option<bool>) {
        self.forced_min = state;
    }

    /// Override the maximum switch reading (`None` restores physics)
    pub fn force_limit_max(&mut self, state: Option<bool>) {
        self.forced_max = state;
    }

    /// Total steps taken since creation
    pub fn steps_taken(&self) -> u32 {
        self.steps
    }

    /// Targets passed to `move_to` since the last [`SimAxis::clear_targets`]
    pub fn targets(&self) -> &[i32] {
        &self.targets
    }

    /// Forget recorded targets
    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    /// Access the underlying scheduler
    pub fn planner(&self) -> &StepPlanner {
        &self.planner
    }
}

impl Axis for SimAxis {
    fn set_limits(&mut self, max_speed: f32, acceleration: f32) {
        self.planner.set_max_speed(max_speed);
        self.planner.set_acceleration(acceleration);
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.planner.hard_stop();
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn move_to(&mut self, position: i32) {
        let _ = self.targets.push(position);
        self.planner.move_to(position);
    }

    fn tick(&mut self, now_us: u64) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(direction) = self.planner.poll(now_us) {
            self.physical += direction.delta() as i64;
            self.steps = self.steps.saturating_add(1);
        }
        self.planner.is_running()
    }

    fn stop_and_settle(&mut self) {
        self.planner.stop();
    }

    fn set_current_position(&mut self, position: i32) {
        self.planner.set_current_position(position);
    }

    fn current_position(&self) -> i32 {
        self.planner.current_position()
    }

    fn target_position(&self) -> i32 {
        self.planner.target_position()
    }

    fn is_running(&self) -> bool {
        self.planner.is_running()
    }

    fn read_limit_min(&mut self) -> bool {
        self.forced_min.unwrap_or(self.physical <= self.limit_min_at)
    }

    fn read_limit_max(&mut self) -> bool {
        self.forced_max.unwrap_or(self.physical >= self.limit_max_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_physical_carriage() {
        let mut axis = SimAxis::new(500, 0, 2000);
        axis.set_limits(5000.0, 50_000.0);
        axis.move_to(100);

        let mut now = 0;
        while axis.tick(now) {
            now += 10;
        }
        assert_eq!(axis.current_position(), 100);
        assert_eq!(axis.physical_position(), 600);
        assert_eq!(axis.steps_taken(), 100);
        assert_eq!(axis.targets(), &[100]);
    }

    #[test]
    fn test_limits_follow_carriage() {
        let mut axis = SimAxis::new(0, 0, 10);
        assert!(axis.read_limit_min());
        assert!(!axis.read_limit_max());

        axis.displace(10);
        assert!(!axis.read_limit_min());
        assert!(axis.read_limit_max());

        axis.force_limit_max(Some(false));
        assert!(!axis.read_limit_max());
    }

    #[test]
    fn test_disabled_axis_does_not_step() {
        let mut axis = SimAxis::new(0, -100, 100);
        axis.move_to(50);
        axis.disable();
        assert!(!axis.tick(10_000_000));
        assert_eq!(axis.steps_taken(), 0);
        assert_eq!(axis.distance_to_go(), 0);
    }
}
