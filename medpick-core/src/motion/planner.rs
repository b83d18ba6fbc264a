//! Step scheduler for constant-acceleration moves
//!
//! Decides *when* the next step pulse is due so that an axis ramps up to
//! its maximum speed, cruises, and ramps down to land exactly on the target.
//! Step intervals follow David Austin's "Generate stepper-motor speed
//! profiles in real time" recurrence, the same one used by AccelStepper, so
//! motion profiles match the classic Arduino implementation:
//!
//! - first interval `c0 = 0.676 * sqrt(2 / a) * 1e6` µs
//! - subsequent intervals `cn = cn - 2cn / (4n + 1)`, clamped to
//!   `1e6 / max_speed`
//! - deceleration starts once the steps needed to stop reach the steps left
//!
//! The scheduler only does the bookkeeping; the owner turns each returned
//! [`Direction`] into a physical pulse.

use libm::sqrtf;

/// Default maximum speed in steps/s
pub const DEFAULT_MAX_SPEED: f32 = 1000.0;

/// Default acceleration in steps/s²
pub const DEFAULT_ACCELERATION: f32 = 500.0;

/// Direction of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward increasing positions
    Positive,
    /// Toward decreasing positions
    Negative,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }

    /// Position delta of one step in this direction
    pub fn delta(self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// Constant-acceleration step scheduler
#[derive(Debug, Clone)]
pub struct StepPlanner {
    current_pos: i32,
    target_pos: i32,
    /// Signed speed in steps/s (negative when moving toward lower positions)
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    /// Interval until the next step in µs, 0 when no step is scheduled
    step_interval_us: u32,
    last_step_us: u64,
    /// Step counter within the ramp; negative while decelerating
    n: i32,
    /// Initial step interval in µs
    c0: f32,
    /// Last computed step interval in µs
    cn: f32,
    /// Minimum step interval (at max speed) in µs
    cmin: f32,
    direction: Direction,
}

impl Default for StepPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPEED, DEFAULT_ACCELERATION)
    }
}

impl StepPlanner {
    /// Create a scheduler at position 0 with the given limits
    ///
    /// Non-positive limits fall back to the defaults.
    pub fn new(max_speed: f32, acceleration: f32) -> Self {
        let max_speed = positive_or(max_speed, DEFAULT_MAX_SPEED);
        let acceleration = positive_or(acceleration, DEFAULT_ACCELERATION);
        Self {
            current_pos: 0,
            target_pos: 0,
            speed: 0.0,
            max_speed,
            acceleration,
            step_interval_us: 0,
            last_step_us: 0,
            n: 0,
            c0: initial_interval(acceleration),
            cn: 0.0,
            cmin: 1_000_000.0 / max_speed,
            direction: Direction::Negative,
        }
    }

    /// Current absolute position in steps
    pub fn current_position(&self) -> i32 {
        self.current_pos
    }

    /// Target position in steps
    pub fn target_position(&self) -> i32 {
        self.target_pos
    }

    /// Signed steps remaining to the target
    pub fn distance_to_go(&self) -> i32 {
        self.target_pos.saturating_sub(self.current_pos)
    }

    /// Current signed speed in steps/s
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Configured maximum speed in steps/s
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Configured acceleration in steps/s²
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Interval until the next step in µs (0 when idle)
    pub fn step_interval_us(&self) -> u32 {
        self.step_interval_us
    }

    /// Whether there is still speed to shed or distance to cover
    pub fn is_running(&self) -> bool {
        !(self.speed == 0.0 && self.target_pos == self.current_pos)
    }

    /// Set the maximum speed in steps/s
    pub fn set_max_speed(&mut self, max_speed: f32) {
        let max_speed = positive_or(max_speed, self.max_speed);
        if max_speed == self.max_speed {
            return;
        }
        self.max_speed = max_speed;
        self.cmin = 1_000_000.0 / max_speed;

        // Mid-ramp: restart from the step count matching the current speed
        if self.n > 0 {
            self.n = self.steps_to_stop();
            self.compute_new_speed();
        }
    }

    /// Set the acceleration in steps/s²
    pub fn set_acceleration(&mut self, acceleration: f32) {
        let acceleration = positive_or(acceleration, self.acceleration);
        if acceleration == self.acceleration {
            return;
        }
        // Keep the current speed: n scales inversely with acceleration
        self.n = (self.n as f32 * (self.acceleration / acceleration)) as i32;
        self.c0 = initial_interval(acceleration);
        self.acceleration = acceleration;
        self.compute_new_speed();
    }

    /// Set a new absolute target
    pub fn move_to(&mut self, position: i32) {
        if self.target_pos != position {
            self.target_pos = position;
            self.compute_new_speed();
        }
    }

    /// Set the target relative to the current position
    pub fn move_by(&mut self, delta: i32) {
        self.move_to(self.current_pos.saturating_add(delta));
    }

    /// Decelerate to a stop as quickly as the acceleration allows
    ///
    /// Retargets to the closest position reachable under the current
    /// deceleration; keep polling until [`StepPlanner::is_running`] is false.
    pub fn stop(&mut self) {
        if self.speed != 0.0 {
            let steps = self.steps_to_stop().saturating_add(1);
            if self.speed > 0.0 {
                self.move_by(steps);
            } else {
                self.move_by(-steps);
            }
        }
    }

    /// Stop immediately, discarding speed and the pending target
    pub fn hard_stop(&mut self) {
        self.target_pos = self.current_pos;
        self.reset_ramp();
    }

    /// Overwrite the position reference without moving
    ///
    /// Clears target and speed as well.
    pub fn set_current_position(&mut self, position: i32) {
        self.current_pos = position;
        self.target_pos = position;
        self.reset_ramp();
    }

    /// Poll the scheduler
    ///
    /// Returns the direction of a step when one is due at `now_us`. The
    /// position has already been updated when this returns `Some`; the
    /// caller must emit exactly one pulse for it.
    pub fn poll(&mut self, now_us: u64) -> Option<Direction> {
        if self.step_interval_us == 0 {
            return None;
        }

        if now_us.saturating_sub(self.last_step_us) < self.step_interval_us as u64 {
            return None;
        }

        let direction = self.direction;
        self.current_pos = self.current_pos.saturating_add(direction.delta());
        self.last_step_us = now_us;
        self.compute_new_speed();
        Some(direction)
    }

    fn reset_ramp(&mut self) {
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    fn steps_to_stop(&self) -> i32 {
        ((self.speed * self.speed) / (2.0 * self.acceleration)) as i32
    }

    /// Recompute the next step interval after a step or a target change
    fn compute_new_speed(&mut self) {
        let distance_to = self.distance_to_go();
        let steps_to_stop = self.steps_to_stop();

        if distance_to == 0 && steps_to_stop <= 1 {
            // At the target and slow enough to stop dead
            self.reset_ramp();
            return;
        }

        if distance_to > 0 {
            if self.n > 0 {
                // Accelerating or cruising: start decelerating when the stop
                // distance catches up, or when heading the wrong way
                if steps_to_stop >= distance_to || self.direction == Direction::Negative {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < distance_to && self.direction == Direction::Positive
            {
                // Decelerating but there is room again: accelerate
                self.n = -self.n;
            }
        } else if distance_to < 0 {
            let distance_back = distance_to.saturating_neg();
            if self.n > 0 {
                if steps_to_stop >= distance_back || self.direction == Direction::Positive {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < distance_back && self.direction == Direction::Negative
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            // First step from standstill
            self.cn = self.c0;
            self.direction = if distance_to > 0 {
                Direction::Positive
            } else {
                Direction::Negative
            };
        } else {
            self.cn -= (2.0 * self.cn) / ((4.0 * self.n as f32) + 1.0);
            if self.cn < self.cmin {
                self.cn = self.cmin;
            }
        }

        self.n = self.n.saturating_add(1);
        self.step_interval_us = (self.cn as u32).max(1);
        self.speed = 1_000_000.0 / self.cn;
        if self.direction == Direction::Negative {
            self.speed = -self.speed;
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    let value = if value < 0.0 { -value } else { value };
    if value > 0.0 && value.is_finite() {
        value
    } else {
        fallback
    }
}

fn initial_interval(acceleration: f32) -> f32 {
    0.676 * sqrtf(2.0 / acceleration) * 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Poll every `dt_us` until the planner stops, returning elapsed time
    fn run(planner: &mut StepPlanner, start_us: u64, dt_us: u64, max_iter: u32) -> u64 {
        let mut now = start_us;
        for _ in 0..max_iter {
            planner.poll(now);
            if !planner.is_running() {
                return now;
            }
            now += dt_us;
        }
        panic!("planner did not settle");
    }

    #[test]
    fn test_initial_state() {
        let planner = StepPlanner::default();
        assert_eq!(planner.current_position(), 0);
        assert_eq!(planner.distance_to_go(), 0);
        assert!(!planner.is_running());
        assert_eq!(planner.step_interval_us(), 0);
    }

    #[test]
    fn test_first_interval_matches_c0() {
        let mut planner = StepPlanner::new(1000.0, 500.0);
        planner.move_to(100);
        // 0.676 * sqrt(2 / 500) * 1e6 ≈ 42755 µs
        let interval = planner.step_interval_us();
        assert!((42_700..=42_800).contains(&interval), "interval {}", interval);
        assert!(planner.is_running());
    }

    #[test]
    fn test_reaches_target_forward() {
        let mut planner = StepPlanner::new(2000.0, 20_000.0);
        planner.move_to(500);
        run(&mut planner, 0, 10, 1_000_000);
        assert_eq!(planner.current_position(), 500);
        assert_eq!(planner.speed(), 0.0);
    }

    #[test]
    fn test_reaches_target_backward() {
        let mut planner = StepPlanner::new(2000.0, 20_000.0);
        planner.set_current_position(300);
        planner.move_to(-200);
        run(&mut planner, 0, 10, 1_000_000);
        assert_eq!(planner.current_position(), -200);
    }

    #[test]
    fn test_speed_never_exceeds_max() {
        let mut planner = StepPlanner::new(1000.0, 50_000.0);
        planner.move_to(2000);
        let mut now = 0;
        while planner.is_running() {
            planner.poll(now);
            assert!(planner.speed().abs() <= 1000.0 + 0.5);
            now += 20;
        }
        assert_eq!(planner.current_position(), 2000);
    }

    #[test]
    fn test_one_step_per_poll() {
        let mut planner = StepPlanner::new(1000.0, 500.0);
        planner.move_to(10);
        // Long gap between polls still yields a single step
        assert_eq!(planner.poll(10_000_000), Some(Direction::Positive));
        assert_eq!(planner.current_position(), 1);
        assert_eq!(planner.poll(10_000_000), None);
    }

    #[test]
    fn test_stop_decelerates_short_of_target() {
        let mut planner = StepPlanner::new(1000.0, 2000.0);
        planner.move_to(100_000);
        let mut now = 0;
        while planner.speed() < 900.0 {
            planner.poll(now);
            now += 10;
        }
        let at_stop = planner.current_position();
        planner.stop();
        // v²/2a = 1000²/4000 ≈ 250 steps at most
        assert!(planner.target_position() - at_stop <= 252);
        run(&mut planner, now, 10, 10_000_000);
        assert!(planner.current_position() < 100_000);
        assert_eq!(planner.current_position(), planner.target_position());
    }

    #[test]
    fn test_hard_stop_is_immediate() {
        let mut planner = StepPlanner::new(1000.0, 500.0);
        planner.move_to(1000);
        planner.poll(0);
        planner.hard_stop();
        assert!(!planner.is_running());
        assert_eq!(planner.target_position(), planner.current_position());
        assert_eq!(planner.poll(1_000_000), None);
    }

    #[test]
    fn test_set_current_position_clears_motion() {
        let mut planner = StepPlanner::new(1000.0, 500.0);
        planner.move_to(-5000);
        planner.poll(0);
        planner.set_current_position(0);
        assert_eq!(planner.current_position(), 0);
        assert_eq!(planner.target_position(), 0);
        assert_eq!(planner.speed(), 0.0);
        assert!(!planner.is_running());
    }

    #[test]
    fn test_reverse_mid_move() {
        let mut planner = StepPlanner::new(2000.0, 20_000.0);
        planner.move_to(1000);
        let mut now = 0;
        while planner.current_position() < 200 {
            planner.poll(now);
            now += 10;
        }
        planner.move_to(-100);
        run(&mut planner, now, 10, 10_000_000);
        assert_eq!(planner.current_position(), -100);
    }

    #[test]
    fn test_invalid_limits_fall_back() {
        let planner = StepPlanner::new(0.0, -5.0);
        assert_eq!(planner.max_speed(), DEFAULT_MAX_SPEED);
        assert_eq!(planner.acceleration(), 5.0);
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Positive.opposite(), Direction::Negative);
        assert_eq!(Direction::Negative.delta(), -1);
    }
}
