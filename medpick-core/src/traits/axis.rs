//! Linear axis trait
//!
//! One physical stepper axis: a step scheduler with speed and acceleration
//! limits, an enable line and a pair of limit switches. The controller
//! instantiates it twice (horizontal and vertical) and drives both through
//! this interface only.

/// Trait for a position-controlled stepper axis
///
/// Positions are absolute step counts. Nothing here blocks: motion only
/// happens inside [`Axis::tick`], which the control loop calls as often as
/// it can.
pub trait Axis {
    /// Configure the motion profile
    ///
    /// `max_speed` is in steps/s, `acceleration` in steps/s². Takes effect
    /// for the next scheduled step.
    fn set_limits(&mut self, max_speed: f32, acceleration: f32);

    /// Energise the driver
    fn enable(&mut self);

    /// Hard-stop any motion (no deceleration) and de-energise the driver
    fn disable(&mut self);

    /// Check if the driver is energised
    fn is_enabled(&self) -> bool;

    /// Record a new absolute target
    ///
    /// Motion starts on subsequent ticks.
    fn move_to(&mut self, position: i32);

    /// Advance at most one step toward the target
    ///
    /// Returns whether the axis is still in motion. A disabled axis never
    /// steps.
    fn tick(&mut self, now_us: u64) -> bool;

    /// Request a decelerated stop
    ///
    /// The caller keeps ticking until [`Axis::is_running`] returns false.
    fn stop_and_settle(&mut self);

    /// Overwrite the position reference without moving
    ///
    /// Also clears the target and the current speed.
    fn set_current_position(&mut self, position: i32);

    /// Current absolute position in steps
    fn current_position(&self) -> i32;

    /// Last commanded target in steps
    fn target_position(&self) -> i32;

    /// Signed distance from the current position to the target
    fn distance_to_go(&self) -> i32 {
        self.target_position().saturating_sub(self.current_position())
    }

    /// Whether the axis still has steps to take or speed to shed
    fn is_running(&self) -> bool;

    /// Instantaneous state of the minimum limit switch
    fn read_limit_min(&mut self) -> bool;

    /// Instantaneous state of the maximum limit switch
    fn read_limit_max(&mut self) -> bool;
}
