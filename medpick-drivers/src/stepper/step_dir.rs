//! Step/dir stepper axis
//!
//! Drives any step/dir/enable stepper driver from GPIO, with one limit
//! switch at each end of travel. Step timing comes from the core
//! [`StepPlanner`]; the pulse itself is a short busy-wait on the delay
//! provider.
//!
//! # Pin usage
//!
//! - STEP: one rising edge per microstep, held high for `step_pulse_us`
//! - DIR: high for positive travel unless `dir_inverted`
//! - EN: driver energised when low unless `enable_inverted` is false

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use medpick_core::config::DriverHwConfig;
use medpick_core::motion::{Direction, StepPlanner};
use medpick_core::traits::Axis;

use crate::sensor::LimitSwitch;

/// Stepper axis on GPIO pins
pub struct StepperAxis<STEP, DIR, EN, D, MIN, MAX> {
    step: STEP,
    dir: DIR,
    enable: EN,
    delay: D,
    limit_min: LimitSwitch<MIN>,
    limit_max: LimitSwitch<MAX>,
    planner: StepPlanner,
    config: DriverHwConfig,
    enabled: bool,
    /// Direction currently latched on the DIR pin
    direction: Option<Direction>,
    /// Pin writes that returned an error
    pin_faults: u32,
}

impl<STEP, DIR, EN, D, MIN, MAX> StepperAxis<STEP, DIR, EN, D, MIN, MAX>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    D: DelayNs,
    MIN: InputPin,
    MAX: InputPin,
{
    /// Create a new axis, initially disabled
    pub fn new(
        step: STEP,
        dir: DIR,
        enable: EN,
        delay: D,
        limit_min: MIN,
        limit_max: MAX,
        config: DriverHwConfig,
    ) -> Self {
        let mut axis = Self {
            step,
            dir,
            enable,
            delay,
            limit_min: LimitSwitch::new(limit_min, config.limit_active_low),
            limit_max: LimitSwitch::new(limit_max, config.limit_active_low),
            planner: StepPlanner::default(),
            config,
            enabled: false,
            direction: None,
            pin_faults: 0,
        };
        let _ = axis.step.set_low();
        axis.write_enable(false);
        axis
    }

    /// Number of pin writes that failed since creation
    pub fn pin_faults(&self) -> u32 {
        self.pin_faults
    }

    /// Access the step scheduler
    pub fn planner(&self) -> &StepPlanner {
        &self.planner
    }

    fn write_enable(&mut self, on: bool) {
        // Normal: on=true, inverted=false → high
        // Inverted: on=true, inverted=true → low
        let result = if on != self.config.enable_inverted {
            self.enable.set_high()
        } else {
            self.enable.set_low()
        };
        if result.is_err() {
            self.pin_faults = self.pin_faults.saturating_add(1);
        }
    }

    fn latch_direction(&mut self, direction: Direction) {
        if self.direction == Some(direction) {
            return;
        }
        let positive = direction == Direction::Positive;
        let result = if positive != self.config.dir_inverted {
            self.dir.set_high()
        } else {
            self.dir.set_low()
        };
        if result.is_err() {
            self.pin_faults = self.pin_faults.saturating_add(1);
        }
        self.direction = Some(direction);
        // DIR setup time before the next STEP edge
        self.delay.delay_us(self.config.step_pulse_us);
    }

    fn pulse(&mut self, direction: Direction) {
        self.latch_direction(direction);
        let high = self.step.set_high();
        self.delay.delay_us(self.config.step_pulse_us);
        let low = self.step.set_low();
        if high.is_err() || low.is_err() {
            self.pin_faults = self.pin_faults.saturating_add(1);
        }
    }
}

impl<STEP, DIR, EN, D, MIN, MAX> Axis for StepperAxis<STEP, DIR, EN, D, MIN, MAX>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    D: DelayNs,
    MIN: InputPin,
    MAX: InputPin,
{
    fn set_limits(&mut self, max_speed: f32, acceleration: f32) {
        self.planner.set_max_speed(max_speed);
        self.planner.set_acceleration(acceleration);
    }

    fn enable(&mut self) {
        self.write_enable(true);
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.planner.hard_stop();
        self.write_enable(false);
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn move_to(&mut self, position: i32) {
        self.planner.move_to(position);
    }

    fn tick(&mut self, now_us: u64) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(direction) = self.planner.poll(now_us) {
            self.pulse(direction);
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
        self.limit_min.is_asserted()
    }

    fn read_limit_max(&mut self) -> bool {
        self.limit_max.is_asserted()
    }
}
