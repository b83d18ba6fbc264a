//! Two-phase homing state machine
//!
//! Both axes home concurrently, one leg at a time:
//!
//! 1. `HomingMin`: seek toward the minimum switch. When it asserts the axis
//!    is hard-stopped, its position is redefined as 0 and it is re-enabled
//!    once settled.
//! 2. `HomingMax`: seek toward the maximum switch and record the position
//!    at which it asserts as the travel maximum.
//! 3. `ReturningHome`: move to the resting position chosen by the
//!    [`ReturnPolicy`].
//!
//! Each leg is bounded twice: it never commands more than
//! `homing_distance` steps from where the axis stands, and it must finish
//! within `homing_timeout_ms`.
//! Reaching the commanded distance without the switch asserting fails with
//! [`FailureReason::LimitNotFound`]; running out of time fails with
//! [`FailureReason::Timeout`]. A failure disables both axes.
//!
//! The machine is resumable: the caller ticks both axes and then calls
//! [`Homing::update`] from its control loop until it stops returning
//! [`HomingStatus::InProgress`].

use crate::config::{CalibrationConfig, ReturnPolicy};
use crate::motion::{AxisId, Position, TravelRange};
use crate::traits::Axis;

/// Calibration progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationState {
    /// Origin unknown
    Uncalibrated,
    /// Seeking the minimum switches
    HomingMin,
    /// Seeking the maximum switches
    HomingMax,
    /// Moving to the resting position
    ReturningHome,
    /// Origin and travel known
    Calibrated,
    /// Last attempt failed; origin unknown
    Failed(CalibrationFailure),
}

impl CalibrationState {
    /// Check if homing is underway
    pub fn is_homing(&self) -> bool {
        matches!(
            self,
            CalibrationState::HomingMin
                | CalibrationState::HomingMax
                | CalibrationState::ReturningHome
        )
    }

    /// Check if positions can be trusted
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationState::Calibrated)
    }

    /// Name used in `STATUS` lines
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationState::Uncalibrated => "UNCALIBRATED",
            CalibrationState::HomingMin => "HOMING_MIN",
            CalibrationState::HomingMax => "HOMING_MAX",
            CalibrationState::ReturningHome => "RETURNING_HOME",
            CalibrationState::Calibrated => "CALIBRATED",
            CalibrationState::Failed(_) => "FAILED",
        }
    }
}

/// Why a homing leg failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureReason {
    /// Leg exceeded its time budget
    Timeout,
    /// Commanded distance covered without the switch asserting
    LimitNotFound,
}

impl FailureReason {
    /// Name used in protocol error lines
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureReason::Timeout => "TIMEOUT",
            FailureReason::LimitNotFound => "LIMIT_NOT_FOUND",
        }
    }
}

/// A failed calibration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationFailure {
    /// Axis that failed first
    pub axis: AxisId,
    /// Failure cause
    pub reason: FailureReason,
}

/// Result of one [`Homing::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingStatus {
    /// Not started or already finished
    Idle,
    /// Keep ticking
    InProgress,
    /// Calibration finished this update
    Complete {
        horizontal: TravelRange,
        vertical: TravelRange,
    },
    /// Calibration failed this update
    Failed(CalibrationFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    /// Moving toward the switch
    Seeking,
    /// Switch hit, waiting for the axis to report stopped
    Settling,
    /// Switch hit and axis re-enabled
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Min,
    Max,
}

/// Homing state machine for both axes
#[derive(Debug, Clone)]
pub struct Homing {
    config: CalibrationConfig,
    state: CalibrationState,
    legs: [Leg; 2],
    leg_started_us: u64,
    /// Position at which each maximum switch asserted
    max: Position,
}

impl Homing {
    /// Create an uncalibrated state machine
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            state: CalibrationState::Uncalibrated,
            legs: [Leg::Seeking; 2],
            leg_started_us: 0,
            max: Position::default(),
        }
    }

    /// Current calibration state
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Measured travel, once calibrated
    pub fn range(&self, axis: AxisId) -> Option<TravelRange> {
        if self.state.is_calibrated() {
            Some(TravelRange::new(self.max.get(axis)))
        } else {
            None
        }
    }

    /// Forget the origin (after a limit trip or an aborted move)
    pub fn invalidate(&mut self) {
        if !self.state.is_homing() {
            self.state = CalibrationState::Uncalibrated;
        }
    }

    /// Begin homing both axes
    pub fn start<H: Axis, V: Axis>(&mut self, horizontal: &mut H, vertical: &mut V, now_us: u64) {
        horizontal.enable();
        vertical.enable();
        self.begin_leg(CalibrationState::HomingMin, now_us);
        self.seek(horizontal, Edge::Min);
        self.seek(vertical, Edge::Min);
        log_info!("Homing: seeking minimum switches");
    }

    /// Abort homing with a hard stop on both axes
    ///
    /// Leaves the axes enabled and the state `Uncalibrated`.
    pub fn abort<H: Axis, V: Axis>(&mut self, horizontal: &mut H, vertical: &mut V) {
        horizontal.disable();
        vertical.disable();
        horizontal.enable();
        vertical.enable();
        self.state = CalibrationState::Uncalibrated;
    }

    /// Advance homing after both axes have been ticked
    pub fn update<H: Axis, V: Axis>(
        &mut self,
        horizontal: &mut H,
        vertical: &mut V,
        now_us: u64,
    ) -> HomingStatus {
        let edge = match self.state {
            CalibrationState::HomingMin => Edge::Min,
            CalibrationState::HomingMax => Edge::Max,
            CalibrationState::ReturningHome => return self.update_return(horizontal, vertical, now_us),
            _ => return HomingStatus::Idle,
        };

        let h = self.step_leg(horizontal, AxisId::Horizontal, edge);
        let v = self.step_leg(vertical, AxisId::Vertical, edge);
        if let Err(failure) = h.and(v) {
            return self.fail(horizontal, vertical, failure);
        }

        if self.legs.iter().all(|leg| *leg == Leg::Done) {
            match edge {
                Edge::Min => {
                    log_info!("Homing: origin set, seeking maximum switches");
                    self.begin_leg(CalibrationState::HomingMax, now_us);
                    self.seek(horizontal, Edge::Max);
                    self.seek(vertical, Edge::Max);
                }
                Edge::Max => {
                    log_info!(
                        "Homing: travel H={} V={}",
                        self.max.horizontal,
                        self.max.vertical
                    );
                    self.begin_leg(CalibrationState::ReturningHome, now_us);
                    horizontal.move_to(self.rest_position(AxisId::Horizontal));
                    vertical.move_to(self.rest_position(AxisId::Vertical));
                }
            }
            return HomingStatus::InProgress;
        }

        self.check_watchdog(horizontal, vertical, now_us)
    }

    fn update_return<H: Axis, V: Axis>(
        &mut self,
        horizontal: &mut H,
        vertical: &mut V,
        now_us: u64,
    ) -> HomingStatus {
        if !horizontal.is_running() && !vertical.is_running() {
            self.state = CalibrationState::Calibrated;
            log_info!("Homing: complete");
            return HomingStatus::Complete {
                horizontal: TravelRange::new(self.max.horizontal),
                vertical: TravelRange::new(self.max.vertical),
            };
        }
        self.check_watchdog(horizontal, vertical, now_us)
    }

    fn begin_leg(&mut self, state: CalibrationState, now_us: u64) {
        self.state = state;
        self.legs = [Leg::Seeking; 2];
        self.leg_started_us = now_us;
    }

    /// Command a leg of at most `homing_distance` steps from where the axis is
    fn seek<A: Axis>(&self, axis: &mut A, edge: Edge) {
        let here = axis.current_position();
        let target = match edge {
            Edge::Min => here.saturating_sub(self.config.homing_distance),
            Edge::Max => here.saturating_add(self.config.homing_distance),
        };
        axis.move_to(target);
    }

    fn rest_position(&self, axis: AxisId) -> i32 {
        match self.config.return_policy {
            ReturnPolicy::Zero => 0,
            ReturnPolicy::Midpoint => TravelRange::new(self.max.get(axis)).midpoint(),
        }
    }

    /// Advance one axis through the current leg
    fn step_leg<A: Axis>(
        &mut self,
        axis: &mut A,
        id: AxisId,
        edge: Edge,
    ) -> Result<(), CalibrationFailure> {
        let index = id as usize;
        match self.legs[index] {
            Leg::Seeking => {
                let hit = match edge {
                    Edge::Min => axis.read_limit_min(),
                    Edge::Max => axis.read_limit_max(),
                };
                if hit {
                    axis.disable();
                    match edge {
                        Edge::Min => axis.set_current_position(0),
                        Edge::Max => self.max.set(id, axis.current_position()),
                    }
                    axis.stop_and_settle();
                    self.legs[index] = Leg::Settling;
                    log_debug!("Homing: {} switch hit", id.name());
                } else if !axis.is_running() {
                    return Err(CalibrationFailure {
                        axis: id,
                        reason: FailureReason::LimitNotFound,
                    });
                }
            }
            Leg::Settling => {
                if !axis.is_running() {
                    axis.enable();
                    self.legs[index] = Leg::Done;
                }
            }
            Leg::Done => {}
        }
        Ok(())
    }

    fn check_watchdog<H: Axis, V: Axis>(
        &mut self,
        horizontal: &mut H,
        vertical: &mut V,
        now_us: u64,
    ) -> HomingStatus {
        let budget_us = self.config.homing_timeout_ms as u64 * 1000;
        if now_us.saturating_sub(self.leg_started_us) < budget_us {
            return HomingStatus::InProgress;
        }

        let axis = match self.state {
            CalibrationState::ReturningHome if !horizontal.is_running() => AxisId::Vertical,
            CalibrationState::ReturningHome => AxisId::Horizontal,
            _ if self.legs[AxisId::Horizontal as usize] != Leg::Done => AxisId::Horizontal,
            _ => AxisId::Vertical,
        };
        self.fail(
            horizontal,
            vertical,
            CalibrationFailure {
                axis,
                reason: FailureReason::Timeout,
            },
        )
    }

    fn fail<H: Axis, V: Axis>(
        &mut self,
        horizontal: &mut H,
        vertical: &mut V,
        failure: CalibrationFailure,
    ) -> HomingStatus {
        horizontal.disable();
        vertical.disable();
        self.state = CalibrationState::Failed(failure);
        log_warn!(
            "Homing failed on {}: {}",
            failure.axis.name(),
            failure.reason.as_str()
        );
        HomingStatus::Failed(failure)
    }
}
