//! Command dispatcher and job runner
//!
//! The [`Controller`] owns both axes, the grid table and every job state
//! machine. The control loop feeds it lines with [`Controller::handle_line`],
//! advances motion with [`Controller::tick`] and drains replies with
//! [`Controller::poll_response`]. Nothing blocks, so `STOP` and `STATUS`
//! are honoured while a job runs.
//!
//! Only one job runs at a time. While calibration, a GO move or a GRAB
//! batch is active every command except `STOP` and `STATUS` is answered
//! with `ERROR: BUSY`; in particular `SET` can never change the grid under
//! a running batch.

use heapless::Deque;
use medpick_protocol::{Command, ErrorCode, LineError, Response, SetTarget};

use crate::calibration::{CalibrationState, Homing, HomingStatus};
use crate::config::MachineConfig;
use crate::grid::{GridError, GridTable};
use crate::motion::{AxisId, Position};
use crate::safety::{SafetyMonitor, SafetyStatus};
use crate::sequencer::{BatchEvent, GrabBatch};
use crate::state::{Event, State};
use crate::traits::Axis;

/// Responses buffered between two drains of the outbox
pub const OUTBOX_LEN: usize = 16;

/// Dual-axis gantry controller
pub struct Controller<H: Axis, V: Axis> {
    config: MachineConfig,
    horizontal: H,
    vertical: V,
    state: State,
    homing: Homing,
    grid: GridTable,
    safety: SafetyMonitor,
    batch: Option<GrabBatch>,
    outbox: Deque<Response, OUTBOX_LEN>,
}

impl<H: Axis, V: Axis> Controller<H, V> {
    /// Create a controller, configuring and enabling both axes
    pub fn new(config: MachineConfig, horizontal: H, vertical: V) -> Self {
        let state = if config.require_handshake {
            State::AwaitingHandshake
        } else {
            State::Idle
        };

        let mut controller = Self {
            homing: Homing::new(config.calibration),
            grid: GridTable::from_config(&config.grid),
            safety: SafetyMonitor::new(&config.safety),
            config,
            horizontal,
            vertical,
            state,
            batch: None,
            outbox: Deque::new(),
        };
        controller.apply_motion_limits();
        controller.horizontal.enable();
        controller.vertical.enable();
        controller
    }

    /// Current dispatcher state
    pub fn state(&self) -> State {
        self.state
    }

    /// Current calibration state
    pub fn calibration_state(&self) -> CalibrationState {
        self.homing.state()
    }

    /// Check if a job is running
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Grid table
    pub fn grid(&self) -> &GridTable {
        &self.grid
    }

    /// Active configuration
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Current position of both axes
    pub fn position(&self) -> Position {
        Position::new(
            self.horizontal.current_position(),
            self.vertical.current_position(),
        )
    }

    /// Horizontal axis
    pub fn horizontal(&self) -> &H {
        &self.horizontal
    }

    /// Vertical axis
    pub fn vertical(&self) -> &V {
        &self.vertical
    }

    /// Mutable horizontal axis
    pub fn horizontal_mut(&mut self) -> &mut H {
        &mut self.horizontal
    }

    /// Mutable vertical axis
    pub fn vertical_mut(&mut self) -> &mut V {
        &mut self.vertical
    }

    /// Take the next queued response
    pub fn poll_response(&mut self) -> Option<Response> {
        self.outbox.pop_front()
    }

    /// Handle one trimmed input line
    pub fn handle_line(&mut self, line: &str, now_us: u64) {
        if self.state == State::AwaitingHandshake && line != "HANDSHAKE" {
            self.respond(Response::Error(ErrorCode::HandshakeRequired));
            return;
        }

        match Command::parse(line) {
            Ok(command) => self.handle_command(command, now_us),
            Err(e) => {
                log_debug!("Rejected line: {}", e);
                self.respond(Response::Error(e.into()));
            }
        }
    }

    /// Report a line the reader had to drop
    pub fn handle_line_error(&mut self, error: LineError) {
        let code = match error {
            LineError::LineTooLong => ErrorCode::LineTooLong,
            LineError::InvalidUtf8 => ErrorCode::UnknownCommand,
        };
        self.respond(Response::Error(code));
    }

    /// Handle a parsed command
    pub fn handle_command(&mut self, command: Command, now_us: u64) {
        if self.state == State::AwaitingHandshake && command != Command::Handshake {
            self.respond(Response::Error(ErrorCode::HandshakeRequired));
            return;
        }
        if self.state.is_busy() && !command.allowed_while_busy() {
            self.respond(Response::Error(ErrorCode::Busy));
            return;
        }

        match command {
            Command::Handshake => {
                self.apply(Event::HandshakeReceived);
                self.respond(Response::HandshakeDone);
            }
            Command::Calibrate => self.start_calibration(now_us),
            Command::Grab(pairs) => {
                if self.require_calibrated() {
                    log_info!("Grab batch of {} pairs", pairs.len());
                    self.batch = Some(GrabBatch::new(pairs));
                    self.apply(Event::GrabRequested);
                }
            }
            Command::Go {
                horizontal,
                vertical,
            } => {
                if self.require_calibrated() {
                    log_info!("Move to H={} V={}", horizontal, vertical);
                    self.horizontal.move_to(horizontal);
                    self.vertical.move_to(vertical);
                    self.apply(Event::MoveRequested);
                }
            }
            Command::Set { target, value } => match self.apply_set(target, value) {
                Ok(()) => self.respond(Response::SetAck { target, value }),
                Err(code) => self.respond(Response::Error(code)),
            },
            Command::Stop => self.stop(),
            Command::Status => {
                let position = self.position();
                self.respond(Response::Status {
                    state: self.state.name(),
                    calibration: self.homing.state().name(),
                    horizontal: position.horizontal,
                    vertical: position.vertical,
                });
            }
        }
    }

    /// Advance motion and the active job
    pub fn tick(&mut self, now_us: u64) {
        self.horizontal.tick(now_us);
        self.vertical.tick(now_us);

        if self.state.limits_supervised() && self.check_limits() {
            return;
        }

        match self.state {
            State::Calibrating => self.update_calibration(now_us),
            State::Moving => {
                if !self.horizontal.is_running() && !self.vertical.is_running() {
                    // GO completes silently
                    self.apply(Event::MoveFinished);
                }
            }
            State::Grabbing => self.update_batch(),
            State::AwaitingHandshake | State::Idle => {}
        }
    }

    fn start_calibration(&mut self, now_us: u64) {
        log_info!("Calibration requested");
        self.batch = None;
        self.safety.disarm();
        self.apply_homing_limits();
        self.homing
            .start(&mut self.horizontal, &mut self.vertical, now_us);
        self.apply(Event::CalibrateRequested);
        self.respond(Response::CalibrationStart);
    }

    fn update_calibration(&mut self, now_us: u64) {
        match self
            .homing
            .update(&mut self.horizontal, &mut self.vertical, now_us)
        {
            HomingStatus::Idle | HomingStatus::InProgress => {}
            HomingStatus::Complete {
                horizontal,
                vertical,
            } => {
                self.apply_motion_limits();
                self.safety.arm(horizontal, vertical);
                self.apply(Event::CalibrationFinished);
                self.respond(Response::CalibratedRange {
                    horizontal: horizontal.max,
                    vertical: vertical.max,
                });
                self.respond(Response::CalibrationDone);
            }
            HomingStatus::Failed(failure) => {
                self.apply_motion_limits();
                self.apply(Event::CalibrationFailed);
                self.respond(Response::AxisError {
                    code: ErrorCode::CalibrationFailed,
                    axis: failure.axis.name(),
                    reason: Some(failure.reason.as_str()),
                });
            }
        }
    }

    fn update_batch(&mut self) {
        let Some(batch) = self.batch.as_mut() else {
            self.apply(Event::BatchFinished);
            return;
        };

        match batch.update(&mut self.horizontal, &mut self.vertical, &self.grid) {
            BatchEvent::InProgress => {}
            BatchEvent::PairDone { slot, quantity } => {
                self.respond(Response::Grabbed { slot, quantity });
            }
            BatchEvent::BatchDone => {
                self.batch = None;
                self.apply(Event::BatchFinished);
                self.respond(Response::AllGrabsDone);
            }
            BatchEvent::Failed(code) => {
                self.batch = None;
                self.apply(Event::BatchAborted);
                self.respond(Response::Error(code));
            }
        }
    }

    /// Returns true if a trip ended the active job
    fn check_limits(&mut self) -> bool {
        let SafetyStatus::LimitTripped { axis, edge } =
            self.safety.check(&mut self.horizontal, &mut self.vertical)
        else {
            return false;
        };

        log_warn!("Limit switch tripped on {}: {}", axis.name(), edge);
        match axis {
            AxisId::Horizontal => {
                self.horizontal.disable();
                self.vertical.stop_and_settle();
            }
            AxisId::Vertical => {
                self.vertical.disable();
                self.horizontal.stop_and_settle();
            }
        }

        // Position can no longer be trusted
        self.batch = None;
        self.homing.invalidate();
        self.safety.disarm();
        self.apply(Event::LimitTripped);
        self.respond(Response::AxisError {
            code: ErrorCode::LimitTriggered,
            axis: axis.name(),
            reason: None,
        });
        true
    }

    fn stop(&mut self) {
        log_info!("Stop requested in {}", self.state);
        if self.state == State::Calibrating {
            self.homing.abort(&mut self.horizontal, &mut self.vertical);
            self.apply_motion_limits();
        } else {
            self.horizontal.disable();
            self.vertical.disable();
            self.horizontal.enable();
            self.vertical.enable();
        }
        self.batch = None;
        self.apply(Event::Stop);
        self.respond(Response::Stopped);
    }

    fn require_calibrated(&mut self) -> bool {
        if self.homing.state().is_calibrated() {
            true
        } else {
            self.respond(Response::Error(ErrorCode::NotCalibrated));
            false
        }
    }

    fn apply_set(&mut self, target: SetTarget, value: i32) -> Result<(), ErrorCode> {
        let result = match target {
            SetTarget::Column(column) => self.grid.set_column(column, value),
            SetTarget::Row(row) => self.grid.set_row(row, value),
            SetTarget::HorizontalDropOff => {
                self.grid.set_drop_off(AxisId::Horizontal, value);
                Ok(())
            }
            SetTarget::VerticalDropOff => {
                self.grid.set_drop_off(AxisId::Vertical, value);
                Ok(())
            }
        };
        result.map_err(|e| match e {
            GridError::InvalidRow => ErrorCode::InvalidRow,
            GridError::InvalidColumn => ErrorCode::InvalidColumn,
            GridError::InvalidSlot | GridError::InvalidPosition => ErrorCode::InvalidSlotOrQuantity,
        })
    }

    fn apply(&mut self, event: Event) {
        let next = self.state.transition(event);
        if event.is_fault() {
            log_warn!("Fault {} while {}", event, self.state);
        } else if event.is_job_end() && self.state.is_busy() {
            log_info!("Job {} ended on {}", self.state, event);
        }
        if next != self.state {
            log_debug!("State {} -> {} on {}", self.state, next, event);
        }
        self.state = next;
    }

    fn respond(&mut self, response: Response) {
        if let Err(response) = self.outbox.push_back(response) {
            // Keep the newest replies; the host cares most about the latest state
            log_warn!("Response outbox full, dropping oldest");
            self.outbox.pop_front();
            let _ = self.outbox.push_back(response);
        }
    }

    fn apply_motion_limits(&mut self) {
        let h = self.config.horizontal;
        let v = self.config.vertical;
        self.horizontal.set_limits(h.max_speed, h.acceleration);
        self.vertical.set_limits(v.max_speed, v.acceleration);
    }

    fn apply_homing_limits(&mut self) {
        let h = self.config.horizontal;
        let v = self.config.vertical;
        self.horizontal
            .set_limits(h.homing_speed, h.homing_acceleration);
        self.vertical
            .set_limits(v.homing_speed, v.homing_acceleration);
    }
}
