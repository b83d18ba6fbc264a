//! State machine definition
//!
//! Motion and command acceptance are a function of the current state.
//! At most one job (calibration, GO move or GRAB batch) runs at a time.

use super::events::Event;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting for the host to announce itself
    AwaitingHandshake,
    /// Ready for commands, no motion
    Idle,
    /// Homing both axes
    Calibrating,
    /// Executing a GO move
    Moving,
    /// Executing a GRAB batch
    Grabbing,
}

impl State {
    /// Check if a job is running
    pub fn is_busy(&self) -> bool {
        matches!(self, State::Calibrating | State::Moving | State::Grabbing)
    }

    /// Check if the axes may be moving under a GO or GRAB job
    ///
    /// Limit switches are expected to assert only while calibrating.
    pub fn limits_supervised(&self) -> bool {
        matches!(self, State::Moving | State::Grabbing)
    }

    /// Name used in `STATUS` lines
    pub fn name(&self) -> &'static str {
        match self {
            State::AwaitingHandshake => "AWAITING_HANDSHAKE",
            State::Idle => "IDLE",
            State::Calibrating => "CALIBRATING",
            State::Moving => "MOVING",
            State::Grabbing => "GRABBING",
        }
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Handshake transitions
            (AwaitingHandshake, HandshakeReceived) => Idle,
            (Idle, HandshakeReceived) => Idle,

            // Idle transitions
            (Idle, CalibrateRequested) => Calibrating,
            (Idle, MoveRequested) => Moving,
            (Idle, GrabRequested) => Grabbing,

            // Calibrating transitions
            (Calibrating, CalibrationFinished) => Idle,
            (Calibrating, CalibrationFailed) => Idle,

            // Moving transitions
            (Moving, MoveFinished) => Idle,

            // Grabbing transitions
            (Grabbing, BatchFinished) => Idle,
            (Grabbing, BatchAborted) => Idle,

            // Any job
            (Calibrating | Moving | Grabbing, Stop) => Idle,
            (Moving | Grabbing, LimitTripped) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
