//! Events that trigger state transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Host events
    /// `HANDSHAKE` received
    HandshakeReceived,
    /// `CALIBRATE` accepted
    CalibrateRequested,
    /// `GO` accepted
    MoveRequested,
    /// `GRAB` accepted
    GrabRequested,
    /// `STOP` received
    Stop,

    // Job events
    /// Homing completed
    CalibrationFinished,
    /// Homing failed
    CalibrationFailed,
    /// Both axes reached the GO target
    MoveFinished,
    /// Every pair of the batch delivered
    BatchFinished,
    /// Batch rejected a pair
    BatchAborted,

    // Safety events
    /// Limit switch asserted outside homing
    LimitTripped,
}

impl Event {
    /// Check if this event ends a job
    pub fn is_job_end(&self) -> bool {
        matches!(
            self,
            Event::CalibrationFinished
                | Event::CalibrationFailed
                | Event::MoveFinished
                | Event::BatchFinished
                | Event::BatchAborted
                | Event::Stop
                | Event::LimitTripped
        )
    }

    /// Check if this event indicates a fault
    pub fn is_fault(&self) -> bool {
        matches!(self, Event::CalibrationFailed | Event::LimitTripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_end_events() {
        assert!(Event::BatchAborted.is_job_end());
        assert!(Event::Stop.is_job_end());
        assert!(!Event::GrabRequested.is_job_end());
    }

    #[test]
    fn test_fault_events() {
        assert!(Event::LimitTripped.is_fault());
        assert!(!Event::BatchFinished.is_fault());
    }
}
