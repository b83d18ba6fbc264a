//! Response lines sent from the controller to the host
//!
//! Every response renders to exactly one line of text without the
//! trailing newline; the transmit task appends `\n`.

use core::fmt::{self, Write};

use heapless::String;

use crate::command::SetTarget;

/// Maximum rendered response length in bytes
pub const MAX_RESPONSE_LEN: usize = 80;

/// A rendered response line
pub type ResponseLine = String<MAX_RESPONSE_LEN>;

/// Broad category of an error, used for logging and host-side handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorClass {
    /// Line could not be understood
    Protocol,
    /// Command valid but not allowed in the current state
    Precondition,
    /// Value outside the configured grid
    Range,
    /// Limit switch or driver fault
    HardwareSafety,
    /// Homing did not complete
    Calibration,
}

/// Error identifiers as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    NotCalibrated,
    InvalidFormat,
    InvalidSlotOrQuantity,
    InvalidGoFormat,
    InvalidColumn,
    InvalidRow,
    InvalidSetFormat,
    InvalidSetTarget,
    UnknownCommand,
    HandshakeRequired,
    Busy,
    LineTooLong,
    CalibrationFailed,
    LimitTriggered,
}

impl ErrorCode {
    /// Wire spelling of the error
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotCalibrated => "NOT_CALIBRATED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::InvalidSlotOrQuantity => "INVALID_SLOT_OR_QUANTITY",
            ErrorCode::InvalidGoFormat => "INVALID_GO_FORMAT",
            ErrorCode::InvalidColumn => "INVALID_COLUMN",
            ErrorCode::InvalidRow => "INVALID_ROW",
            ErrorCode::InvalidSetFormat => "INVALID_SET_FORMAT",
            ErrorCode::InvalidSetTarget => "INVALID_SET_TARGET",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::HandshakeRequired => "HANDSHAKE_REQUIRED",
            ErrorCode::Busy => "BUSY",
            ErrorCode::LineTooLong => "LINE_TOO_LONG",
            ErrorCode::CalibrationFailed => "CALIBRATION_FAILED",
            ErrorCode::LimitTriggered => "LIMIT_TRIGGERED",
        }
    }

    /// Category of the error
    pub const fn class(self) -> ErrorClass {
        match self {
            ErrorCode::InvalidFormat
            | ErrorCode::InvalidGoFormat
            | ErrorCode::InvalidSetFormat
            | ErrorCode::InvalidSetTarget
            | ErrorCode::UnknownCommand
            | ErrorCode::LineTooLong => ErrorClass::Protocol,
            ErrorCode::NotCalibrated | ErrorCode::HandshakeRequired | ErrorCode::Busy => {
                ErrorClass::Precondition
            }
            ErrorCode::InvalidSlotOrQuantity | ErrorCode::InvalidColumn | ErrorCode::InvalidRow => {
                ErrorClass::Range
            }
            ErrorCode::LimitTriggered => ErrorClass::HardwareSafety,
            ErrorCode::CalibrationFailed => ErrorClass::Calibration,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// `HANDSHAKE_DONE`
    HandshakeDone,
    /// `CALIBRATION_START`
    CalibrationStart,
    /// `RANGE H:<max> V:<max>` - measured travel, sent before `CALIBRATION_DONE`
    CalibratedRange { horizontal: i32, vertical: i32 },
    /// `CALIBRATION_DONE`
    CalibrationDone,
    /// `GRABBED <slot>x<qty>` - one pair delivered to the drop-off
    Grabbed { slot: u8, quantity: u32 },
    /// `ALL_GRABS_DONE`
    AllGrabsDone,
    /// `<TARGET> SET TO <value>`
    SetAck { target: SetTarget, value: i32 },
    /// `STOPPED`
    Stopped,
    /// `STATUS <state> <calibration> H:<pos> V:<pos>`
    Status {
        state: &'static str,
        calibration: &'static str,
        horizontal: i32,
        vertical: i32,
    },
    /// `ERROR: <CODE>`
    Error(ErrorCode),
    /// `ERROR: <CODE> <AXIS>[ <REASON>]`
    AxisError {
        code: ErrorCode,
        axis: &'static str,
        reason: Option<&'static str>,
    },
}

impl Response {
    /// Render the response into a line buffer
    ///
    /// Every variant fits in [`MAX_RESPONSE_LEN`]; the longest is a
    /// `STATUS` line with two ten-digit positions.
    pub fn to_line(&self) -> ResponseLine {
        let mut line = ResponseLine::new();
        let _ = write!(line, "{}", self);
        line
    }

    /// The error this response reports, if any
    pub fn error_code(&self) -> Option<ErrorCode> {
        match *self {
            Response::Error(code) | Response::AxisError { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Response::HandshakeDone => f.write_str("HANDSHAKE_DONE"),
            Response::CalibrationStart => f.write_str("CALIBRATION_START"),
            Response::CalibratedRange {
                horizontal,
                vertical,
            } => write!(f, "RANGE H:{} V:{}", horizontal, vertical),
            Response::CalibrationDone => f.write_str("CALIBRATION_DONE"),
            Response::Grabbed { slot, quantity } => {
                write!(f, "GRABBED {:02}x{:02}", slot, quantity)
            }
            Response::AllGrabsDone => f.write_str("ALL_GRABS_DONE"),
            Response::SetAck { target, value } => {
                match target {
                    SetTarget::Column(n) => write!(f, "COLUMN_{}", n)?,
                    SetTarget::Row(n) => write!(f, "ROW_{}", n)?,
                    SetTarget::HorizontalDropOff => f.write_str("HOR_DROP_OFF_POSITION")?,
                    SetTarget::VerticalDropOff => f.write_str("VERT_DROP_OFF_POSITION")?,
                }
                write!(f, " SET TO {}", value)
            }
            Response::Stopped => f.write_str("STOPPED"),
            Response::Status {
                state,
                calibration,
                horizontal,
                vertical,
            } => write!(
                f,
                "STATUS {} {} H:{} V:{}",
                state, calibration, horizontal, vertical
            ),
            Response::Error(code) => write!(f, "ERROR: {}", code),
            Response::AxisError { code, axis, reason } => {
                write!(f, "ERROR: {} {}", code, axis)?;
                if let Some(reason) = reason {
                    write!(f, " {}", reason)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(response: Response) -> ResponseLine {
        response.to_line()
    }

    #[test]
    fn test_fixed_lines() {
        assert_eq!(render(Response::HandshakeDone).as_str(), "HANDSHAKE_DONE");
        assert_eq!(render(Response::CalibrationStart).as_str(), "CALIBRATION_START");
        assert_eq!(render(Response::CalibrationDone).as_str(), "CALIBRATION_DONE");
        assert_eq!(render(Response::AllGrabsDone).as_str(), "ALL_GRABS_DONE");
        assert_eq!(render(Response::Stopped).as_str(), "STOPPED");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            render(Response::Error(ErrorCode::NotCalibrated)).as_str(),
            "ERROR: NOT_CALIBRATED"
        );
        assert_eq!(
            render(Response::Error(ErrorCode::InvalidSlotOrQuantity)).as_str(),
            "ERROR: INVALID_SLOT_OR_QUANTITY"
        );
        assert_eq!(
            render(Response::AxisError {
                code: ErrorCode::LimitTriggered,
                axis: "HORIZONTAL",
                reason: None,
            })
            .as_str(),
            "ERROR: LIMIT_TRIGGERED HORIZONTAL"
        );
        assert_eq!(
            render(Response::AxisError {
                code: ErrorCode::CalibrationFailed,
                axis: "VERTICAL",
                reason: Some("TIMEOUT"),
            })
            .as_str(),
            "ERROR: CALIBRATION_FAILED VERTICAL TIMEOUT"
        );
    }

    #[test]
    fn test_set_ack() {
        assert_eq!(
            render(Response::SetAck {
                target: SetTarget::Column(3),
                value: 999
            })
            .as_str(),
            "COLUMN_3 SET TO 999"
        );
        assert_eq!(
            render(Response::SetAck {
                target: SetTarget::Row(1),
                value: 10
            })
            .as_str(),
            "ROW_1 SET TO 10"
        );
        assert_eq!(
            render(Response::SetAck {
                target: SetTarget::HorizontalDropOff,
                value: 1234
            })
            .as_str(),
            "HOR_DROP_OFF_POSITION SET TO 1234"
        );
        assert_eq!(
            render(Response::SetAck {
                target: SetTarget::VerticalDropOff,
                value: -5
            })
            .as_str(),
            "VERT_DROP_OFF_POSITION SET TO -5"
        );
    }

    #[test]
    fn test_grabbed_is_zero_padded() {
        assert_eq!(
            render(Response::Grabbed {
                slot: 1,
                quantity: 2
            })
            .as_str(),
            "GRABBED 01x02"
        );
        assert_eq!(
            render(Response::Grabbed {
                slot: 24,
                quantity: 10
            })
            .as_str(),
            "GRABBED 24x10"
        );
    }

    #[test]
    fn test_longest_status_fits() {
        let line = render(Response::Status {
            state: "AWAITING_HANDSHAKE",
            calibration: "UNCALIBRATED",
            horizontal: i32::MIN,
            vertical: i32::MIN,
        });
        assert_eq!(
            line.as_str(),
            "STATUS AWAITING_HANDSHAKE UNCALIBRATED H:-2147483648 V:-2147483648"
        );
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(ErrorCode::UnknownCommand.class(), ErrorClass::Protocol);
        assert_eq!(ErrorCode::NotCalibrated.class(), ErrorClass::Precondition);
        assert_eq!(ErrorCode::InvalidRow.class(), ErrorClass::Range);
        assert_eq!(ErrorCode::LimitTriggered.class(), ErrorClass::HardwareSafety);
        assert_eq!(ErrorCode::CalibrationFailed.class(), ErrorClass::Calibration);
        assert_eq!(Response::Error(ErrorCode::Busy).error_code(), Some(ErrorCode::Busy));
        let axis_error = Response::AxisError {
            code: ErrorCode::LimitTriggered,
            axis: "HORIZONTAL",
            reason: None,
        };
        assert_eq!(axis_error.error_code().map(ErrorCode::class), Some(ErrorClass::HardwareSafety));
        assert_eq!(Response::Stopped.error_code(), None);
    }
}
