//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use medpick_protocol::{Line, LineError, ResponseLine};

/// Channel capacity for received lines
const LINE_CHANNEL_SIZE: usize = 4;

/// Channel capacity for outgoing responses
const RESPONSE_CHANNEL_SIZE: usize = 16;

/// Output of the line reader
#[derive(Debug, Clone)]
pub enum LineEvent {
    /// A complete, trimmed line
    Line(Line),
    /// A line that had to be dropped
    Error(LineError),
}

/// Lines from the host serial port to the control task
pub static LINE_CHANNEL: Channel<CriticalSectionRawMutex, LineEvent, LINE_CHANNEL_SIZE> =
    Channel::new();

/// Rendered responses from the control task to the host serial port
pub static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, ResponseLine, RESPONSE_CHANNEL_SIZE> =
    Channel::new();
