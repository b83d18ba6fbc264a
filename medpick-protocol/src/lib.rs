//! Serial command protocol for the medpick dispenser gantry
//!
//! This crate defines the text protocol spoken between the host (the
//! prescription station) and the gantry controller over a UART link.
//!
//! # Protocol Overview
//!
//! Every message is a single line of ASCII text terminated by `\n`
//! (a preceding `\r` is tolerated). The host sends one command per line:
//!
//! ```text
//! HANDSHAKE
//! CALIBRATE
//! GRAB01x02,09x01
//! GO1000,7000
//! SETC3,999
//! ```
//!
//! The controller answers with zero or more response lines, for example
//! `CALIBRATION_START` / `CALIBRATION_DONE` or `ERROR: NOT_CALIBRATED`.
//! Verbs are case-sensitive.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod response;

pub use command::{Command, GrabList, GrabPair, PairToken, ParseError, SetTarget, MAX_GRAB_PAIRS};
pub use line::{Line, LineError, LineReader, MAX_LINE_LEN};
pub use response::{ErrorClass, ErrorCode, Response, ResponseLine, MAX_RESPONSE_LEN};
