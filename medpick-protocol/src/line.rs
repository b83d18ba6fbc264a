//! Line assembly for the serial command protocol.
//!
//! Bytes arrive from the UART in arbitrary chunks. The [`LineReader`]
//! accumulates them until a `\n` terminator and hands out one trimmed
//! line at a time:
//! - `\r` bytes are dropped, so both `\n` and `\r\n` endings work
//! - blank lines are skipped silently
//! - a line longer than [`MAX_LINE_LEN`] is discarded up to its
//!   terminator and reported once as [`LineError::LineTooLong`]

use heapless::{String, Vec};

/// Maximum accepted line length in bytes (excluding the terminator)
///
/// Fits a GRAB with the full pair list written `NNxNN, ` per pair.
pub const MAX_LINE_LEN: usize = 192;

/// A complete, trimmed command line
pub type Line = String<MAX_LINE_LEN>;

/// Errors that can occur while assembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded the buffer before its terminator arrived
    LineTooLong,
    /// Line contained bytes that are not valid UTF-8
    InvalidUtf8,
}

/// State machine for assembling incoming lines
#[derive(Debug, Clone)]
pub struct LineReader {
    buffer: Vec<u8, MAX_LINE_LEN>,
    /// Set once the current line overflowed; cleared at the next terminator
    overflowed: bool,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    /// Create a new line reader
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Reset the reader, dropping any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    /// Number of bytes buffered for the current partial line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte to the reader
    ///
    /// Returns `Ok(Some(line))` when a complete non-empty line is available,
    /// `Ok(None)` when more bytes are needed, or `Err` if the finished line
    /// had to be dropped.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match byte {
            b'\n' => self.finish(),
            b'\r' => Ok(None),
            _ => {
                if !self.overflowed && self.buffer.push(byte).is_err() {
                    self.overflowed = true;
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the reader
    ///
    /// Returns the first complete line (or error) found, along with the
    /// number of bytes consumed. Bytes after that line are left for the
    /// next call.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (usize, Result<Option<Line>, LineError>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (i + 1, other),
            }
        }
        (bytes.len(), Ok(None))
    }

    fn finish(&mut self) -> Result<Option<Line>, LineError> {
        if self.overflowed {
            self.reset();
            return Err(LineError::LineTooLong);
        }

        let result = match core::str::from_utf8(&self.buffer) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else {
                    // Cannot overflow: the trimmed text is a slice of the buffer
                    let mut line = Line::new();
                    let _ = line.push_str(text);
                    Ok(Some(line))
                }
            }
            Err(_) => Err(LineError::InvalidUtf8),
        };

        self.reset();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(reader: &mut LineReader, bytes: &[u8]) -> Option<Result<Option<Line>, LineError>> {
        let (_, result) = reader.feed_bytes(bytes);
        match result {
            Ok(None) => None,
            other => Some(other),
        }
    }

    #[test]
    fn test_simple_line() {
        let mut reader = LineReader::new();
        let line = feed_all(&mut reader, b"CALIBRATE\n").unwrap().unwrap().unwrap();
        assert_eq!(line.as_str(), "CALIBRATE");
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_crlf_and_whitespace_trimmed() {
        let mut reader = LineReader::new();
        let line = feed_all(&mut reader, b"  GO1000,7000 \r\n").unwrap().unwrap().unwrap();
        assert_eq!(line.as_str(), "GO1000,7000");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut reader = LineReader::new();
        assert!(feed_all(&mut reader, b"\n\r\n   \n").is_none());
        let line = feed_all(&mut reader, b"HANDSHAKE\n").unwrap().unwrap().unwrap();
        assert_eq!(line.as_str(), "HANDSHAKE");
    }

    #[test]
    fn test_split_across_chunks() {
        let mut reader = LineReader::new();
        assert!(feed_all(&mut reader, b"GRAB01").is_none());
        assert_eq!(reader.pending(), 6);
        let line = feed_all(&mut reader, b"x02\n").unwrap().unwrap().unwrap();
        assert_eq!(line.as_str(), "GRAB01x02");
    }

    #[test]
    fn test_two_lines_in_one_chunk() {
        let mut reader = LineReader::new();
        let data = b"HANDSHAKE\nCALIBRATE\n";

        let (used, first) = reader.feed_bytes(data);
        assert_eq!(first.unwrap().unwrap().as_str(), "HANDSHAKE");

        let (_, second) = reader.feed_bytes(&data[used..]);
        assert_eq!(second.unwrap().unwrap().as_str(), "CALIBRATE");
    }

    #[test]
    fn test_overlong_line_reported_once_then_recovers() {
        let mut reader = LineReader::new();
        for _ in 0..(MAX_LINE_LEN + 10) {
            assert_eq!(reader.feed(b'A'), Ok(None));
        }
        assert_eq!(reader.feed(b'\n'), Err(LineError::LineTooLong));

        let line = feed_all(&mut reader, b"STATUS\n").unwrap().unwrap().unwrap();
        assert_eq!(line.as_str(), "STATUS");
    }

    #[test]
    fn test_line_at_exact_capacity_is_kept() {
        let mut reader = LineReader::new();
        for _ in 0..MAX_LINE_LEN {
            reader.feed(b'1').unwrap();
        }
        let line = reader.feed(b'\n').unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LEN);
    }

    #[test]
    fn test_full_grab_fits() {
        use crate::command::{Command, MAX_GRAB_PAIRS};

        let mut text: heapless::String<256> = heapless::String::new();
        text.push_str("GRAB ").unwrap();
        for slot in 1..=MAX_GRAB_PAIRS {
            if slot > 1 {
                text.push_str(", ").unwrap();
            }
            core::fmt::Write::write_fmt(&mut text, format_args!("{:02}x{:02}", slot, 99)).unwrap();
        }
        text.push('\n').unwrap();

        let mut reader = LineReader::new();
        let line = feed_all(&mut reader, text.as_bytes()).unwrap().unwrap().unwrap();
        let Ok(Command::Grab(pairs)) = Command::parse(&line) else {
            panic!("expected GRAB");
        };
        assert_eq!(pairs.len(), MAX_GRAB_PAIRS);
        assert!(pairs.iter().all(|token| matches!(token, crate::command::PairToken::Pair(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut reader = LineReader::new();
        reader.feed(0xFF).unwrap();
        reader.feed(0xFE).unwrap();
        assert_eq!(reader.feed(b'\n'), Err(LineError::InvalidUtf8));
        assert_eq!(reader.pending(), 0);
    }
}
