//! Command parsing for the serial protocol
//!
//! Commands are parsed from a single trimmed line. Verbs are matched
//! case-sensitively; argument-carrying verbs may be followed by one
//! optional space (`GRAB01x02` and `GRAB 01x02` are equivalent).
//!
//! `GRAB` arguments are tokenised but not range-checked here. Each pair
//! keeps its raw numbers (or a [`PairToken::Malformed`] marker) so the
//! sequencer can fail on the first bad pair only when it reaches it,
//! after the earlier pairs have already been dispensed.

use heapless::Vec;

use crate::response::ErrorCode;

/// Maximum number of slot/quantity pairs in one GRAB command
pub const MAX_GRAB_PAIRS: usize = 24;

/// Errors produced while parsing a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Verb not recognised
    UnknownCommand,
    /// GRAB body missing or holding more pairs than supported
    InvalidFormat,
    /// GO arguments missing the separator or not numeric
    InvalidGoFormat,
    /// SET arguments missing the separator or value not numeric
    InvalidSetFormat,
    /// SET target letter/name not recognised
    InvalidSetTarget,
    /// SET column index not numeric
    InvalidColumn,
    /// SET row index not numeric
    InvalidRow,
}

impl From<ParseError> for ErrorCode {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::UnknownCommand => ErrorCode::UnknownCommand,
            ParseError::InvalidFormat => ErrorCode::InvalidFormat,
            ParseError::InvalidGoFormat => ErrorCode::InvalidGoFormat,
            ParseError::InvalidSetFormat => ErrorCode::InvalidSetFormat,
            ParseError::InvalidSetTarget => ErrorCode::InvalidSetTarget,
            ParseError::InvalidColumn => ErrorCode::InvalidColumn,
            ParseError::InvalidRow => ErrorCode::InvalidRow,
        }
    }
}

/// Grid value addressed by a SET command
///
/// Row and column indices are carried unvalidated; the grid table owns
/// the range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetTarget {
    /// `SETC<n>` - column position (horizontal axis)
    Column(i32),
    /// `SETR<n>` - row position (vertical axis)
    Row(i32),
    /// `SETHDROP` - horizontal drop-off position
    HorizontalDropOff,
    /// `SETVDROP` - vertical drop-off position
    VerticalDropOff,
}

/// One `<slot>x<quantity>` pair as written by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GrabPair {
    /// Requested slot (not yet range-checked)
    pub slot: i32,
    /// Requested quantity (not yet range-checked)
    pub quantity: i32,
}

/// A tokenised GRAB pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairToken {
    /// Syntactically valid pair
    Pair(GrabPair),
    /// Missing `x` separator, empty side or non-numeric field
    Malformed,
}

/// Pairs of a GRAB command in input order
pub type GrabList = Vec<PairToken, MAX_GRAB_PAIRS>;

/// A parsed protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `HANDSHAKE` - host announces itself
    Handshake,
    /// `CALIBRATE` - home both axes
    Calibrate,
    /// `GRAB<slot>x<qty>[,...]` - dispense a batch
    Grab(GrabList),
    /// `GO<x>,<y>` - move both axes to absolute positions
    Go { horizontal: i32, vertical: i32 },
    /// `SET<target>,<value>` - update a grid entry
    Set { target: SetTarget, value: i32 },
    /// `STOP` - abort the running job and halt both axes
    Stop,
    /// `STATUS` - report controller state and positions
    Status,
}

impl Command {
    /// Parse a command from a trimmed line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        match line {
            "HANDSHAKE" => return Ok(Command::Handshake),
            "CALIBRATE" => return Ok(Command::Calibrate),
            "STOP" => return Ok(Command::Stop),
            "STATUS" => return Ok(Command::Status),
            _ => {}
        }

        // GRAB must be tried before GO, they share a prefix
        if let Some(body) = line.strip_prefix("GRAB") {
            parse_grab(arguments(body)).map(Command::Grab)
        } else if let Some(body) = line.strip_prefix("GO") {
            parse_go(arguments(body))
        } else if let Some(body) = line.strip_prefix("SET") {
            parse_set(arguments(body))
        } else {
            Err(ParseError::UnknownCommand)
        }
    }

    /// Whether this command may run while a motion job is active
    pub fn allowed_while_busy(&self) -> bool {
        matches!(self, Command::Stop | Command::Status)
    }
}

/// Strip the optional space between verb and arguments
fn arguments(body: &str) -> &str {
    body.strip_prefix(' ').unwrap_or(body).trim()
}

/// Parse `<slot>x<qty>[,<slot>x<qty>...]`
fn parse_grab(body: &str) -> Result<GrabList, ParseError> {
    if body.is_empty() {
        return Err(ParseError::InvalidFormat);
    }

    let mut pairs = GrabList::new();
    for token in body.split(',') {
        pairs
            .push(parse_pair(token.trim()))
            .map_err(|_| ParseError::InvalidFormat)?;
    }
    Ok(pairs)
}

fn parse_pair(token: &str) -> PairToken {
    let Some(x_idx) = token.find('x') else {
        return PairToken::Malformed;
    };
    if x_idx == 0 || x_idx == token.len() - 1 {
        return PairToken::Malformed;
    }

    let slot = token[..x_idx].parse::<i32>();
    let quantity = token[x_idx + 1..].parse::<i32>();
    match (slot, quantity) {
        (Ok(slot), Ok(quantity)) => PairToken::Pair(GrabPair { slot, quantity }),
        _ => PairToken::Malformed,
    }
}

/// Parse `<x>,<y>`
fn parse_go(body: &str) -> Result<Command, ParseError> {
    let (x, y) = body.split_once(',').ok_or(ParseError::InvalidGoFormat)?;
    let horizontal = x.trim().parse().map_err(|_| ParseError::InvalidGoFormat)?;
    let vertical = y.trim().parse().map_err(|_| ParseError::InvalidGoFormat)?;
    Ok(Command::Go {
        horizontal,
        vertical,
    })
}

/// Parse `C<n>,<v>` / `R<n>,<v>` / `HDROP,<v>` / `VDROP,<v>`
fn parse_set(body: &str) -> Result<Command, ParseError> {
    let (name, value) = body.split_once(',').ok_or(ParseError::InvalidSetFormat)?;
    let name = name.trim();

    let target = if let Some(index) = name.strip_prefix('C') {
        SetTarget::Column(index.parse().map_err(|_| ParseError::InvalidColumn)?)
    } else if let Some(index) = name.strip_prefix('R') {
        SetTarget::Row(index.parse().map_err(|_| ParseError::InvalidRow)?)
    } else if name == "HDROP" {
        SetTarget::HorizontalDropOff
    } else if name == "VDROP" {
        SetTarget::VerticalDropOff
    } else {
        return Err(ParseError::InvalidSetTarget);
    };

    let value = value
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidSetFormat)?;

    Ok(Command::Set { target, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(slot: i32, quantity: i32) -> PairToken {
        PairToken::Pair(GrabPair { slot, quantity })
    }

    #[test]
    fn test_bare_verbs() {
        assert_eq!(Command::parse("HANDSHAKE"), Ok(Command::Handshake));
        assert_eq!(Command::parse("CALIBRATE"), Ok(Command::Calibrate));
        assert_eq!(Command::parse("STOP"), Ok(Command::Stop));
        assert_eq!(Command::parse("STATUS"), Ok(Command::Status));
    }

    #[test]
    fn test_verbs_are_case_sensitive() {
        assert_eq!(Command::parse("calibrate"), Err(ParseError::UnknownCommand));
        assert_eq!(Command::parse("Go1,2"), Err(ParseError::UnknownCommand));
        assert_eq!(Command::parse("HELLO"), Err(ParseError::UnknownCommand));
    }

    #[test]
    fn test_grab_pairs() {
        let Ok(Command::Grab(pairs)) = Command::parse("GRAB01x02,09x01") else {
            panic!("expected GRAB");
        };
        assert_eq!(pairs.as_slice(), &[pair(1, 2), pair(9, 1)]);
    }

    #[test]
    fn test_grab_with_space() {
        let Ok(Command::Grab(pairs)) = Command::parse("GRAB 03x01") else {
            panic!("expected GRAB");
        };
        assert_eq!(pairs.as_slice(), &[pair(3, 1)]);
    }

    #[test]
    fn test_grab_keeps_out_of_range_numbers() {
        // Range checks belong to the sequencer
        let Ok(Command::Grab(pairs)) = Command::parse("GRAB00x01,03x02") else {
            panic!("expected GRAB");
        };
        assert_eq!(pairs.as_slice(), &[pair(0, 1), pair(3, 2)]);
    }

    #[test]
    fn test_grab_malformed_pairs_are_marked() {
        let Ok(Command::Grab(pairs)) = Command::parse("GRAB01x02,x3,4x,05,ax1,") else {
            panic!("expected GRAB");
        };
        assert_eq!(pairs[0], pair(1, 2));
        for token in &pairs[1..] {
            assert_eq!(*token, PairToken::Malformed);
        }
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn test_grab_empty_or_oversized() {
        assert_eq!(Command::parse("GRAB"), Err(ParseError::InvalidFormat));
        assert_eq!(Command::parse("GRAB "), Err(ParseError::InvalidFormat));

        let mut line: heapless::String<256> = heapless::String::new();
        line.push_str("GRAB").unwrap();
        for _ in 0..=MAX_GRAB_PAIRS {
            line.push_str("1x1,").unwrap();
        }
        line.pop();
        assert_eq!(Command::parse(&line), Err(ParseError::InvalidFormat));
    }

    #[test]
    fn test_go() {
        assert_eq!(
            Command::parse("GO1000,7000"),
            Ok(Command::Go {
                horizontal: 1000,
                vertical: 7000
            })
        );
        assert_eq!(
            Command::parse("GO -5, 20"),
            Ok(Command::Go {
                horizontal: -5,
                vertical: 20
            })
        );
    }

    #[test]
    fn test_go_invalid() {
        assert_eq!(Command::parse("GO1000"), Err(ParseError::InvalidGoFormat));
        assert_eq!(Command::parse("GO"), Err(ParseError::InvalidGoFormat));
        assert_eq!(Command::parse("GOa,b"), Err(ParseError::InvalidGoFormat));
        assert_eq!(Command::parse("GO1,"), Err(ParseError::InvalidGoFormat));
    }

    #[test]
    fn test_set_targets() {
        assert_eq!(
            Command::parse("SETC1,150"),
            Ok(Command::Set {
                target: SetTarget::Column(1),
                value: 150
            })
        );
        assert_eq!(
            Command::parse("SET C3,999"),
            Ok(Command::Set {
                target: SetTarget::Column(3),
                value: 999
            })
        );
        assert_eq!(
            Command::parse("SETR2,5000"),
            Ok(Command::Set {
                target: SetTarget::Row(2),
                value: 5000
            })
        );
        assert_eq!(
            Command::parse("SETHDROP,1234"),
            Ok(Command::Set {
                target: SetTarget::HorizontalDropOff,
                value: 1234
            })
        );
        assert_eq!(
            Command::parse("SETVDROP,-7"),
            Ok(Command::Set {
                target: SetTarget::VerticalDropOff,
                value: -7
            })
        );
    }

    #[test]
    fn test_set_errors() {
        assert_eq!(Command::parse("SETX1,5"), Err(ParseError::InvalidSetTarget));
        assert_eq!(Command::parse("SETC1"), Err(ParseError::InvalidSetFormat));
        assert_eq!(Command::parse("SETC1,abc"), Err(ParseError::InvalidSetFormat));
        assert_eq!(Command::parse("SETCx,5"), Err(ParseError::InvalidColumn));
        assert_eq!(Command::parse("SETR,5"), Err(ParseError::InvalidRow));
    }

    #[test]
    fn test_set_out_of_range_index_passes_through() {
        // The grid table rejects these, not the parser
        assert_eq!(
            Command::parse("SETC9,5"),
            Ok(Command::Set {
                target: SetTarget::Column(9),
                value: 5
            })
        );
        assert_eq!(
            Command::parse("SETR4,5"),
            Ok(Command::Set {
                target: SetTarget::Row(4),
                value: 5
            })
        );
    }

    #[test]
    fn test_allowed_while_busy() {
        assert!(Command::Stop.allowed_while_busy());
        assert!(Command::Status.allowed_while_busy());
        assert!(!Command::Calibrate.allowed_while_busy());
        assert!(!Command::Handshake.allowed_while_busy());
    }

    #[test]
    fn test_parse_error_codes() {
        assert_eq!(
            ErrorCode::from(ParseError::InvalidSetTarget),
            ErrorCode::InvalidSetTarget
        );
        assert_eq!(
            ErrorCode::from(ParseError::InvalidFormat),
            ErrorCode::InvalidFormat
        );
    }
}
