//! Property tests for the line reader and command parser

use medpick_protocol::{Command, LineReader, PairToken, Response, MAX_LINE_LEN};
use proptest::prelude::*;

proptest! {
    #[test]
    fn parser_never_panics(line in "\\PC{0,140}") {
        let _ = Command::parse(&line);
    }

    #[test]
    fn reader_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = LineReader::new();
        for byte in bytes {
            let _ = reader.feed(byte);
            prop_assert!(reader.pending() <= MAX_LINE_LEN);
        }
    }

    #[test]
    fn go_roundtrips_any_coordinates(x in any::<i32>(), y in any::<i32>()) {
        let mut line = heapless::String::<40>::new();
        core::fmt::write(&mut line, format_args!("GO{},{}", x, y)).unwrap();
        prop_assert_eq!(
            Command::parse(&line),
            Ok(Command::Go { horizontal: x, vertical: y })
        );
    }

    #[test]
    fn grab_keeps_pair_order(pairs in proptest::collection::vec((0i32..100, 0i32..100), 1..10)) {
        let mut line = String::from("GRAB");
        for (i, (slot, qty)) in pairs.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&format!("{:02}x{:02}", slot, qty));
        }

        let Ok(Command::Grab(parsed)) = Command::parse(&line) else {
            panic!("expected GRAB for {line}");
        };
        prop_assert_eq!(parsed.len(), pairs.len());
        for (token, (slot, qty)) in parsed.iter().zip(pairs.iter()) {
            match token {
                PairToken::Pair(pair) => {
                    prop_assert_eq!(pair.slot, *slot);
                    prop_assert_eq!(pair.quantity, *qty);
                }
                PairToken::Malformed => prop_assert!(false, "pair marked malformed"),
            }
        }
    }

    #[test]
    fn status_line_always_fits(h in any::<i32>(), v in any::<i32>()) {
        let response = Response::Status {
            state: "AWAITING_HANDSHAKE",
            calibration: "UNCALIBRATED",
            horizontal: h,
            vertical: v,
        };
        let line = response.to_line();
        let expected_suffix = format!("V:{}", v);
        prop_assert!(line.ends_with(&expected_suffix));
    }
}

#[test]
fn reader_feeds_parser() {
    let mut reader = LineReader::new();
    let (_, line) = reader.feed_bytes(b"SET C3,999\r\n");
    let line = line.unwrap().unwrap();
    assert!(matches!(
        Command::parse(&line),
        Ok(Command::Set { value: 999, .. })
    ));
}
