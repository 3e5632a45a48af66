//! Fuzz target for envelope decoding and line reassembly
//!
//! # Strategy
//!
//! - Raw text: arbitrary strings fed to `codec::decode` for both directions
//! - Chunked stream: arbitrary bytes split at arbitrary points and fed to a
//!   `LineBuffer`, as a TCP reader would see them
//! - Oversized lines: a partial line past the size limit
//!
//! # Invariants
//!
//! - Decoding never panics; malformed input is a `ProtocolError`
//! - Anything that decodes and re-encodes decodes to the same value
//! - The buffer never holds a partial line longer than `MAX_MESSAGE_SIZE`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use roomchat_proto::{
    codec::{self, LineBuffer, MAX_MESSAGE_SIZE},
    ClientMessage, ServerMessage,
};

#[derive(Debug, Arbitrary)]
enum Input {
    Text(String),
    Stream { bytes: Vec<u8>, cuts: Vec<u16> },
    Oversized { filler: u8, extra: u16 },
}

fn check_round_trip(text: &str) {
    // Re-encoding may legitimately grow past the size limit (timestamps
    // given as millis come back as RFC 3339 strings)
    if let Ok(message) = codec::decode::<ServerMessage>(text) {
        if let Ok(encoded) = codec::encode(&message) {
            assert_eq!(codec::decode::<ServerMessage>(&encoded).unwrap(), message);
        }
    }
    if let Ok(message) = codec::decode::<ClientMessage>(text) {
        if let Ok(encoded) = codec::encode(&message) {
            assert_eq!(codec::decode::<ClientMessage>(&encoded).unwrap(), message);
        }
    }
}

fuzz_target!(|input: Input| {
    match input {
        Input::Text(text) => check_round_trip(&text),
        Input::Stream { bytes, mut cuts } => {
            let mut buffer = LineBuffer::new();
            cuts.sort_unstable();

            let mut start = 0usize;
            for cut in cuts.into_iter().map(usize::from).chain([bytes.len()]) {
                let end = cut.min(bytes.len());
                if end < start {
                    continue;
                }
                if buffer.extend(&bytes[start..end]).is_err() {
                    assert!(buffer.is_empty());
                }
                start = end;

                while let Some(decoded) = buffer.next_message::<ServerMessage>() {
                    if let Ok(line) = decoded.and_then(|m| codec::encode_line(&m)) {
                        assert_eq!(line.last(), Some(&b'\n'));
                    }
                }
                assert!(buffer.len() <= MAX_MESSAGE_SIZE);
            }
        },
        Input::Oversized { filler, extra } => {
            let filler = if filler == b'\n' { b'x' } else { filler };
            let mut buffer = LineBuffer::new();
            let line = vec![filler; MAX_MESSAGE_SIZE + 1 + usize::from(extra)];

            assert!(buffer.extend(&line).is_err());
            assert!(buffer.is_empty());
        },
    }
});
