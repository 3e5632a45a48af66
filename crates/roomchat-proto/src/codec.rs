//! JSON codec and line framing.
//!
//! Message-oriented transports (WebSocket text frames) carry one encoded
//! envelope per message. Stream transports (TCP) separate envelopes with a
//! single `\n`; serde_json never emits a raw newline inside a value, so the
//! delimiter is unambiguous.
//!
//! # Invariants
//!
//! - No encoded message exceeds [`MAX_MESSAGE_SIZE`] bytes (excluding the line
//!   delimiter). Oversized input is rejected on both encode and decode.
//! - [`LineBuffer`] yields complete lines in arrival order and never splits a
//!   message across two yields.

use serde::{Serialize, de::DeserializeOwned};

use crate::errors::{ProtocolError, Result};

/// Largest accepted encoded message, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Line delimiter for stream transports.
const DELIMITER: u8 = b'\n';

/// Encode a message as a JSON string.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    let text = serde_json::to_string(message)?;
    check_size(text.len())?;
    Ok(text)
}

/// Decode a message from a JSON string.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProtocolError::Empty);
    }
    check_size(text.len())?;
    Ok(serde_json::from_str(text)?)
}

/// Encode a message followed by the line delimiter.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut bytes = encode(message)?.into_bytes();
    bytes.push(DELIMITER);
    Ok(bytes)
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size, max: MAX_MESSAGE_SIZE });
    }
    Ok(())
}

/// Reassembles newline-delimited messages from arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    ///
    /// # Errors
    ///
    /// `MessageTooLarge` if the pending partial line grows beyond
    /// [`MAX_MESSAGE_SIZE`]. The buffer is cleared so the stream can be
    /// dropped or resynchronized by the caller.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);

        let pending = self.buf.iter().rposition(|&b| b == DELIMITER).map_or(self.buf.len(), |pos| {
            self.buf.len().saturating_sub(pos.saturating_add(1))
        });
        if pending > MAX_MESSAGE_SIZE {
            self.buf.clear();
            return Err(ProtocolError::MessageTooLarge { size: pending, max: MAX_MESSAGE_SIZE });
        }
        Ok(())
    }

    /// Take the next complete line, decoded. `None` if no full line is
    /// buffered. Blank lines are skipped.
    pub fn next_message<T: DeserializeOwned>(&mut self) -> Option<Result<T>> {
        loop {
            let pos = self.buf.iter().position(|&b| b == DELIMITER)?;
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = match std::str::from_utf8(&line) {
                Ok(text) => text,
                Err(e) => return Some(Err(ProtocolError::Json(e.to_string()))),
            };
            if text.trim().is_empty() {
                continue;
            }
            return Some(decode(text));
        }
    }

    /// Number of buffered bytes not yet yielded.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
