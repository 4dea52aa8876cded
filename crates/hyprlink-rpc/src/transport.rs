//! Brace-delimited transport codec for JSON objects.
//!
//! Peers stream bare JSON objects back to back with no length prefix and no
//! newline delimiter. A frame ends at the `}` that closes the opening `{`;
//! braces inside string literals (including escaped quotes) do not count.
//!
//! ```text
//! {"type":"ping"}{"type":"action","id":"media_play","value":0}
//! ^-------------^^-------------------------------------------^
//!     frame 1                       frame 2
//! ```
//!
//! Whitespace between frames is skipped. Anything else outside an object is a
//! framing error and ends the connection.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Maximum message size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Codec for whole-object delimited JSON messages.
///
/// Scan state is kept across calls so a large object arriving in many reads
/// is only scanned once.
#[derive(Debug, Default)]
pub struct JsonObjectCodec {
    scanned: usize,
    depth: u32,
    in_string: bool,
    escaped: bool,
}

impl JsonObjectCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the scanner over `bytes`, returning the frame length once the
    /// outermost object closes.
    fn scan(&mut self, bytes: &[u8]) -> Option<usize> {
        for (offset, &byte) in bytes.iter().enumerate().skip(self.scanned) {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' => self.depth += 1,
                b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(offset + 1);
                    }
                }
                _ => {}
            }
        }

        self.scanned = bytes.len();
        None
    }
}

impl Decoder for JsonObjectCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.scanned == 0 {
            let whitespace = src.iter().take_while(|b| b.is_ascii_whitespace()).count();
            src.advance(whitespace);

            match src.first() {
                None => return Ok(None),
                Some(b'{') => {}
                Some(&other) => return Err(CodecError::InvalidFrame(other)),
            }
        }

        let Some(length) = self.scan(src) else {
            if src.len() > MAX_MESSAGE_SIZE {
                return Err(CodecError::MessageTooLarge(src.len()));
            }
            return Ok(None);
        };

        let payload = src.split_to(length);
        self.reset();

        let json_str = std::str::from_utf8(&payload)?;
        let value: Value = serde_json::from_str(json_str)?;

        Ok(Some(value))
    }
}

impl<T: Serialize> Encoder<T> for JsonObjectCodec {
    type Error = CodecError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)?;

        if json.len() > MAX_MESSAGE_SIZE {
            return Err(CodecError::MessageTooLarge(json.len()));
        }

        dst.reserve(json.len());
        dst.put_slice(&json);

        Ok(())
    }
}
