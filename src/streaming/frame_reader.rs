//! Frame reassembly
//!
//! Turns arbitrarily split byte chunks into complete logical frames. Frames
//! are emitted in arrival order, each exactly once, as soon as their
//! delimiter has been seen. Output does not depend on where the chunk
//! boundaries fell.
//!
//! [`FrameCodec`] is a `tokio_util` [`Decoder`], so a response body is framed
//! with `FramedRead` over a `StreamReader`. [`FrameReader`] drives the same
//! codec from pushed chunks.
//!
//! Every delimiter the codec looks for is ASCII, and UTF-8 continuation bytes
//! never are, so frames are cut on raw bytes and decoded once complete. A
//! character split across chunks is therefore reassembled, and invalid
//! sequences become U+FFFD.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::LlmError;

/// How a byte stream is cut into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDelimiter {
    /// One frame per `\n`-terminated line; `\r\n` accepted, blank lines dropped.
    Line,
    /// Like [`Line`](Self::Line), but blank lines are frames too (as `""`).
    RawLine,
    /// SSE event blocks terminated by a blank line. The frame is the block's
    /// lines joined with `\n`.
    Event,
    /// Balanced top-level JSON objects. Array brackets, commas and whitespace
    /// between objects are ignored, so a streamed `[{..},{..}]` yields one
    /// frame per element.
    JsonObject,
}

#[derive(Debug, Default)]
struct JsonScan {
    depth: usize,
    in_string: bool,
    escaped: bool,
    start: usize,
    pos: usize,
}

/// Frame decoder for one response body.
#[derive(Debug)]
pub struct FrameCodec {
    delimiter: FrameDelimiter,
    /// Bytes of the buffer already searched for `\n`.
    line_scanned: usize,
    event: String,
    json: JsonScan,
    bytes_received: u64,
    buffered: usize,
}

impl FrameCodec {
    pub fn new(delimiter: FrameDelimiter) -> Self {
        Self {
            delimiter,
            line_scanned: 0,
            event: String::new(),
            json: JsonScan::default(),
            bytes_received: 0,
            buffered: 0,
        }
    }

    pub fn delimiter(&self) -> FrameDelimiter {
        self.delimiter
    }

    /// Total body bytes seen so far.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Drop whatever partial frame is buffered; returns it for logging.
    pub fn take_partial(&mut self, src: &mut BytesMut) -> Option<String> {
        let mut leftover = std::mem::take(&mut self.event);
        let rest = src.split();
        if !leftover.is_empty() && !rest.is_empty() {
            leftover.push('\n');
        }
        leftover.push_str(&String::from_utf8_lossy(&rest));
        self.line_scanned = 0;
        self.json = JsonScan::default();
        self.buffered = 0;

        if leftover.trim().is_empty() {
            return None;
        }
        tracing::debug!(
            target: "chat_relay::stream",
            discarded_len = leftover.len(),
            "discarding partial frame at end of body"
        );
        Some(leftover)
    }

    fn next_line(&mut self, src: &mut BytesMut) -> Option<String> {
        let Some(rel) = src[self.line_scanned..].iter().position(|b| *b == b'\n') else {
            self.line_scanned = src.len();
            return None;
        };
        let raw = src.split_to(self.line_scanned + rel + 1);
        self.line_scanned = 0;

        let mut line = &raw[..raw.len() - 1];
        while let [rest @ .., b'\r'] = line {
            line = rest;
        }
        Some(String::from_utf8_lossy(line).into_owned())
    }

    fn next_event(&mut self, src: &mut BytesMut) -> Option<String> {
        while let Some(line) = self.next_line(src) {
            if line.is_empty() {
                let block = std::mem::take(&mut self.event);
                if !block.trim().is_empty() {
                    return Some(block);
                }
            } else {
                if !self.event.is_empty() {
                    self.event.push('\n');
                }
                self.event.push_str(&line);
            }
        }
        None
    }

    fn next_json_object(&mut self, src: &mut BytesMut) -> Option<String> {
        let scan = &mut self.json;

        while scan.pos < src.len() {
            let b = src[scan.pos];
            if scan.depth == 0 {
                if b == b'{' {
                    scan.depth = 1;
                    scan.start = scan.pos;
                }
            } else if scan.in_string {
                if scan.escaped {
                    scan.escaped = false;
                } else if b == b'\\' {
                    scan.escaped = true;
                } else if b == b'"' {
                    scan.in_string = false;
                }
            } else {
                match b {
                    b'"' => scan.in_string = true,
                    b'{' => scan.depth += 1,
                    b'}' => {
                        scan.depth -= 1;
                        if scan.depth == 0 {
                            let object = src.split_to(scan.pos + 1);
                            let frame = String::from_utf8_lossy(&object[scan.start..]).into_owned();
                            *scan = JsonScan::default();
                            return Some(frame);
                        }
                    }
                    _ => {}
                }
            }
            scan.pos += 1;
        }

        // Brackets, commas and whitespace before the next object.
        let consumed = if scan.depth > 0 { scan.start } else { scan.pos };
        src.advance(consumed);
        scan.pos -= consumed;
        scan.start -= consumed.min(scan.start);
        None
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = LlmError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, LlmError> {
        if src.len() > self.buffered {
            self.bytes_received += (src.len() - self.buffered) as u64;
        }

        let frame = match self.delimiter {
            FrameDelimiter::RawLine => self.next_line(src),
            FrameDelimiter::Line => loop {
                match self.next_line(src) {
                    Some(line) if line.trim().is_empty() => continue,
                    other => break other,
                }
            },
            FrameDelimiter::Event => self.next_event(src),
            FrameDelimiter::JsonObject => self.next_json_object(src),
        };

        self.buffered = src.len();
        Ok(frame)
    }

    /// A partial frame left at end of body is discarded, not an error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, LlmError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                self.take_partial(src);
                Ok(None)
            }
        }
    }
}

/// Push-driven frame splitter over [`FrameCodec`].
#[derive(Debug)]
pub struct FrameReader {
    codec: FrameCodec,
    buffer: BytesMut,
}

impl FrameReader {
    pub fn new(delimiter: FrameDelimiter) -> Self {
        Self {
            codec: FrameCodec::new(delimiter),
            buffer: BytesMut::new(),
        }
    }

    pub fn delimiter(&self) -> FrameDelimiter {
        self.codec.delimiter()
    }

    /// Total bytes pushed so far.
    pub fn bytes_received(&self) -> u64 {
        self.codec.bytes_received()
    }

    /// Feed one chunk; returns every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Ok(Some(frame)) = self.codec.decode(&mut self.buffer) {
            frames.push(frame);
        }
        frames
    }

    /// End of body. Any partial frame is discarded and returned for logging.
    pub fn finish(&mut self) -> Option<String> {
        self.codec.take_partial(&mut self.buffer)
    }
}
