// src/stream/parser.rs — Incremental NDJSON decoder for the response body
//
// Bytes arrive in arbitrary chunks. A chunk may end in the middle of a line or
// in the middle of a multi-byte UTF-8 character, so both the undecoded byte
// tail and the undelimited text tail are carried over to the next feed.

use super::event::StreamEvent;
use crate::infra::errors::GenStreamError;
use crate::util::preview;

/// Result of decoding one line. Malformed lines never show up here; they are
/// logged and dropped unless the consecutive-failure limit trips, in which case
/// a single `Err(Protocol)` is yielded and the parser stops.
pub type ParsedItem = Result<StreamEvent, GenStreamError>;

#[derive(Debug, Default)]
pub struct ChunkParser {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    buffer: String,
    /// 0 = unbounded.
    failure_limit: u32,
    consecutive_failures: u32,
    discarded: u64,
    tripped: bool,
}

impl ChunkParser {
    /// A parser that drops malformed lines forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser that gives up after more than `limit` malformed lines in a row.
    pub fn with_failure_limit(limit: u32) -> Self {
        Self {
            failure_limit: limit,
            ..Self::default()
        }
    }

    /// Decode `chunk` and return every complete record it finished.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ParsedItem> {
        if self.tripped {
            return Vec::new();
        }
        self.decode(chunk);

        let mut items = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if self.parse_line(&line, &mut items) {
                break;
            }
        }
        items
    }

    /// Flush at end of body: an unterminated final line is parsed by the same
    /// rule as any other line.
    pub fn finish(&mut self) -> Vec<ParsedItem> {
        if self.tripped {
            return Vec::new();
        }
        if !self.pending.is_empty() {
            // Truncated multi-byte sequence at EOF.
            self.pending.clear();
            self.buffer.push(char::REPLACEMENT_CHARACTER);
        }
        let rest = std::mem::take(&mut self.buffer);
        let mut items = Vec::new();
        self.parse_line(&rest, &mut items);
        items
    }

    /// Lines dropped because they were not valid JSON records.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// True when nothing is held back waiting for more bytes.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.buffer.is_empty()
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for the next chunk.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    /// Returns true when the failure limit tripped and parsing must stop.
    fn parse_line(&mut self, raw: &str, items: &mut Vec<ParsedItem>) -> bool {
        let line = raw.trim();
        if line.is_empty() {
            return false;
        }

        match serde_json::from_str::<StreamEvent>(line) {
            Ok(event) => {
                self.consecutive_failures = 0;
                items.push(Ok(event));
                false
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.discarded += 1;
                tracing::warn!(
                    consecutive = self.consecutive_failures,
                    "Discarding malformed stream line {:?}: {}",
                    preview(line, 120),
                    e
                );
                if self.failure_limit > 0 && self.consecutive_failures > self.failure_limit {
                    self.tripped = true;
                    self.buffer.clear();
                    self.pending.clear();
                    items.push(Err(GenStreamError::Protocol {
                        failures: self.consecutive_failures,
                        last_error: e.to_string(),
                    }));
                    return true;
                }
                false
            }
        }
    }
}
