//! Incremental decoding of a stream of JSON values
//!
//! Output arrives in chunks of arbitrary size, so a value may be split across
//! any number of chunks (including inside a multi-byte UTF-8 sequence). The
//! decoder buffers the unconsumed tail and yields each value as soon as it is
//! syntactically closed.
//!
//! Each byte is scanned once: a small state machine tracks nesting depth and
//! string escapes to find where a top-level value ends, and only then is the
//! value handed to `serde_json`. Syntax errors inside an unclosed container
//! therefore surface when the container closes or the stream ends.

use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Scan {
    /// Between top-level values.
    #[default]
    Between,
    /// Inside an object or array, outside any string.
    Nested,
    /// Inside a string literal.
    Text { escaped: bool },
    /// Inside a bare number or literal, which ends at the next delimiter.
    Bare,
}

#[derive(Debug, Default)]
pub struct JsonStreamDecoder {
    buffer: Vec<u8>,
    // Prefix of `buffer` the scanner has already examined.
    scanned: usize,
    scan: Scan,
    depth: usize,
    // Offset in `buffer` where the pending top-level value begins.
    start: Option<usize>,
    decoded: usize,
    // Error found behind values that were already returned.
    deferred: Option<serde_json::Error>,
}

fn ends_bare_value(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'{' | b'}' | b'[' | b']' | b'"' | b',' | b':')
}

impl JsonStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values produced so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Appends a chunk and returns every value it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Value>, serde_json::Error> {
        self.buffer.extend_from_slice(chunk);
        self.drain(false)
    }

    /// Flushes the buffer at end of stream. Trailing bytes that do not form a
    /// complete value are an error.
    pub fn finish(&mut self) -> Result<Vec<Value>, serde_json::Error> {
        self.drain(true)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.scan = Scan::Between;
        self.depth = 0;
        self.start = None;
    }

    /// Advances the scanner by one byte. Returns the exclusive end of a
    /// top-level value when `byte` completes one, and whether `byte` was
    /// consumed (a bare value ends *before* its delimiter).
    fn step(&mut self, position: usize, byte: u8) -> (Option<usize>, bool) {
        match self.scan {
            Scan::Between => {
                if byte.is_ascii_whitespace() {
                    return (None, true);
                }
                self.start = Some(position);
                match byte {
                    b'{' | b'[' => {
                        self.depth = 1;
                        self.scan = Scan::Nested;
                    }
                    b'"' => self.scan = Scan::Text { escaped: false },
                    // A stray delimiter is a value of its own; serde reports it.
                    b'}' | b']' | b',' | b':' => return (Some(position + 1), true),
                    _ => self.scan = Scan::Bare,
                }
                (None, true)
            }
            Scan::Nested => {
                match byte {
                    b'"' => self.scan = Scan::Text { escaped: false },
                    b'{' | b'[' => self.depth += 1,
                    b'}' | b']' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            self.scan = Scan::Between;
                            return (Some(position + 1), true);
                        }
                    }
                    _ => {}
                }
                (None, true)
            }
            Scan::Text { escaped: true } => {
                self.scan = Scan::Text { escaped: false };
                (None, true)
            }
            Scan::Text { escaped: false } => {
                match byte {
                    b'\\' => self.scan = Scan::Text { escaped: true },
                    b'"' if self.depth == 0 => {
                        self.scan = Scan::Between;
                        return (Some(position + 1), true);
                    }
                    b'"' => self.scan = Scan::Nested,
                    _ => {}
                }
                (None, true)
            }
            Scan::Bare => {
                if ends_bare_value(byte) {
                    self.scan = Scan::Between;
                    return (Some(position), false);
                }
                (None, true)
            }
        }
    }

    fn drain(&mut self, at_eof: bool) -> Result<Vec<Value>, serde_json::Error> {
        if let Some(err) = self.deferred.take() {
            self.reset();
            return Err(err);
        }

        let mut values = Vec::new();
        let mut consumed = 0;
        let mut failure = None;

        let mut position = self.scanned;
        while position < self.buffer.len() {
            let byte = self.buffer[position];
            let (end, advance) = self.step(position, byte);
            if advance {
                position += 1;
            }
            let Some(end) = end else { continue };
            let start = self.start.take().unwrap_or(end);
            match serde_json::from_slice(&self.buffer[start..end]) {
                Ok(value) => {
                    values.push(value);
                    consumed = end;
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.scanned = position;

        if failure.is_none() && at_eof {
            if let Some(start) = self.start.take() {
                match serde_json::from_slice(&self.buffer[start..]) {
                    Ok(value) => values.push(value),
                    Err(err) => failure = Some(err),
                }
            }
            self.scan = Scan::Between;
            self.depth = 0;
            consumed = self.buffer.len();
        }

        self.decoded += values.len();

        if let Some(err) = failure {
            self.reset();
            if values.is_empty() {
                return Err(err);
            }
            self.deferred = Some(err);
            return Ok(values);
        }

        if self.start.is_none() {
            // Only whitespace follows the last value.
            consumed = self.scanned;
        }
        if consumed > 0 {
            self.buffer.drain(..consumed);
            self.scanned -= consumed;
            if let Some(start) = self.start.as_mut() {
                *start -= consumed;
            }
        }
        Ok(values)
    }
}
