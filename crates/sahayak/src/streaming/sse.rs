//! Server-Sent Events (SSE) Parser
//!
//! Turns a chunked byte stream into the JSON payloads carried by its events:
//! - Lines are split at the byte level, so multi-byte characters cut across
//!   chunk boundaries are reassembled before decoding
//! - Events end at a blank line; multi-line `data:` fields are joined with `\n`
//! - Comment lines (`:`) and other fields (`event:`, `id:`, `retry:`) are skipped
//! - A payload that is not valid JSON is logged and dropped; the stream goes on
//!

use futures::stream::{Stream, StreamExt};
use serde_json::Value;

use crate::error::StreamParseError;

/// Characters of a payload kept in log lines and parse errors
const PREVIEW_CHARS: usize = 200;

/// A dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Joined `data:` lines of the event
    pub data: String,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Parse the data as JSON
    pub fn parse_json(&self) -> Result<Value, StreamParseError> {
        serde_json::from_str(&self.data).map_err(|source| StreamParseError {
            preview: preview(&self.data),
            source,
        })
    }
}

/// SSE Event Decoder
/// Accumulates `data:` lines until a blank line dispatches them
#[derive(Debug, Default)]
pub struct SseDecoder {
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a single line (without its terminator).
    /// Returns the completed event when the line is an event boundary.
    pub fn decode(&mut self, line: &str) -> Option<SseEvent> {
        if line.trim().is_empty() {
            return self.flush();
        }

        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data_lines.push(value.to_string());
        }

        // Comments and every other field are not interpreted
        None
    }

    /// Dispatch whatever data is pending, as if a blank line had arrived
    pub fn flush(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            return None;
        }

        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        Some(SseEvent { data })
    }

    pub fn has_pending_data(&self) -> bool {
        !self.data_lines.is_empty()
    }
}

/// Newline Decoder for byte-level buffering
/// Splits on LF and drops a preceding CR
#[derive(Debug, Default)]
pub struct NewlineDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to contain no LF
    scanned: usize,
}

impl NewlineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk of bytes, extracting complete lines
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start + self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
        {
            let end = start + self.scanned + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
            self.scanned = 0;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        lines
    }

    /// Flush remaining buffer as final line
    pub fn flush(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            return None;
        }

        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Incremental decoder from SSE bytes to JSON payloads.
///
/// Owned by a single in-flight request; feed it chunks in arrival order and
/// call [`finish`](Self::finish) once the byte stream ends.
#[derive(Debug, Default)]
pub struct SseJsonDecoder {
    lines: NewlineDecoder,
    events: SseDecoder,
}

impl SseJsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process incoming bytes, returning the payloads of completed events
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        let mut values = Vec::new();
        for line in self.lines.decode(chunk) {
            if let Some(event) = self.events.decode(&line) {
                values.extend(dispatch(&event));
            }
        }
        values
    }

    /// Flush the partial line and any pending event data
    pub fn finish(&mut self) -> Vec<Value> {
        let mut values = Vec::new();
        if let Some(line) = self.lines.flush() {
            if let Some(event) = self.events.decode(&line) {
                values.extend(dispatch(&event));
            }
        }
        if let Some(event) = self.events.flush() {
            values.extend(dispatch(&event));
        }
        values
    }
}

fn dispatch(event: &SseEvent) -> Option<Value> {
    tracing::debug!(payload = %preview(&event.data), "processing SSE event");
    match event.parse_json() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "discarding malformed SSE event");
            None
        }
    }
}

fn preview(data: &str) -> String {
    let mut chars = data.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Lazily decode a byte stream into the JSON payloads of its events.
///
/// The first error from the underlying stream is yielded and ends the
/// sequence; malformed events are skipped.
pub fn json_events<S, B, E>(chunks: S) -> impl Stream<Item = Result<Value, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::try_stream! {
        let mut decoder = SseJsonDecoder::new();
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            for value in decoder.feed(chunk.as_ref()) {
                yield value;
            }
        }

        for value in decoder.finish() {
            yield value;
        }
    }
}

/// Drain a byte stream and keep the last payload that parsed.
///
/// Every parseable event overwrites the previous one, intermediate
/// "thinking" events included.
pub async fn last_json_event<S, B, E>(chunks: S) -> Result<Option<Value>, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let events = json_events(chunks);
    futures::pin_mut!(events);

    let mut last = None;
    while let Some(value) = events.next().await {
        last = Some(value?);
    }
    Ok(last)
}
