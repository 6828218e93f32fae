//! Streaming Module
//!
//! SSE (Server-Sent Events) decoding for `run_sse` responses.
//!

pub mod sse;

// Re-exports
pub use sse::{json_events, last_json_event, NewlineDecoder, SseDecoder, SseEvent, SseJsonDecoder};
