//! Sahayak - agent backend client
//!
//! Talks to the teacher-assistant agent backend: establishes sessions,
//! sends prompts over `run_sse`, decodes the SSE response into JSON events
//! and extracts lesson plans and quizzes from the final event.

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod flow;
pub mod network;
pub mod prompt;
pub mod render;
pub mod session;
pub mod streaming;
pub mod types;

pub use client::{AgentClient, FlowSession, Submission};
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult, StreamParseError};
pub use extract::{extract, Extracted, ExtractionProfile};
pub use flow::Flow;
pub use network::{with_retry, RetryConfig, RetryError};
pub use prompt::{LessonPlanRequest, PlanDuration, QuizRequest};
pub use session::Session;
