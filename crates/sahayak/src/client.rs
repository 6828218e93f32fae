//! Agent backend client
//!
//! [`AgentClient`] issues the two backend calls: session creation and
//! `run_sse`. [`FlowSession`] is the session-scoped object a caller keeps
//! per flow: it holds the established session and wraps both calls in the
//! retry policy.
//!
//! Requests are not cancellable and carry no per-call timeout; the only
//! time limit is the retry budget, checked between attempts.

use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::extract::{extract, Extracted};
use crate::flow::Flow;
use crate::network::with_retry;
use crate::session::{Session, SessionRecord};
use crate::streaming::last_json_event;
use crate::types::AgentRequest;

/// HTTP client for the agent backend
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    config: AgentConfig,
}

impl AgentClient {
    pub fn new(config: AgentConfig) -> AgentResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self::with_http_client(http, config))
    }

    pub fn with_http_client(http: reqwest::Client, config: AgentConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Create a session for `app_name` under a freshly generated id.
    ///
    /// Not idempotent: a retried call may leave extra sessions on the
    /// server if an earlier attempt succeeded unobserved.
    pub async fn create_session(&self, app_name: &str) -> AgentResult<Session> {
        let requested_id = Uuid::new_v4().to_string();
        let url = self.config.endpoint(&format!(
            "apps/{}/users/{}/sessions/{}",
            app_name, self.config.user_id, requested_id
        ));
        tracing::debug!(%url, "creating session");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(AgentError::session_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::session_creation(status));
        }

        let record: SessionRecord = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("session body: {}", e)))?;
        let session = Session::from(record);

        tracing::info!(
            requested = %requested_id,
            session_id = %session.session_id,
            user_id = %session.user_id,
            app_name = %session.app_name,
            "session created"
        );
        Ok(session)
    }

    /// Send `text` to the session's agent and return the last JSON payload
    /// the SSE response carried, if any parsed.
    pub async fn run_sse(&self, session: &Session, text: &str) -> AgentResult<Option<Value>> {
        let request = AgentRequest::new(session, text);

        let response = self
            .http
            .post(self.config.endpoint("run_sse"))
            .json(&request)
            .send()
            .await
            .map_err(AgentError::stream_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::stream_request(status));
        }

        let body = response.bytes_stream().map_err(AgentError::stream_transport);
        let result = last_json_event(body).await?;

        match &result {
            Some(_) => tracing::debug!(session_id = %session.session_id, "run_sse finished"),
            None => tracing::warn!(
                session_id = %session.session_id,
                "run_sse finished without a parseable event"
            ),
        }
        Ok(result)
    }
}

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Last parsed event, `None` if no event parsed
    pub raw: Option<Value>,
    pub extracted: Extracted,
}

/// Session-scoped state for one flow.
///
/// Each instance owns its session; instances share nothing but the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct FlowSession {
    client: AgentClient,
    flow: Flow,
    session: Option<Session>,
}

impl FlowSession {
    pub fn new(client: AgentClient, flow: Flow) -> Self {
        Self {
            client,
            flow,
            session: None,
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Return the held session, creating one (with retries) if absent
    pub async fn ensure_session(&mut self) -> AgentResult<Session> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }

        let client = &self.client;
        let app_name = self.flow.app_name();
        let session = with_retry(|| client.create_session(app_name), &client.config.retry).await?;

        self.session = Some(session.clone());
        Ok(session)
    }

    /// Send a prompt through the flow and extract its payload
    pub async fn submit(&mut self, prompt: &str) -> AgentResult<Submission> {
        let session = self.ensure_session().await?;

        let client = &self.client;
        let raw = with_retry(|| client.run_sse(&session, prompt), &client.config.retry).await?;
        let extracted = extract(raw.as_ref(), self.flow.profile());

        tracing::info!(
            flow = %self.flow,
            structured = extracted.is_structured(),
            "submission complete"
        );
        Ok(Submission { raw, extracted })
    }

    /// Forget the held session; the next submission creates a new one
    pub fn reset(&mut self) {
        self.session = None;
    }
}
