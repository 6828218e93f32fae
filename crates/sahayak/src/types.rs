//! `run_sse` wire types

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// One part of a message; only text parts are sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Body of `POST /run_sse`. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: Content,
    pub streaming: bool,
}

impl AgentRequest {
    pub fn new(session: &Session, text: impl Into<String>) -> Self {
        Self {
            app_name: session.app_name.clone(),
            user_id: session.user_id.clone(),
            session_id: session.session_id.clone(),
            new_message: Content::user_text(text),
            streaming: false,
        }
    }
}
