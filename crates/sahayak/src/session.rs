//! Agent backend sessions
//!
//! A [`Session`] names the `{userId, sessionId, appName}` triple every
//! `run_sse` call carries. The backend may echo back different identifiers
//! than the ones requested, so the canonical values always come from the
//! creation response.

use serde::{Deserialize, Serialize};

/// Identifiers of an established backend session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub session_id: String,
    pub app_name: String,
}

/// Body returned by `POST /apps/{app}/users/{user}/sessions/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub app_name: String,
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            session_id: record.id,
            app_name: record.app_name,
        }
    }
}
