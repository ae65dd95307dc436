use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single ongoing diagnostic conversation, owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadRecord {
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One persisted turn. Immutable once appended; `created_at` ordering is
/// monotonic non-decreasing within a thread (callers serialize appends
/// per thread).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub role: TurnRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_output: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TurnRecord {
    pub fn new(
        thread_id: impl Into<String>,
        role: TurnRole,
        content: impl Into<String>,
        command: Option<String>,
        command_output: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            role,
            content: content.into(),
            command,
            command_output,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}
