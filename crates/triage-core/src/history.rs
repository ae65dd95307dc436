use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One exchange unit in a diagnostic thread.
///
/// Immutable once created; ordering within a thread follows `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Commands already issued in this thread, most recent occurrence wins,
/// capped at the last `limit` in chronological order.
pub fn recent_commands(history: &[HistoryEntry], limit: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for entry in history.iter().rev() {
        if let Some(cmd) = &entry.command {
            if !cmd.is_empty() && !seen.iter().any(|c| c == cmd) {
                seen.push(cmd.clone());
            }
        }
        if seen.len() == limit {
            break;
        }
    }
    seen.reverse();
    seen
}
