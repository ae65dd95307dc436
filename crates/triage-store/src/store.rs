use crate::error::Result;
use crate::models::{ThreadRecord, TurnRecord};
use async_trait::async_trait;

/// Trait for thread/turn persistence operations.
///
/// Threads own an append-only ordered log of turns. Implementations are
/// swappable between durable (MongoDB) and in-memory backends.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Create a new thread owned by `owner_id`.
    async fn create_thread(&self, owner_id: &str, title: &str) -> Result<ThreadRecord>;

    /// Get a thread by ID.
    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>>;

    /// List threads for an owner, most recently updated first.
    async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<ThreadRecord>>;

    /// Delete a thread and all of its turns. Fails with `NotOwner` when the
    /// thread belongs to someone else.
    async fn delete_thread(&self, thread_id: &str, owner_id: &str) -> Result<()>;

    /// Append a turn and bump the thread's `updated_at`.
    async fn append_turn(&self, turn: TurnRecord) -> Result<()>;

    /// List a thread's most recent `limit` turns, in ascending time order.
    /// The window is the newest end of the log: on long threads the oldest
    /// turns fall out first.
    async fn list_turns(&self, thread_id: &str, limit: i64) -> Result<Vec<TurnRecord>>;
}
