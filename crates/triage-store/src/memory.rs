use crate::error::{Result, StoreError};
use crate::models::{ThreadRecord, TurnRecord};
use crate::store::ThreadStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory thread store for tests and store-less development runs.
///
/// Appends go through a single write lock, which also gives each thread the
/// serialization the monotonic-timestamp invariant needs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    threads: HashMap<String, ThreadRecord>,
    turns: HashMap<String, Vec<TurnRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn create_thread(&self, owner_id: &str, title: &str) -> Result<ThreadRecord> {
        let thread = ThreadRecord::new(owner_id, title);
        let mut inner = self.inner.write().await;
        inner.turns.insert(thread.id.clone(), Vec::new());
        inner.threads.insert(thread.id.clone(), thread.clone());
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        Ok(self.inner.read().await.threads.get(thread_id).cloned())
    }

    async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<ThreadRecord>> {
        let inner = self.inner.read().await;
        let mut threads: Vec<ThreadRecord> = inner
            .threads
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(limit) = limit {
            threads.truncate(limit.max(0) as usize);
        }
        Ok(threads)
    }

    async fn delete_thread(&self, thread_id: &str, owner_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let thread = inner
            .threads
            .get(thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        if thread.owner_id != owner_id {
            return Err(StoreError::NotOwner(thread_id.to_string()));
        }
        inner.threads.remove(thread_id);
        inner.turns.remove(thread_id);
        Ok(())
    }

    async fn append_turn(&self, mut turn: TurnRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        let thread = inner
            .threads
            .get_mut(&turn.thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(turn.thread_id.clone()))?;
        thread.updated_at = turn.created_at;
        let thread_id = turn.thread_id.clone();

        let log = inner.turns.entry(thread_id).or_default();
        // clamp so ordering stays monotonic even across clock hiccups
        if let Some(last) = log.last() {
            if turn.created_at < last.created_at {
                turn.created_at = last.created_at;
            }
        }
        log.push(turn);
        Ok(())
    }

    async fn list_turns(&self, thread_id: &str, limit: i64) -> Result<Vec<TurnRecord>> {
        let inner = self.inner.read().await;
        let turns = inner.turns.get(thread_id).cloned().unwrap_or_default();
        let skip = turns.len().saturating_sub(limit.max(0) as usize);
        Ok(turns.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TurnRole;

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let store = MemoryStore::new();
        let thread = store.create_thread("alice", "disk issue").await.unwrap();
        let fetched = store.get_thread(&thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.owner_id, "alice");
        assert_eq!(fetched.title, "disk issue");
    }

    #[tokio::test]
    async fn test_append_and_list_turns_in_order() {
        let store = MemoryStore::new();
        let thread = store.create_thread("alice", "t").await.unwrap();

        for i in 0..3 {
            let turn = TurnRecord::new(
                &thread.id,
                TurnRole::Assistant,
                format!("step-{i}"),
                Some(format!("cmd-{i}")),
                None,
            );
            store.append_turn(turn).await.unwrap();
        }

        let turns = store.list_turns(&thread.id, 100).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "step-0");
        assert_eq!(turns[2].content, "step-2");
        assert!(turns.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_list_turns_window_is_the_newest_end() {
        let store = MemoryStore::new();
        let thread = store.create_thread("alice", "t").await.unwrap();

        for i in 0..10 {
            let turn = TurnRecord::new(&thread.id, TurnRole::User, format!("m-{i}"), None, None);
            store.append_turn(turn).await.unwrap();
        }

        let turns = store.list_turns(&thread.id, 3).await.unwrap();
        assert_eq!(turns.len(), 3);
        // most recent turns, still ascending
        assert_eq!(turns[0].content, "m-7");
        assert_eq!(turns[2].content, "m-9");
    }

    #[tokio::test]
    async fn test_append_to_missing_thread_fails() {
        let store = MemoryStore::new();
        let turn = TurnRecord::new("nope", TurnRole::User, "hi", None, None);
        let err = store.append_turn(turn).await.unwrap_err();
        assert!(matches!(err, StoreError::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_checks_owner() {
        let store = MemoryStore::new();
        let thread = store.create_thread("alice", "t").await.unwrap();
        store
            .append_turn(TurnRecord::new(&thread.id, TurnRole::User, "hi", None, None))
            .await
            .unwrap();

        let err = store.delete_thread(&thread.id, "mallory").await.unwrap_err();
        assert!(matches!(err, StoreError::NotOwner(_)));

        store.delete_thread(&thread.id, "alice").await.unwrap();
        assert!(store.get_thread(&thread.id).await.unwrap().is_none());
        assert!(store.list_turns(&thread.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_threads_scoped_to_owner() {
        let store = MemoryStore::new();
        store.create_thread("alice", "a1").await.unwrap();
        store.create_thread("alice", "a2").await.unwrap();
        store.create_thread("bob", "b1").await.unwrap();

        let threads = store.list_threads("alice", None).await.unwrap();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|t| t.owner_id == "alice"));

        let limited = store.list_threads("alice", Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
