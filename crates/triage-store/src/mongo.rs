use crate::error::{Result, StoreError};
use crate::models::{ThreadRecord, TurnRecord};
use crate::store::ThreadStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

/// MongoDB-backed thread store (`threads` and `turns` collections).
#[derive(Clone)]
pub struct MongoStore {
    threads: Collection<ThreadRecord>,
    turns: Collection<TurnRecord>,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(&client, db_name))
    }

    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            threads: db.collection("threads"),
            turns: db.collection("turns"),
        }
    }
}

#[async_trait]
impl ThreadStore for MongoStore {
    async fn create_thread(&self, owner_id: &str, title: &str) -> Result<ThreadRecord> {
        let thread = ThreadRecord::new(owner_id, title);
        self.threads.insert_one(&thread).await?;
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.threads.find_one(filter).await?)
    }

    async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<ThreadRecord>> {
        let filter = doc! { "owner_id": owner_id };
        let mut find = self.threads.find(filter).sort(doc! { "updated_at": -1 });
        if let Some(limit) = limit {
            find = find.limit(limit);
        }
        Ok(find.await?.try_collect().await?)
    }

    async fn delete_thread(&self, thread_id: &str, owner_id: &str) -> Result<()> {
        let thread = self
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        if thread.owner_id != owner_id {
            return Err(StoreError::NotOwner(thread_id.to_string()));
        }

        // Turns first, so a crash in between leaves no orphaned turns
        self.turns
            .delete_many(doc! { "thread_id": thread_id })
            .await?;
        self.threads.delete_one(doc! { "_id": thread_id }).await?;
        tracing::debug!(thread_id = %thread_id, "thread deleted");
        Ok(())
    }

    async fn append_turn(&self, turn: TurnRecord) -> Result<()> {
        let thread_filter = doc! { "_id": &turn.thread_id };
        // chrono timestamps round-trip through serde, so the update must
        // write the same representation insert_one produced
        let update = doc! {
            "$set": { "updated_at": bson::to_bson(&chrono::Utc::now())? }
        };
        let result = self.threads.update_one(thread_filter, update).await?;
        if result.matched_count == 0 {
            return Err(StoreError::ThreadNotFound(turn.thread_id.clone()));
        }

        self.turns.insert_one(&turn).await?;
        Ok(())
    }

    async fn list_turns(&self, thread_id: &str, limit: i64) -> Result<Vec<TurnRecord>> {
        let filter = doc! { "thread_id": thread_id };
        // newest window: sort descending to take the most recent turns,
        // then restore ascending order for the caller
        let mut turns: Vec<TurnRecord> = self
            .turns
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        turns.reverse();
        Ok(turns)
    }
}
