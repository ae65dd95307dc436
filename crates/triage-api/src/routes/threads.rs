use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::routes::diagnose::TurnView;
use crate::state::AppState;
use triage_store::ThreadRecord;

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListThreadsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadResponse>,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ListTurnsResponse {
    pub thread_id: String,
    pub turns: Vec<TurnView>,
}

/// Create a new (empty) thread
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let owner_id = state.verifier.authenticate(&headers)?;
    let title = req.title.filter(|t| !t.trim().is_empty());
    let thread = state
        .store
        .create_thread(&owner_id, title.as_deref().unwrap_or("New Chat"))
        .await?;

    Ok((StatusCode::CREATED, Json(thread_to_response(thread))))
}

/// List the caller's threads, most recently updated first
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListThreadsQuery>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let owner_id = state.verifier.authenticate(&headers)?;
    let limit = query.limit.clamp(1, 100);

    let threads = state.store.list_threads(&owner_id, Some(limit)).await?;

    let has_more = threads.len() as i64 == limit;
    let threads = threads.into_iter().map(thread_to_response).collect();

    Ok(Json(ListThreadsResponse { threads, has_more }))
}

/// Get a specific thread by ID
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let owner_id = state.verifier.authenticate(&headers)?;
    let thread = super::diagnose::owned_thread(&state, &thread_id, &owner_id).await?;
    Ok(Json(thread_to_response(thread)))
}

/// Delete a thread, cascading to its turns
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    let owner_id = state.verifier.authenticate(&headers)?;
    state.store.delete_thread(&thread_id, &owner_id).await?;
    state.release_thread_lock(&thread_id);
    Ok(StatusCode::NO_CONTENT)
}

/// List a thread's turns in order
pub async fn list_turns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ListTurnsResponse>> {
    let owner_id = state.verifier.authenticate(&headers)?;
    let thread = super::diagnose::owned_thread(&state, &thread_id, &owner_id).await?;

    let turns = state.store.list_turns(&thread.id, 500).await?;
    Ok(Json(ListTurnsResponse {
        thread_id: thread.id,
        turns: turns.into_iter().map(super::diagnose::to_view).collect(),
    }))
}

fn thread_to_response(thread: ThreadRecord) -> ThreadResponse {
    ThreadResponse {
        thread_id: thread.id,
        owner_id: thread.owner_id,
        title: thread.title,
        created_at: thread.created_at,
        updated_at: thread.updated_at,
    }
}
