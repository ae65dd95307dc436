use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use triage_core::{
    compose, prompt::COMMAND_MEMORY, prompt::CURRENT_OUTPUT_LIMIT, recent_commands,
    truncate_middle, HistoryEntry, NextStep, Role, TurnAction,
};
use triage_store::{ThreadRecord, TurnRecord, TurnRole};

const TURN_FETCH_LIMIT: i64 = 200;
const TITLE_LIMIT: usize = 60;

#[derive(Debug, Deserialize)]
pub struct DiagnoseRequest {
    pub problem: String,
    #[serde(default)]
    pub command_output: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiagnoseContinueRequest {
    pub thread_id: String,
    pub command: String,
    pub command_output: String,
}

#[derive(Debug, Serialize)]
pub struct DiagnoseResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub next_step: NextStep,
    pub thread_id: String,
    pub history: Vec<TurnView>,
}

#[derive(Debug, Serialize)]
pub struct TurnView {
    pub timestamp: DateTime<Utc>,
    pub role: TurnRole,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_output: Option<String>,
}

/// First turn of a conversation, or a follow-up on an existing thread.
pub async fn diagnose(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<DiagnoseRequest>,
) -> ApiResult<Json<DiagnoseResponse>> {
    ensure_enabled(&state)?;
    let owner_id = state.verifier.authenticate(&headers)?;

    if req.problem.trim().is_empty() {
        return Err(ApiError::BadRequest("problem must not be empty".to_string()));
    }

    let thread = match &req.thread_id {
        Some(thread_id) => owned_thread(&state, thread_id, &owner_id).await?,
        None => {
            state
                .store
                .create_thread(&owner_id, &thread_title(&req.problem))
                .await?
        }
    };

    run_turn(&state, thread, req.problem, None, req.command_output).await
}

/// Continuation after the caller ran a surfaced command externally.
/// The original problem statement is recovered from the thread's first
/// user turn.
pub async fn diagnose_continue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<DiagnoseContinueRequest>,
) -> ApiResult<Json<DiagnoseResponse>> {
    ensure_enabled(&state)?;
    let owner_id = state.verifier.authenticate(&headers)?;
    let thread = owned_thread(&state, &req.thread_id, &owner_id).await?;

    let turns = state.store.list_turns(&thread.id, TURN_FETCH_LIMIT).await?;
    let problem = turns
        .iter()
        .find(|t| t.role == TurnRole::User)
        .map(|t| t.content.clone())
        .unwrap_or_else(|| thread.title.clone());

    run_turn(
        &state,
        thread,
        problem,
        Some(req.command),
        Some(req.command_output),
    )
    .await
}

/// One synchronous turn: compose -> reason -> decide -> optionally execute
/// -> persist both turns -> respond.
async fn run_turn(
    state: &Arc<AppState>,
    thread: ThreadRecord,
    problem: String,
    ran_command: Option<String>,
    command_output: Option<String>,
) -> ApiResult<Json<DiagnoseResponse>> {
    // Serialize concurrent turns on the same thread
    let lock = state.thread_lock(&thread.id);
    let thread_id = thread.id.clone();
    let result = {
        let _guard = lock.lock().await;
        locked_turn(state, thread, problem, ran_command, command_output).await
    };
    drop(lock);
    state.prune_thread_lock(&thread_id);
    result
}

async fn locked_turn(
    state: &Arc<AppState>,
    thread: ThreadRecord,
    problem: String,
    ran_command: Option<String>,
    command_output: Option<String>,
) -> ApiResult<Json<DiagnoseResponse>> {
    let turns = state.store.list_turns(&thread.id, TURN_FETCH_LIMIT).await?;
    let history: Vec<HistoryEntry> = turns.iter().map(to_history).collect();
    let prior_commands = recent_commands(&history, COMMAND_MEMORY);

    let short_output = command_output
        .as_deref()
        .filter(|o| !o.trim().is_empty())
        .map(|o| truncate_middle(o, CURRENT_OUTPUT_LIMIT).into_owned());
    let new_output_supplied = short_output.is_some();

    let prompt = compose(&problem, &history, short_output.as_deref(), &prior_commands);
    let diagnosis = state.reasoner.reason(&prompt, &problem).await;
    let action = state
        .controller
        .decide(&diagnosis, &prior_commands, new_output_supplied);

    state
        .store
        .append_turn(TurnRecord::new(
            &thread.id,
            TurnRole::User,
            problem.as_str(),
            ran_command,
            short_output,
        ))
        .await?;

    let (message, command, next_step, executed_output) = match action {
        TurnAction::Reply(message) => (message, None, NextStep::Message, None),
        TurnAction::Surface(command) => (
            diagnosis.message.clone(),
            Some(command),
            NextStep::Command,
            None,
        ),
        TurnAction::Execute(command) => {
            let report = state.runner.run(&command).await;
            tracing::info!(
                command = %command,
                success = report.success,
                "command executed autonomously"
            );
            let folded = truncate_middle(&report.folded(), CURRENT_OUTPUT_LIMIT).into_owned();
            (
                diagnosis.message.clone(),
                Some(command),
                NextStep::Command,
                Some(folded),
            )
        }
    };

    state
        .store
        .append_turn(TurnRecord::new(
            &thread.id,
            TurnRole::Assistant,
            message.as_str(),
            command.clone(),
            executed_output,
        ))
        .await?;

    let turns = state.store.list_turns(&thread.id, TURN_FETCH_LIMIT).await?;
    Ok(Json(DiagnoseResponse {
        message,
        command,
        next_step,
        thread_id: thread.id,
        history: turns.into_iter().map(to_view).collect(),
    }))
}

fn ensure_enabled(state: &AppState) -> Result<(), ApiError> {
    if state.is_enabled() {
        Ok(())
    } else {
        Err(ApiError::ServiceDisabled)
    }
}

pub(crate) async fn owned_thread(
    state: &AppState,
    thread_id: &str,
    owner_id: &str,
) -> Result<ThreadRecord, ApiError> {
    let thread = state
        .store
        .get_thread(thread_id)
        .await?
        .ok_or_else(|| ApiError::ThreadNotFound(thread_id.to_string()))?;
    if thread.owner_id != owner_id {
        return Err(ApiError::Forbidden(thread_id.to_string()));
    }
    Ok(thread)
}

fn thread_title(problem: &str) -> String {
    let title: String = problem.trim().chars().take(TITLE_LIMIT).collect();
    if title.is_empty() {
        "New Chat".to_string()
    } else {
        title
    }
}

fn to_history(turn: &TurnRecord) -> HistoryEntry {
    let (role, prefix) = match turn.role {
        TurnRole::User => (Role::User, "User"),
        TurnRole::Assistant => (Role::Assistant, "Assistant"),
    };
    HistoryEntry {
        timestamp: turn.created_at,
        role,
        message: format!("{prefix}: {}", turn.content),
        command: turn.command.clone(),
        command_output: turn.command_output.clone(),
    }
}

pub(crate) fn to_view(turn: TurnRecord) -> TurnView {
    TurnView {
        timestamp: turn.created_at,
        role: turn.role,
        message: turn.content,
        command: turn.command,
        command_output: turn.command_output,
    }
}
