pub mod admin;
pub mod diagnose;
pub mod health;
pub mod threads;

use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// API routes without outer middleware layers (the binary adds those).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Diagnostic turn loop
        .route("/diagnose", post(diagnose::diagnose))
        .route("/diagnose/continue", post(diagnose::diagnose_continue))
        // Threads
        .route("/threads", post(threads::create_thread))
        .route("/threads", get(threads::list_threads))
        .route("/threads/:thread_id", get(threads::get_thread))
        .route("/threads/:thread_id", delete(threads::delete_thread))
        .route("/threads/:thread_id/turns", get(threads::list_turns))
        // Administration
        .route("/admin/availability", post(admin::set_availability))
        .with_state(state)
}
