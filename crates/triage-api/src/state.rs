use crate::auth::CredentialVerifier;
use crate::config::Config;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use triage_core::{CommandRunner, LoopController, StructuredReasoner};
use triage_store::ThreadStore;

/// Shared application state passed to all handlers
///
/// All resources are wrapped in Arc for efficient sharing across async tasks.
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ThreadStore>,
    pub reasoner: Arc<StructuredReasoner>,
    pub controller: LoopController,
    pub runner: Arc<dyn CommandRunner>,
    pub verifier: CredentialVerifier,
    enabled: AtomicBool,
    // One async mutex per thread id, serializing concurrent turns on the
    // same thread so appended timestamps stay monotonic.
    thread_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ThreadStore>,
        reasoner: StructuredReasoner,
        controller: LoopController,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let verifier = CredentialVerifier::new(&config.auth);
        let enabled = AtomicBool::new(config.service.enabled);
        Self {
            config: Arc::new(config),
            store,
            reasoner: Arc::new(reasoner),
            controller,
            runner,
            verifier,
            enabled,
            thread_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn thread_lock(&self, thread_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.thread_locks.lock().expect("thread lock registry poisoned");
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub fn release_thread_lock(&self, thread_id: &str) {
        if let Ok(mut locks) = self.thread_locks.lock() {
            locks.remove(thread_id);
        }
    }

    /// Drop the registry entry for `thread_id` when no turn holds it.
    ///
    /// Callers drop their `Arc` clone before calling this; the registry
    /// mutex is held across the count check, and every new clone goes
    /// through [`thread_lock`](Self::thread_lock) under the same mutex, so
    /// a strong count of 1 means only the registry itself remains. Without
    /// this the map grows by one entry per thread ever diagnosed.
    pub fn prune_thread_lock(&self, thread_id: &str) {
        if let Ok(mut locks) = self.thread_locks.lock() {
            if locks
                .get(thread_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                locks.remove(thread_id);
            }
        }
    }
}
