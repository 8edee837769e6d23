//! Session store
//!
//! Per-session conversation history and per-(session, remote agent) context
//! ids. History is append-only; a context id is last-write-wins and never
//! cleared for the lifetime of the store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::llm::ChatMessage;

/// Storage seam for session state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Full history of a session, empty when the session is unknown
    async fn history(&self, session_id: &str) -> Vec<ChatMessage>;

    /// Append one message to a session's history
    async fn append(&self, session_id: &str, message: ChatMessage);

    /// Number of messages stored for a session
    async fn len(&self, session_id: &str) -> usize {
        self.history(session_id).await.len()
    }

    /// Context id a remote agent established for this session
    async fn context_id(&self, session_id: &str, agent_name: &str) -> Option<String>;

    /// Record the context id a remote agent returned for this session
    async fn set_context_id(&self, session_id: &str, agent_name: &str, context_id: String);
}

/// In-process session store, lost on restart
#[derive(Default)]
pub struct InMemorySessionStore {
    histories: RwLock<HashMap<String, Vec<ChatMessage>>>,
    context_ids: RwLock<HashMap<(String, String), String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with at least one message
    pub async fn session_count(&self) -> usize {
        self.histories.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.histories
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, message: ChatMessage) {
        self.histories
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    async fn len(&self, session_id: &str) -> usize {
        self.histories
            .read()
            .await
            .get(session_id)
            .map_or(0, Vec::len)
    }

    async fn context_id(&self, session_id: &str, agent_name: &str) -> Option<String> {
        self.context_ids
            .read()
            .await
            .get(&(session_id.to_string(), agent_name.to_string()))
            .cloned()
    }

    async fn set_context_id(&self, session_id: &str, agent_name: &str, context_id: String) {
        self.context_ids
            .write()
            .await
            .insert((session_id.to_string(), agent_name.to_string()), context_id);
    }
}

/// Per-session turn locks
///
/// A turn holds its session's guard from classification to the final reply,
/// so overlapping turns on one session run one after another while different
/// sessions proceed in parallel.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of a session
    ///
    /// Locks nobody holds or waits on are dropped along the way.
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|id, lock| id == session_id || Arc::strong_count(lock) > 1);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of sessions with a tracked lock
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
