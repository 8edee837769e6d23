// Tests for the in-memory session store

use std::sync::Arc;
use std::time::Duration;

use switchboard::llm::{ChatMessage, Role};
use switchboard::session::{InMemorySessionStore, SessionLocks, SessionStore};

#[tokio::test]
async fn test_history_is_append_only_per_session() {
    let store = InMemorySessionStore::new();

    assert!(store.history("s1").await.is_empty());

    store.append("s1", ChatMessage::user("hello")).await;
    store.append("s1", ChatMessage::assistant("hi")).await;
    store.append("s2", ChatMessage::user("other")).await;

    let history = store.history("s1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].content, "hi");
    assert_eq!(store.len("s2").await, 1);
    assert_eq!(store.session_count().await, 2);
}

#[tokio::test]
async fn test_context_ids_are_per_session_and_agent() {
    let store = InMemorySessionStore::new();

    store.set_context_id("s1", "Weather Agent", "ctx-1".to_string()).await;
    store.set_context_id("s1", "Weather Agent", "ctx-2".to_string()).await;

    assert_eq!(store.context_id("s1", "Weather Agent").await.as_deref(), Some("ctx-2"));
    assert_eq!(store.context_id("s1", "Airbnb Agent").await, None);
    assert_eq!(store.context_id("s2", "Weather Agent").await, None);
}

#[tokio::test]
async fn test_session_locks_serialize_same_session() {
    let locks = Arc::new(SessionLocks::new());

    let guard = locks.acquire("s1").await;

    // A different session is not blocked
    let other = tokio::time::timeout(Duration::from_millis(100), locks.acquire("s2")).await;
    assert!(other.is_ok());

    // The same session waits until the first turn finishes
    let same = tokio::time::timeout(Duration::from_millis(100), locks.acquire("s1")).await;
    assert!(same.is_err());

    drop(guard);
    let same = tokio::time::timeout(Duration::from_millis(100), locks.acquire("s1")).await;
    assert!(same.is_ok());
}

#[tokio::test]
async fn test_session_locks_drop_idle_sessions() {
    let locks = SessionLocks::new();

    drop(locks.acquire("s1").await);
    let held = locks.acquire("s2").await;
    assert_eq!(locks.len().await, 1);

    // A held lock survives while other sessions come and go
    drop(locks.acquire("s3").await);
    assert_eq!(locks.len().await, 2);
    let same = tokio::time::timeout(Duration::from_millis(100), locks.acquire("s2")).await;
    assert!(same.is_err());

    drop(held);
    drop(locks.acquire("s4").await);
    assert_eq!(locks.len().await, 1);
}
