//! Session state module

pub mod store;

pub use store::{InMemorySessionStore, SessionLocks, SessionStore};
