//! Agent server module
//! Exposes a leaf agent over the task protocol

pub mod a2a_server;
pub mod executor;

pub use a2a_server::A2aServer;
pub use executor::AgentExecutor;
