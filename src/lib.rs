//! Switchboard - Routes chat turns to specialized remote agents

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod protocol;
pub mod remote;
pub mod router;
pub mod server;
pub mod session;
pub mod weather;
