//! Leaf agent module
//! The conversational agent pattern and its specializations

pub mod accommodation;
pub mod conversational;
pub mod tools;
pub mod weather;

pub use conversational::{AgentProfile, AgentReply, ConversationalAgent};
pub use tools::{Tool, ToolError, ToolTable};
