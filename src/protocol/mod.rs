//! Task protocol module
//! Wire types shared by the routing host, the remote connections, and the agent server

pub mod types;

pub use types::*;
