//! Remote agent module
//! Connections to remote task-protocol agents, their registry, and discovery

pub mod connection;
pub mod discovery;
pub mod registry;

pub use connection::{HttpTaskTransport, RemoteAgentConnection, SendOutcome, TaskTransport, TransportError};
pub use discovery::{discover, CardResolver, DiscoveryReport, SkippedAgent};
pub use registry::{AgentRegistry, AgentSummary};
