//! Routing module
//! The host's per-turn decision core

pub mod extract;
pub mod plan;
pub mod routing_agent;

pub use extract::{extract_task_output, part_to_text};
pub use plan::{Plan, PlanError};
pub use routing_agent::RoutingAgent;
