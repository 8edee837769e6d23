//! Registry of remote agent connections, keyed by card name

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::connection::{RemoteAgentConnection, TaskTransport};
use crate::protocol::AgentCard;

/// Name and description of a registered agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
}

/// Registered connections in first-registration order
#[derive(Clone, Default)]
pub struct AgentRegistry {
    connections: HashMap<String, RemoteAgentConnection>,
    order: Vec<String>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its card name; a later registration of the
    /// same name replaces the earlier one
    pub fn insert(&mut self, connection: RemoteAgentConnection) {
        let name = connection.name().to_string();
        if self.connections.insert(name.clone(), connection).is_some() {
            warn!("Replacing previously registered agent '{}'", name);
        } else {
            info!("Registered remote agent '{}'", name);
            self.order.push(name);
        }
    }

    pub fn register(&mut self, card: AgentCard, transport: Arc<dyn TaskTransport>) {
        self.insert(RemoteAgentConnection::new(card, transport));
    }

    pub fn get(&self, name: &str) -> Option<&RemoteAgentConnection> {
        self.connections.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Cards in registration order
    pub fn cards(&self) -> impl Iterator<Item = &AgentCard> {
        self.order
            .iter()
            .filter_map(|name| self.connections.get(name))
            .map(RemoteAgentConnection::card)
    }

    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.cards()
            .map(|card| AgentSummary {
                name: card.name.clone(),
                description: card.description.clone().unwrap_or_default(),
            })
            .collect()
    }
}
