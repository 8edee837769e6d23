//! Remote agent discovery
//!
//! Fetches each configured agent's card from its well-known address. Discovery
//! is best-effort per address: one unreachable agent never blocks the rest.

use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

use super::connection::{TransportError, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::protocol::{AgentCard, AGENT_CARD_PATH, LEGACY_AGENT_CARD_PATH};

/// Resolves agent cards from base addresses
pub struct CardResolver {
    client: Client,
}

impl CardResolver {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Fetch the card published at `address`
    ///
    /// Tries the current well-known path first and falls back to the legacy one
    /// when the agent answers 404.
    pub async fn resolve(&self, address: &str) -> Result<AgentCard, TransportError> {
        let base = address.trim_end_matches('/');

        match self.fetch(&format!("{}{}", base, AGENT_CARD_PATH)).await {
            Err(TransportError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!("No card at {}{}, trying legacy path", base, AGENT_CARD_PATH);
                self.fetch(&format!("{}{}", base, LEGACY_AGENT_CARD_PATH)).await
            }
            other => other,
        }
    }

    async fn fetch(&self, url: &str) -> Result<AgentCard, TransportError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.text().await?;
        let card: AgentCard =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;

        if card.name.trim().is_empty() {
            return Err(TransportError::Decode("agent card has an empty name".to_string()));
        }

        Ok(card)
    }
}

impl Default for CardResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// An address that could not be registered
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAgent {
    pub address: String,
    pub reason: String,
}

/// Partial-success result of discovery
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Successfully fetched cards, in address order
    pub registered: Vec<(String, AgentCard)>,
    pub skipped: Vec<SkippedAgent>,
}

impl DiscoveryReport {
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

/// Fetch cards for every address, recording failures instead of aborting
pub async fn discover(resolver: &CardResolver, addresses: &[String]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for address in addresses {
        match resolver.resolve(address).await {
            Ok(card) => {
                info!("Discovered agent '{}' at {}", card.name, address);
                report.registered.push((address.clone(), card));
            }
            Err(e) => {
                error!("Failed to load agent card from {}: {}", address, e);
                report.skipped.push(SkippedAgent {
                    address: address.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}
