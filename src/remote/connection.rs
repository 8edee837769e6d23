//! Remote agent connection over the task protocol

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use crate::protocol::{
    A2aMethod, AgentCard, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Message,
    SendMessageParams, SendMessageResult, Task,
};

/// Remote agents may run slow multi-step work; allow them plenty of time.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors talking to a remote agent
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote agent returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    Decode(String),
}

/// Outbound request/response channel to one remote agent
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Send one JSON-RPC request and wait for its response envelope
    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;
}

/// HTTP JSON-RPC transport bound to an agent address
pub struct HttpTaskTransport {
    client: Client,
    url: String,
}

impl HttpTaskTransport {
    /// Create a new transport with the long remote-agent timeouts
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new()); // Fallback if config fails

        Self::with_client(client, url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Get the agent URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TaskTransport for HttpTaskTransport {
    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        debug!("Sending {} to {}", request.method, self.url);

        let response = match self.client.post(&self.url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("Task transport HTTP error: {}", e);
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// How a remote agent answered a `message/send`
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Success envelope wrapping a task
    Task(Task),
    /// Success envelope wrapping something other than a task
    NonTask,
    /// Error envelope
    Failure(JsonRpcError),
}

/// One registered remote agent: its card plus a live transport
#[derive(Clone)]
pub struct RemoteAgentConnection {
    card: AgentCard,
    transport: Arc<dyn TaskTransport>,
}

impl RemoteAgentConnection {
    pub fn new(card: AgentCard, transport: Arc<dyn TaskTransport>) -> Self {
        Self { card, transport }
    }

    /// Connect over HTTP to `address`
    pub fn http(card: AgentCard, address: &str) -> Self {
        info!("Connecting to remote agent {} at {}", card.name, address);
        Self::new(card, Arc::new(HttpTaskTransport::new(address)))
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    pub fn name(&self) -> &str {
        &self.card.name
    }

    /// Send a task message and classify the response envelope
    pub async fn send(&self, message: Message) -> Result<SendOutcome, TransportError> {
        let request_id = message.message_id.clone();
        let params = serde_json::to_value(SendMessageParams { message })
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        let request = JsonRpcRequest::new(json!(request_id), A2aMethod::SendMessage, params);

        let response = self.transport.send(request).await?;

        if let Some(err) = response.error {
            return Ok(SendOutcome::Failure(err));
        }

        let Some(result) = response.result else {
            return Ok(SendOutcome::Failure(JsonRpcError {
                code: crate::protocol::INTERNAL_ERROR,
                message: "response carried neither result nor error".to_string(),
                data: None,
            }));
        };

        match serde_json::from_value::<SendMessageResult>(result) {
            Ok(SendMessageResult::Task(task)) => Ok(SendOutcome::Task(task)),
            Ok(SendMessageResult::Message(_)) => Ok(SendOutcome::NonTask),
            Err(e) => Err(TransportError::Decode(e.to_string())),
        }
    }
}
