//! Callable functions exposed to a model

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{FunctionCall, FunctionSpec};

/// Errors raised while running a tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("Tool failed: {0}")]
    Failed(String),
}

/// A function the model may call
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> FunctionSpec;

    async fn call(&self, arguments: Value) -> Result<String, ToolError>;
}

/// Fixed name → function table
#[derive(Clone, Default)]
pub struct ToolTable {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.spec().name, tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Specs advertised to the model, sorted by name
    pub fn specs(&self) -> Vec<FunctionSpec> {
        let mut specs: Vec<FunctionSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Resolve and run one call. Never fails: every problem becomes text for the model.
    pub async fn invoke(&self, call: &FunctionCall) -> String {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!("Model requested unknown tool '{}'", call.name);
            return format!("Tool '{}' is not supported.", call.name);
        };

        let raw = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };

        let arguments: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Invalid arguments for '{}': {} ({})", call.name, e, raw);
                return format!("Invalid arguments for '{}': {}", call.name, e);
            }
        };

        debug!("Calling tool '{}' with {}", call.name, arguments);

        match tool.call(arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool '{}' failed: {}", call.name, e);
                format!("Error running '{}': {}", call.name, e)
            }
        }
    }
}
