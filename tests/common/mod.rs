// Shared test doubles

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use switchboard::llm::{ChatModel, Completion, CompletionRequest, FunctionCall, LlmError};
use switchboard::protocol::{
    AgentCapabilities, AgentCard, JsonRpcRequest, JsonRpcResponse, Message, Part, Task, TaskState,
};
use switchboard::remote::{TaskTransport, TransportError};

/// One scripted model reply
pub enum Scripted {
    Text(String),
    Calls(Vec<FunctionCall>),
    Fail,
}

/// Chat model that replays a script and records every request
pub struct ScriptedModel {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Scripted::Text(t.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(Completion::text(text)),
            Some(Scripted::Calls(calls)) => Ok(Completion {
                content: None,
                function_calls: calls,
            }),
            Some(Scripted::Fail) | None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

pub fn call(id: &str, name: &str, arguments: &str) -> FunctionCall {
    FunctionCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// Transport that answers every request with a task and records the requests
pub struct RecordingTransport {
    reply_text: String,
    context_id: String,
    requests: Mutex<Vec<JsonRpcRequest>>,
}

impl RecordingTransport {
    pub fn new(reply_text: &str, context_id: &str) -> Arc<Self> {
        Arc::new(Self {
            reply_text: reply_text.to_string(),
            context_id: context_id.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<JsonRpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Messages carried by the recorded `message/send` requests
    pub fn messages(&self) -> Vec<Message> {
        self.requests()
            .into_iter()
            .map(|r| serde_json::from_value(r.params["message"].clone()).unwrap())
            .collect()
    }
}

#[async_trait]
impl TaskTransport for RecordingTransport {
    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let id = request.id.clone();
        self.requests.lock().unwrap().push(request);

        let mut task = Task::new(self.context_id.clone(), TaskState::Completed);
        if !self.reply_text.is_empty() {
            task.status.message = Some(Message::agent_text(
                self.reply_text.clone(),
                &self.context_id,
                &task.id,
            ));
        }

        Ok(JsonRpcResponse::success(id, serde_json::to_value(task).unwrap()))
    }
}

/// Transport whose every send fails or returns a fixed envelope
pub struct FixedTransport {
    pub response: Option<Value>,
}

#[async_trait]
impl TaskTransport for FixedTransport {
    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        match &self.response {
            Some(result) => Ok(JsonRpcResponse::success(request.id, result.clone())),
            None => Err(TransportError::Decode("connection reset".to_string())),
        }
    }
}

pub fn card(name: &str, description: Option<&str>) -> AgentCard {
    AgentCard {
        name: name.to_string(),
        description: description.map(str::to_string),
        url: format!("http://{}.test", name.to_lowercase().replace(' ', "-")),
        version: "1.0.0".to_string(),
        protocol_version: None,
        default_input_modes: vec!["text".to_string()],
        default_output_modes: vec!["text".to_string()],
        capabilities: AgentCapabilities::default(),
        skills: Vec::new(),
    }
}

pub fn text_of(message: &Message) -> String {
    message
        .parts
        .iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
