//! Conversational agent shared by every leaf specialization
//!
//! Holds per-session history, prepends a fixed system instruction, calls the
//! model, and records the user and assistant turns. With a tool table the
//! model may request function calls; those run in a bounded loop until the
//! model answers without one.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info, warn};

use super::tools::ToolTable;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest, FunctionCall, LlmError};
use crate::session::{InMemorySessionStore, SessionLocks, SessionStore};

pub const DEFAULT_MAX_ITERATIONS: usize = 8;

pub const LOOP_EXHAUSTED_MESSAGE: &str =
    "I was unable to finish looking that up. Please try again with a more specific request.";

/// Fixed identity of a specialization
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: String,
    pub instruction: String,
    pub temperature: Option<f32>,
    /// Substituted when the model returns empty content
    pub fallback: String,
}

/// Result of one agent turn
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub text: String,
    pub needs_user_input: bool,
    pub is_task_complete: bool,
}

/// Tool loop states
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    ExecutingFunctions(Vec<FunctionCall>),
    Done(String),
}

pub struct ConversationalAgent {
    profile: AgentProfile,
    model: Arc<dyn ChatModel>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    tools: Option<ToolTable>,
    max_iterations: usize,
}

impl ConversationalAgent {
    pub fn new(profile: AgentProfile, model: Arc<dyn ChatModel>) -> Self {
        info!("{} initialized with model {}", profile.name, model.model());
        Self {
            profile,
            model,
            store: Arc::new(InMemorySessionStore::new()),
            locks: SessionLocks::new(),
            tools: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Enable function calling, capping model calls per turn at `max_iterations`
    pub fn with_tools(mut self, tools: ToolTable, max_iterations: usize) -> Self {
        self.tools = Some(tools).filter(|t| !t.is_empty());
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Answer `query` within `session_id`
    pub async fn respond(&self, query: &str, session_id: &str) -> Result<AgentReply, LlmError> {
        debug!("{} respond query={} session_id={}", self.profile.name, query, session_id);
        let _turn = self.locks.acquire(session_id).await;

        let history = self.store.history(session_id).await;
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.profile.instruction.clone()));
        messages.extend(history);
        messages.push(ChatMessage::user(query));

        let content = self.run(messages).await?;

        self.store.append(session_id, ChatMessage::user(query)).await;
        self.store
            .append(session_id, ChatMessage::assistant(content.clone()))
            .await;

        Ok(AgentReply {
            text: content,
            needs_user_input: false,
            is_task_complete: true,
        })
    }

    /// Single-element stream over [`respond`](Self::respond)
    pub fn stream<'a>(
        &'a self,
        query: &'a str,
        session_id: &'a str,
    ) -> BoxStream<'a, Result<AgentReply, LlmError>> {
        stream::once(self.respond(query, session_id)).boxed()
    }

    async fn run(&self, mut messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let functions = self.tools.as_ref().map(ToolTable::specs).unwrap_or_default();
        let mut model_calls = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel if model_calls >= self.max_iterations => {
                    warn!(
                        "{} stopped after {} model calls with functions still pending",
                        self.profile.name, model_calls
                    );
                    LoopState::Done(LOOP_EXHAUSTED_MESSAGE.to_string())
                }
                LoopState::AwaitingModel => {
                    model_calls += 1;
                    let request = CompletionRequest::new(self.model.model(), messages.clone())
                        .with_temperature(self.profile.temperature)
                        .with_functions(functions.clone());
                    let completion = self.model.complete(request).await?;

                    if completion.function_calls.is_empty() || self.tools.is_none() {
                        LoopState::Done(
                            completion
                                .non_empty_content()
                                .map(str::to_string)
                                .unwrap_or_else(|| self.profile.fallback.clone()),
                        )
                    } else {
                        messages.push(ChatMessage::assistant_with_calls(
                            completion.content.clone().unwrap_or_default(),
                            completion.function_calls.clone(),
                        ));
                        LoopState::ExecutingFunctions(completion.function_calls)
                    }
                }
                LoopState::ExecutingFunctions(calls) => {
                    if let Some(tools) = &self.tools {
                        for call in &calls {
                            let output = tools.invoke(call).await;
                            messages.push(ChatMessage::tool_result(call.id.clone(), output));
                        }
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => return Ok(text),
            };
        }
    }
}
