//! Routing agent: classifies each user turn and delegates to remote agents

use std::sync::Arc;

use tracing::{debug, error, info};

use super::extract::extract_task_output;
use super::plan::Plan;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::protocol::{AgentCard, Message, Task};
use crate::remote::{
    discover, AgentRegistry, AgentSummary, CardResolver, DiscoveryReport, RemoteAgentConnection,
    SendOutcome, TaskTransport,
};
use crate::session::{SessionLocks, SessionStore};

const ROUTING_INSTRUCTION: &str = "You are a routing assistant coordinating specialized agents. \
Decide whether to answer the user directly or delegate to one of the remote agents. \
Respond with JSON only.";

const PLAN_SHAPES: &str = "Respond with one of the following JSON structures:\n\
{\"action\": \"delegate\", \"agent\": \"Agent Name\", \"task\": \"Detailed task\"}\n\
{\"action\": \"ask_user\", \"question\": \"Clarifying question\"}\n\
{\"action\": \"respond\", \"message\": \"Assistant reply\"}";

const SUMMARY_INSTRUCTION: &str = "You are the host assistant. Summarize the remote agent's reply for the user. \
If the remote agent output is empty, politely inform the user that the specialist \
did not return any information.";

pub const MISSING_DELEGATION_MESSAGE: &str =
    "I could not determine which specialist to use. Could you rephrase your request?";
pub const DEFAULT_QUESTION: &str = "Could you share more details?";
pub const DEFAULT_REPLY: &str = "I'm not sure how to help with that.";
pub const SUMMARY_FALLBACK: &str = "The remote agent did not provide any additional details.";
pub const ROUTER_UNAVAILABLE_MESSAGE: &str =
    "Sorry, I'm having trouble reaching the language model right now. Please try again.";
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response";

/// Delegates user requests to remote agents, using a model to plan each turn
pub struct RoutingAgent {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    registry: AgentRegistry,
}

impl RoutingAgent {
    pub fn new(model: Arc<dyn ChatModel>, store: Arc<dyn SessionStore>) -> Self {
        info!("RoutingAgent initialized with model {}", model.model());
        Self {
            model,
            store,
            locks: SessionLocks::new(),
            registry: AgentRegistry::new(),
        }
    }

    /// Discover the agents at `addresses` and register every one that answers
    pub async fn create(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn SessionStore>,
        addresses: &[String],
    ) -> (Self, DiscoveryReport) {
        let mut agent = Self::new(model, store);
        let report = discover(&CardResolver::new(), addresses).await;

        for (address, card) in &report.registered {
            agent
                .registry
                .insert(RemoteAgentConnection::http(card.clone(), address));
        }

        info!(
            "Routing across {} agent(s), {} address(es) skipped",
            agent.registry.len(),
            report.skipped.len()
        );

        (agent, report)
    }

    /// Register an agent over an arbitrary transport
    pub fn register(&mut self, card: AgentCard, transport: Arc<dyn TaskTransport>) {
        self.registry.register(card, transport);
    }

    pub fn list_remote_agents(&self) -> Vec<AgentSummary> {
        self.registry.summaries()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Handle one user turn, returning the reply fragments in display order
    pub async fn handle_user_message(&self, message: &str, session_id: &str) -> Vec<String> {
        let _turn = self.locks.acquire(session_id).await;

        let plan = self.plan_action(message, session_id).await;
        debug!("Plan for session {}: {:?}", session_id, plan);

        match plan {
            Plan::Delegate {
                agent: Some(agent_name),
                task: Some(task_text),
            } => {
                let notice = format!("Delegating to {}...", agent_name);
                let task = self.send_task(&agent_name, &task_text, session_id).await;
                let output = extract_task_output(task.as_ref());
                let summary = self
                    .summarize_response(message, &agent_name, &output, session_id)
                    .await;
                vec![notice, summary]
            }
            Plan::Delegate { .. } => {
                self.reply(session_id, MISSING_DELEGATION_MESSAGE.to_string())
                    .await
            }
            Plan::AskUser { question } => {
                self.reply(session_id, question.unwrap_or_else(|| DEFAULT_QUESTION.to_string()))
                    .await
            }
            Plan::Respond { message } => {
                self.reply(session_id, message.unwrap_or_else(|| DEFAULT_REPLY.to_string()))
                    .await
            }
        }
    }

    async fn reply(&self, session_id: &str, text: String) -> Vec<String> {
        self.append_assistant(session_id, &text).await;
        vec![text]
    }

    /// System prompt listing every registered agent
    fn routing_prompt(&self) -> String {
        let agents = self
            .registry
            .cards()
            .map(|card| {
                format!(
                    "- {}: {}",
                    card.name,
                    card.description
                        .as_deref()
                        .filter(|d| !d.is_empty())
                        .unwrap_or("No description provided.")
                )
            })
            .collect::<Vec<_>>();

        let agents = if agents.is_empty() {
            "- No remote agents available".to_string()
        } else {
            agents.join("\n")
        };

        format!(
            "{}\n\nAvailable agents:\n{}\n\n{}",
            ROUTING_INSTRUCTION, agents, PLAN_SHAPES
        )
    }

    /// Classification step. The user message joins the history whatever the outcome.
    async fn plan_action(&self, message: &str, session_id: &str) -> Plan {
        let history = self.store.history(session_id).await;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.routing_prompt()));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        self.store.append(session_id, ChatMessage::user(message)).await;

        let request = CompletionRequest::new(self.model.model(), messages);
        match self.model.complete(request).await {
            Ok(completion) => {
                let raw = completion
                    .content
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .unwrap_or("{}");
                Plan::parse(raw)
            }
            Err(e) => {
                error!("Routing model call failed: {}", e);
                Plan::Respond {
                    message: Some(ROUTER_UNAVAILABLE_MESSAGE.to_string()),
                }
            }
        }
    }

    /// Send `task_text` to the named agent, reusing this session's context id with it
    async fn send_task(&self, agent_name: &str, task_text: &str, session_id: &str) -> Option<Task> {
        let Some(connection) = self.registry.get(agent_name) else {
            error!("Unknown agent requested: {}", agent_name);
            return None;
        };

        let context_id = self
            .store
            .context_id(session_id, agent_name)
            .await
            .filter(|id| !id.is_empty());
        let outgoing = Message::user_text(task_text, context_id);

        match connection.send(outgoing).await {
            Ok(SendOutcome::Task(task)) => {
                self.store
                    .set_context_id(session_id, agent_name, task.context_id.clone())
                    .await;
                Some(task)
            }
            Ok(SendOutcome::NonTask) => {
                error!("Received non-task response from {}", agent_name);
                None
            }
            Ok(SendOutcome::Failure(err)) => {
                error!(
                    "Received non-success response from {}: {} ({})",
                    agent_name, err.message, err.code
                );
                None
            }
            Err(e) => {
                error!("Failed to send task to {}: {}", agent_name, e);
                None
            }
        }
    }

    /// One-shot summary of the remote output; session history is not sent
    async fn summarize_response(
        &self,
        user_message: &str,
        agent_name: &str,
        agent_output: &str,
        session_id: &str,
    ) -> String {
        let output = if agent_output.is_empty() {
            NO_RESPONSE_PLACEHOLDER
        } else {
            agent_output
        };

        let messages = vec![
            ChatMessage::system(SUMMARY_INSTRUCTION),
            ChatMessage::user(format!(
                "Original user request:\n{}\n\nRemote agent ({}) responded:\n{}",
                user_message, agent_name, output
            )),
        ];

        let request = CompletionRequest::new(self.model.model(), messages);
        let summary = match self.model.complete(request).await {
            Ok(completion) => completion
                .non_empty_content()
                .map(str::to_string)
                .unwrap_or_else(|| SUMMARY_FALLBACK.to_string()),
            Err(e) => {
                error!("Summary model call failed: {}", e);
                if agent_output.is_empty() {
                    SUMMARY_FALLBACK.to_string()
                } else {
                    agent_output.to_string()
                }
            }
        };

        self.append_assistant(session_id, &summary).await;
        summary
    }

    async fn append_assistant(&self, session_id: &str, content: &str) {
        self.store
            .append(session_id, ChatMessage::assistant(content))
            .await;
    }
}
