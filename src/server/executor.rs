//! Runs a conversational agent for incoming task messages

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::agent::ConversationalAgent;
use crate::llm::LlmError;
use crate::protocol::{Artifact, Message, Part, Task, TaskState};

/// Tasks kept for `tasks/get` and follow-up messages
pub const DEFAULT_TASK_CAPACITY: usize = 1024;

/// Most recent tasks by id; the oldest is evicted once full
struct TaskCache {
    tasks: HashMap<String, Task>,
    order: VecDeque<String>,
    capacity: usize,
}

impl TaskCache {
    fn new(capacity: usize) -> Self {
        Self {
            tasks: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    fn insert(&mut self, task: Task) {
        let id = task.id.clone();
        if self.tasks.insert(id.clone(), task).is_none() {
            self.order.push_back(id);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!("Evicting task {}", oldest);
                self.tasks.remove(&oldest);
            }
        }
    }
}

/// Turns protocol messages into agent turns and agent replies into tasks
pub struct AgentExecutor {
    agent: Arc<ConversationalAgent>,
    tasks: RwLock<TaskCache>,
}

impl AgentExecutor {
    pub fn new(agent: Arc<ConversationalAgent>) -> Self {
        Self::with_task_capacity(agent, DEFAULT_TASK_CAPACITY)
    }

    pub fn with_task_capacity(agent: Arc<ConversationalAgent>, capacity: usize) -> Self {
        Self {
            agent,
            tasks: RwLock::new(TaskCache::new(capacity)),
        }
    }

    pub fn agent(&self) -> &Arc<ConversationalAgent> {
        &self.agent
    }

    /// Execute one incoming message.
    ///
    /// The message's context id (or a fresh one) is the agent's session, so a
    /// caller that echoes the returned context id keeps the conversation going.
    pub async fn execute(&self, message: Message) -> Result<Task, LlmError> {
        let query = message.text();

        let existing = match &message.task_id {
            Some(id) => self.tasks.read().await.get(id).cloned(),
            None => None,
        };

        let (task_id, context_id) = match existing {
            Some(task) => (task.id, task.context_id),
            None => (
                Uuid::new_v4().to_string(),
                message
                    .context_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ),
        };

        debug!("Executing task {} in context {}", task_id, context_id);

        let reply = self.agent.respond(&query, &context_id).await?;

        let state = if reply.needs_user_input {
            TaskState::InputRequired
        } else {
            TaskState::Completed
        };

        let mut incoming = message;
        incoming.context_id = Some(context_id.clone());
        incoming.task_id = Some(task_id.clone());

        let status_message = Message::agent_text(reply.text.clone(), &context_id, &task_id);

        let mut task = Task::new(context_id, state);
        task.id = task_id;
        task.status.message = Some(status_message);
        task.artifacts = vec![Artifact {
            artifact_id: Uuid::new_v4().to_string(),
            name: Some("current_result".to_string()),
            description: Some("Result of request to agent.".to_string()),
            parts: vec![Part::text(reply.text)],
        }];
        task.history = vec![incoming];

        self.tasks.write().await.insert(task.clone());
        Ok(task)
    }

    /// Look up a previously executed task
    pub async fn get_task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }
}
