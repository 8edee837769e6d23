//! Per-turn routing decision

use serde_json::{Map, Value};

/// Decision produced by the classification call for one turn.
///
/// Fields are optional because the model may omit them; blank strings are
/// read as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Delegate {
        agent: Option<String>,
        task: Option<String>,
    },
    AskUser {
        question: Option<String>,
    },
    Respond {
        message: Option<String>,
    },
}

/// Why raw planner output could not be read as a plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

fn field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Plan {
    /// Strict parse; an object without a known `action` is a `Respond`
    pub fn try_parse(raw: &str) -> Result<Plan, PlanError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(obj) = &value else {
            return Err(PlanError::NotAnObject(kind_of(&value)));
        };

        let plan = match obj.get("action").and_then(Value::as_str) {
            Some("delegate") => Plan::Delegate {
                agent: field(obj, "agent"),
                task: field(obj, "task"),
            },
            Some("ask_user") => Plan::AskUser {
                question: field(obj, "question"),
            },
            _ => Plan::Respond {
                message: field(obj, "message"),
            },
        };

        Ok(plan)
    }

    /// Parse planner output, falling back to replying with the raw text
    pub fn parse(raw: &str) -> Plan {
        match Self::try_parse(raw) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!("Router response was not a valid plan ({}): {}", e, raw);
                Plan::Respond {
                    message: Some(raw.to_string()).filter(|s| !s.trim().is_empty()),
                }
            }
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Plan::Delegate { .. } => "delegate",
            Plan::AskUser { .. } => "ask_user",
            Plan::Respond { .. } => "respond",
        }
    }
}
