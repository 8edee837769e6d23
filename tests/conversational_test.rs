// Tests for the conversational agent and its tool loop

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{call, Scripted, ScriptedModel};
use futures::StreamExt;
use serde_json::{json, Value};
use switchboard::agent::conversational::LOOP_EXHAUSTED_MESSAGE;
use switchboard::agent::{accommodation, AgentProfile, ConversationalAgent, Tool, ToolError, ToolTable};
use switchboard::llm::{FunctionSpec, Role};
use switchboard::session::SessionStore;

fn profile() -> AgentProfile {
    AgentProfile {
        name: "Test Agent".to_string(),
        instruction: "Be brief.".to_string(),
        temperature: Some(0.0),
        fallback: "No answer.".to_string(),
    }
}

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "echo".to_string(),
            description: "Echo a word".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"word": {"type": "string"}},
                "required": ["word"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        #[derive(serde::Deserialize)]
        struct Args {
            word: String,
        }
        let args: Args = serde_json::from_value(arguments)?;
        Ok(format!("echo: {}", args.word))
    }
}

fn tools() -> ToolTable {
    ToolTable::new().with(Arc::new(EchoTool))
}

#[tokio::test]
async fn test_respond_records_history() {
    let model = ScriptedModel::texts(&["Hello!", "Again!"]);
    let agent = ConversationalAgent::new(profile(), model.clone());

    let reply = agent.respond("hi", "ctx").await.unwrap();
    assert_eq!(reply.text, "Hello!");
    assert!(reply.is_task_complete);
    assert!(!reply.needs_user_input);

    agent.respond("hi again", "ctx").await.unwrap();

    let requests = model.requests();
    assert_eq!(requests[0].messages.len(), 2);
    assert_eq!(requests[0].messages[0].role, Role::System);
    assert_eq!(requests[0].messages[0].content, "Be brief.");
    assert_eq!(requests[0].temperature, Some(0.0));

    let second = &requests[1].messages;
    assert_eq!(second.len(), 4);
    assert_eq!(second[1].content, "hi");
    assert_eq!(second[2].content, "Hello!");
    assert_eq!(second[3].content, "hi again");

    assert_eq!(agent.store().len("ctx").await, 4);
    assert_eq!(agent.store().len("other").await, 0);
}

#[tokio::test]
async fn test_empty_content_uses_fallback() {
    let model = ScriptedModel::texts(&["   "]);
    let agent = ConversationalAgent::new(profile(), model);

    let reply = agent.respond("hi", "ctx").await.unwrap();

    assert_eq!(reply.text, "No answer.");
}

#[tokio::test]
async fn test_model_failure_leaves_history_untouched() {
    let model = ScriptedModel::new(vec![Scripted::Fail]);
    let agent = ConversationalAgent::new(profile(), model);

    assert!(agent.respond("hi", "ctx").await.is_err());
    assert_eq!(agent.store().len("ctx").await, 0);
}

#[tokio::test]
async fn test_tool_loop_feeds_results_back() {
    let model = ScriptedModel::new(vec![
        Scripted::Calls(vec![call("c1", "echo", r#"{"word": "sun"}"#)]),
        Scripted::Text("The tool said sun.".to_string()),
    ]);
    let agent = ConversationalAgent::new(profile(), model.clone()).with_tools(tools(), 8);

    let reply = agent.respond("echo sun", "ctx").await.unwrap();

    assert_eq!(reply.text, "The tool said sun.");
    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].functions.len(), 1);
    assert_eq!(requests[0].functions[0].name, "echo");

    let followup = &requests[1].messages;
    let tool_message = followup.last().unwrap();
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("c1"));
    assert_eq!(tool_message.content, "echo: sun");

    // Intermediate tool traffic is not kept in history
    assert_eq!(agent.store().len("ctx").await, 2);
}

#[tokio::test]
async fn test_unknown_tool_and_bad_arguments_are_reported_to_model() {
    let model = ScriptedModel::new(vec![
        Scripted::Calls(vec![
            call("c1", "teleport", "{}"),
            call("c2", "echo", "not json"),
            call("c3", "echo", r#"{"other": 1}"#),
        ]),
        Scripted::Text("done".to_string()),
    ]);
    let agent = ConversationalAgent::new(profile(), model.clone()).with_tools(tools(), 8);

    agent.respond("go", "ctx").await.unwrap();

    let followup = &model.requests()[1].messages;
    let results: Vec<&str> = followup
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], "Tool 'teleport' is not supported.");
    assert!(results[1].starts_with("Invalid arguments for 'echo'"));
    assert!(results[2].starts_with("Error running 'echo'"));
}

#[tokio::test]
async fn test_tool_loop_is_bounded() {
    let script = (0..5)
        .map(|i| Scripted::Calls(vec![call(&format!("c{}", i), "echo", r#"{"word": "again"}"#)]))
        .collect();
    let model = ScriptedModel::new(script);
    let agent = ConversationalAgent::new(profile(), model.clone()).with_tools(tools(), 3);

    let reply = agent.respond("loop forever", "ctx").await.unwrap();

    assert_eq!(reply.text, LOOP_EXHAUSTED_MESSAGE);
    assert_eq!(model.requests().len(), 3);
}

#[tokio::test]
async fn test_function_calls_ignored_without_tools() {
    let model = ScriptedModel::new(vec![Scripted::Calls(vec![call("c1", "echo", "{}")])]);
    let agent = ConversationalAgent::new(profile(), model.clone());

    let reply = agent.respond("hi", "ctx").await.unwrap();

    assert_eq!(reply.text, "No answer.");
    assert!(model.requests()[0].functions.is_empty());
}

#[tokio::test]
async fn test_stream_yields_single_reply() {
    let model = ScriptedModel::texts(&["streamed"]);
    let agent = ConversationalAgent::new(profile(), model);

    let replies: Vec<_> = agent.stream("hi", "ctx").collect().await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].as_ref().unwrap().text, "streamed");
}

#[tokio::test]
async fn test_accommodation_profile() {
    let model = ScriptedModel::texts(&["Try these neighborhoods."]);
    let agent = accommodation::accommodation_agent(model.clone());

    agent.respond("Room in LA", "ctx").await.unwrap();

    let request = &model.requests()[0];
    assert_eq!(request.temperature, Some(0.2));
    assert!(request.messages[0].content.contains("Airbnb"));
    assert!(request.functions.is_empty());

    let card = accommodation::agent_card("http://localhost:10002");
    assert_eq!(card.name, "Airbnb Agent");
    assert_eq!(card.default_input_modes, vec!["text", "text/plain"]);
}
