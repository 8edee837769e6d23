// Tests for serving a leaf agent over the task protocol

mod common;

use std::sync::Arc;

use common::{Scripted, ScriptedModel};
use serde_json::json;
use switchboard::agent::{weather, ConversationalAgent};
use switchboard::config::WeatherConfig;
use switchboard::protocol::{
    A2aMethod, JsonRpcRequest, Message, TaskState, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
    TASK_NOT_CANCELABLE, TASK_NOT_FOUND,
};
use switchboard::remote::{
    CardResolver, HttpTaskTransport, RemoteAgentConnection, SendOutcome, TaskTransport,
};
use switchboard::router::extract_task_output;
use switchboard::server::{A2aServer, AgentExecutor};
use switchboard::session::SessionStore;
use switchboard::weather::WeatherClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn spawn_server(model: Arc<ScriptedModel>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let client = Arc::new(WeatherClient::new(&WeatherConfig::default()));
    let agent = weather::weather_agent(model, client, 4);
    let server = A2aServer::new(
        "127.0.0.1:0",
        weather::agent_card(address.clone()),
        AgentExecutor::new(Arc::new(agent)),
    );

    tokio::spawn(server.serve(listener));
    address
}

#[tokio::test]
async fn test_serves_agent_card_on_both_paths() {
    let address = spawn_server(ScriptedModel::texts(&[])).await;

    let card = CardResolver::new().resolve(&address).await.unwrap();
    assert_eq!(card.name, "Weather Agent");
    assert_eq!(card.url, address);
    assert_eq!(card.skills[0].id, "weather_search");
    assert!(!card.capabilities.streaming);

    let legacy: serde_json::Value = reqwest::get(format!("{}/.well-known/agent.json", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(legacy["name"], "Weather Agent");
    assert_eq!(legacy["defaultInputModes"], json!(["text"]));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let address = spawn_server(ScriptedModel::texts(&[])).await;

    let response = reqwest::get(format!("{}/nope", address)).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_message_send_returns_completed_task() {
    let model = ScriptedModel::texts(&["Sunny in Seattle.", "Still sunny."]);
    let address = spawn_server(model.clone()).await;
    let card = CardResolver::new().resolve(&address).await.unwrap();
    let connection = RemoteAgentConnection::http(card, &address);

    let outcome = connection
        .send(Message::user_text("Weather in Seattle, WA?", None))
        .await
        .unwrap();
    let SendOutcome::Task(task) = outcome else {
        panic!("expected a task");
    };

    assert_eq!(task.status.state, TaskState::Completed);
    assert_eq!(extract_task_output(Some(&task)), "Sunny in Seattle.");
    assert_eq!(task.artifacts[0].name.as_deref(), Some("current_result"));
    assert!(!task.context_id.is_empty());

    // Echoing the context id continues the same agent conversation
    let outcome = connection
        .send(Message::user_text("And tomorrow?", Some(task.context_id.clone())))
        .await
        .unwrap();
    let SendOutcome::Task(second) = outcome else {
        panic!("expected a task");
    };

    assert_eq!(second.context_id, task.context_id);
    let followup = &model.requests()[1].messages;
    assert_eq!(followup.len(), 4);
    assert_eq!(followup[1].content, "Weather in Seattle, WA?");
    assert_eq!(followup[2].content, "Sunny in Seattle.");
}

#[tokio::test]
async fn test_get_and_cancel_task() {
    let address = spawn_server(ScriptedModel::texts(&["done"])).await;
    let transport = HttpTaskTransport::new(address.clone());
    let connection = RemoteAgentConnection::http(
        CardResolver::new().resolve(&address).await.unwrap(),
        &address,
    );

    let SendOutcome::Task(task) = connection.send(Message::user_text("hi", None)).await.unwrap() else {
        panic!("expected a task");
    };

    let response = transport
        .send(JsonRpcRequest::new(json!(2), A2aMethod::GetTask, json!({"id": task.id})))
        .await
        .unwrap();
    assert_eq!(response.id, json!(2));
    assert_eq!(response.result.unwrap()["id"], json!(task.id));

    let response = transport
        .send(JsonRpcRequest::new(json!(3), A2aMethod::GetTask, json!({"id": "missing"})))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, TASK_NOT_FOUND);

    let response = transport
        .send(JsonRpcRequest::new(json!(4), A2aMethod::CancelTask, json!({"id": task.id})))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, TASK_NOT_CANCELABLE);
}

#[tokio::test]
async fn test_json_rpc_error_codes() {
    let address = spawn_server(ScriptedModel::texts(&[])).await;
    let client = reqwest::Client::new();

    let parse: serde_json::Value = client
        .post(&address)
        .body("{not json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parse["error"]["code"], json!(PARSE_ERROR));

    let unknown: serde_json::Value = client
        .post(&address)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "agent/dance", "params": {}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unknown["error"]["code"], json!(METHOD_NOT_FOUND));
    assert_eq!(unknown["id"], json!(1));

    let invalid: serde_json::Value = client
        .post(&address)
        .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "message/send", "params": {"nope": true}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(invalid["error"]["code"], json!(INVALID_PARAMS));
}

#[tokio::test]
async fn test_model_failure_is_internal_error() {
    let address = spawn_server(ScriptedModel::new(vec![Scripted::Fail])).await;
    let card = CardResolver::new().resolve(&address).await.unwrap();
    let connection = RemoteAgentConnection::http(card, &address);

    let outcome = connection.send(Message::user_text("hi", None)).await.unwrap();

    assert!(matches!(outcome, SendOutcome::Failure(err) if err.code == -32603));
}

#[tokio::test]
async fn test_executor_uses_message_context_as_session() {
    let model = ScriptedModel::texts(&["one", "two"]);
    let agent = Arc::new(ConversationalAgent::new(weather::profile(), model));
    let executor = AgentExecutor::new(agent.clone());

    let task = executor
        .execute(Message::user_text("first", Some("ctx-42".to_string())))
        .await
        .unwrap();
    assert_eq!(task.context_id, "ctx-42");
    assert_eq!(task.history.len(), 1);
    assert_eq!(task.history[0].task_id.as_deref(), Some(task.id.as_str()));

    let mut followup = Message::user_text("second", None);
    followup.task_id = Some(task.id.clone());
    let second = executor.execute(followup).await.unwrap();

    assert_eq!(second.id, task.id);
    assert_eq!(second.context_id, "ctx-42");
    assert_eq!(agent.store().len("ctx-42").await, 4);
    assert_eq!(executor.get_task(&task.id).await.unwrap().status.message.unwrap().text(), "two");
}

#[tokio::test]
async fn test_executor_evicts_oldest_tasks() {
    let model = ScriptedModel::texts(&["one", "two", "three"]);
    let agent = Arc::new(ConversationalAgent::new(weather::profile(), model));
    let executor = AgentExecutor::with_task_capacity(agent, 2);

    let mut ids = Vec::new();
    for text in ["a", "b", "c"] {
        let task = executor.execute(Message::user_text(text, None)).await.unwrap();
        ids.push(task.id);
    }

    assert!(executor.get_task(&ids[0]).await.is_none());
    assert!(executor.get_task(&ids[1]).await.is_some());
    assert_eq!(executor.get_task(&ids[2]).await.unwrap().status.state, TaskState::Completed);
}

#[tokio::test]
async fn test_oversized_header_line_closes_connection() {
    let address = spawn_server(ScriptedModel::texts(&[])).await;
    let mut stream = TcpStream::connect(address.trim_start_matches("http://")).await.unwrap();

    stream.write_all(b"GET /.well-known/agent-card.json HTTP/1.1\r\nX-Filler: ").await.unwrap();
    stream.write_all(&vec![b'a'; 16 * 1024]).await.unwrap();

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    assert!(response.is_empty());

    // The server keeps accepting well-formed requests
    let card = CardResolver::new().resolve(&address).await.unwrap();
    assert_eq!(card.name, "Weather Agent");
}
