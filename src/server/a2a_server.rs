//! Task protocol server for a single leaf agent
//!
//! Serves the agent card on the well-known paths and answers JSON-RPC
//! requests posted to any other path.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use super::executor::AgentExecutor;
use crate::protocol::*;

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
const MAX_LINE_BYTES: usize = 8 * 1024;
const MAX_HEADERS: usize = 100;

struct ServerState {
    card: AgentCard,
    executor: AgentExecutor,
}

pub struct A2aServer {
    addr: String,
    state: Arc<ServerState>,
}

/// Minimal view of an HTTP request
#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

impl A2aServer {
    pub fn new(addr: impl Into<String>, card: AgentCard, executor: AgentExecutor) -> Self {
        Self {
            addr: addr.into(),
            state: Arc::new(ServerState { card, executor }),
        }
    }

    /// Bind the configured address and serve forever
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        tracing::info!(
            "{} listening on {}",
            self.state.card.name,
            listener.local_addr()?
        );

        loop {
            let (stream, addr) = listener.accept().await?;
            tracing::debug!("Accepted connection from {}", addr);

            let state = self.state.clone();
            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, state).await {
                    tracing::error!("Error handling connection: {}", e);
                }
            });
        }
    }

    async fn handle_connection(stream: TcpStream, state: Arc<ServerState>) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        while let Some(request) = read_request(&mut reader).await? {
            tracing::debug!("{} {}", request.method, request.path);

            let path = request.path.split('?').next().unwrap_or("/");
            match (request.method.as_str(), path) {
                ("GET", AGENT_CARD_PATH | LEGACY_AGENT_CARD_PATH) => {
                    let body = serde_json::to_string(&state.card)?;
                    write_response(&mut writer, "200 OK", &body).await?;
                }
                ("POST", _) => {
                    let response = Self::handle_body(&request.body, &state).await;
                    let body = serde_json::to_string(&response)?;
                    tracing::debug!("Sending: {}", body);
                    write_response(&mut writer, "200 OK", &body).await?;
                }
                ("GET", _) => {
                    write_response(&mut writer, "404 Not Found", r#"{"error":"not found"}"#).await?;
                }
                _ => {
                    write_response(
                        &mut writer,
                        "405 Method Not Allowed",
                        r#"{"error":"method not allowed"}"#,
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }

    async fn handle_body(body: &[u8], state: &ServerState) -> JsonRpcResponse {
        match serde_json::from_slice::<JsonRpcRequest>(body) {
            Ok(request) => Self::handle_request(request, state).await,
            Err(e) => JsonRpcResponse::error(json!(null), PARSE_ERROR, &format!("Parse error: {}", e)),
        }
    }

    async fn handle_request(request: JsonRpcRequest, state: &ServerState) -> JsonRpcResponse {
        let id = request.id;

        let method = match A2aMethod::from_str(&request.method) {
            Some(m) => m,
            None => {
                return JsonRpcResponse::error(id, METHOD_NOT_FOUND, "Method not found");
            }
        };

        match method {
            A2aMethod::SendMessage => {
                let params: SendMessageParams = match serde_json::from_value(request.params) {
                    Ok(p) => p,
                    Err(e) => {
                        return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e));
                    }
                };

                match state.executor.execute(params.message).await {
                    Ok(task) => to_result(id, &task),
                    Err(e) => {
                        tracing::error!("Agent execution failed: {}", e);
                        JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string())
                    }
                }
            }

            A2aMethod::GetTask => {
                let params: TaskIdParams = match serde_json::from_value(request.params) {
                    Ok(p) => p,
                    Err(e) => {
                        return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e));
                    }
                };

                match state.executor.get_task(&params.id).await {
                    Some(task) => to_result(id, &task),
                    None => JsonRpcResponse::error(id, TASK_NOT_FOUND, "Task not found"),
                }
            }

            A2aMethod::CancelTask => {
                JsonRpcResponse::error(id, TASK_NOT_CANCELABLE, "Task cannot be canceled")
            }

            A2aMethod::StreamMessage => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "Method not implemented"),
        }
    }
}

fn to_result(id: Value, task: &Task) -> JsonRpcResponse {
    match serde_json::to_value(task) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string()),
    }
}

/// Read one request; `None` once the peer closes the connection
async fn read_request<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<HttpRequest>> {
    let mut request_line = String::new();
    if read_limited_line(reader, &mut request_line).await? == 0 {
        return Ok(None);
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or("/").to_string();

    let mut content_length = 0usize;
    let mut header_count = 0usize;
    loop {
        let mut line = String::new();
        if read_limited_line(reader, &mut line).await? == 0 {
            break;
        }
        header_count += 1;
        if header_count > MAX_HEADERS {
            anyhow::bail!("Request has more than {} headers", MAX_HEADERS);
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().context("Invalid Content-Length")?;
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        anyhow::bail!("Request body of {} bytes exceeds limit", content_length);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Some(HttpRequest { method, path, body }))
}

/// Read one line of at most `MAX_LINE_BYTES`
async fn read_limited_line<R: AsyncBufRead + Unpin>(reader: &mut R, line: &mut String) -> Result<usize> {
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64)
        .read_line(line)
        .await?;
    if read == MAX_LINE_BYTES && !line.ends_with('\n') {
        anyhow::bail!("Request line exceeds {} bytes", MAX_LINE_BYTES);
    }
    Ok(read)
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, status: &str, body: &str) -> Result<()> {
    let http_response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    writer.write_all(http_response.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}
