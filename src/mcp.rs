//! MCP server over newline-delimited JSON-RPC 2.0.
//!
//! Each request line is handled on its own task so slow tool calls do not
//! block `ping` or `tools/list`; responses are funneled through a single
//! writer so frames never interleave on the output stream.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::ServerConfig;
use crate::error::ToolError;
use crate::tools::ToolRegistry;

/// Protocol revision advertised when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// `None` when the member is absent (a notification). An explicit
    /// `"id": null` is kept as `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub struct McpServer {
    registry: ToolRegistry,
    info: ServerConfig,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, info: ServerConfig) -> Self {
        Self { registry, info }
    }

    /// Handle one raw frame. Returns `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("MCP: unparsable frame: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) if request.jsonrpc != "2.0" => Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {:?}", request.jsonrpc),
            )),
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = match request.id {
            None => {
                log::debug!("MCP: notification {}", request.method);
                return None;
            }
            Some(Value::Null) => {
                log::warn!("MCP: {} sent with a null id", request.method);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    INVALID_REQUEST,
                    "Invalid request: id must not be null",
                ));
            }
            Some(id) => id,
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result(&request.params)),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                JsonRpcResponse::success(id, json!({ "tools": self.registry.definitions() }))
            }
            "tools/call" => self.handle_call_tool(id, request.params).await,
            other => {
                log::debug!("MCP: unsupported method {}", other);
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        };

        Some(response)
    }

    fn initialize_result(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);

        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version
            }
        })
    }

    async fn handle_call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
        };

        log::info!("MCP: tools/call {}", params.name);
        match self.registry.call(&params.name, params.arguments).await {
            Ok(output) => match serde_json::to_string_pretty(&output) {
                Ok(text) => JsonRpcResponse::success(id, text_content(text, false)),
                Err(e) => JsonRpcResponse::success(id, text_content(format!("Error: {}", e), true)),
            },
            Err(ToolError::UnknownTool(name)) => {
                JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {}", name))
            }
            Err(e) => JsonRpcResponse::success(id, text_content(format!("Error: {}", e), true)),
        }
    }

    /// Serve requests from `reader` until EOF, writing one response per line
    /// to `writer`.
    ///
    /// Stops reading as soon as the writer fails; pending handlers are
    /// cancelled and the write error is returned.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let writer_task = tokio::spawn(async move {
            while let Some(response) = rx.recv().await {
                let mut frame =
                    serde_json::to_vec(&response).context("Failed to encode response")?;
                frame.push(b'\n');
                writer.write_all(&frame).await.context("Failed to write response")?;
                writer.flush().await.context("Failed to flush output")?;
            }
            Ok::<(), anyhow::Error>(())
        });

        let mut in_flight = JoinSet::new();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await.context("Failed to read from input")? {
            if writer_task.is_finished() {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let server = Arc::clone(&self);
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_message(&line).await {
                    if tx.send(response).is_err() {
                        log::warn!("MCP: output closed, dropping response");
                    }
                }
            });

            // Reap finished handlers so the set does not grow unbounded.
            while in_flight.try_join_next().is_some() {}
        }

        if writer_task.is_finished() {
            log::warn!(
                "MCP: output closed, cancelling {} pending request(s)",
                in_flight.len()
            );
            in_flight.shutdown().await;
        } else {
            log::info!("MCP: input closed, waiting for {} pending request(s)", in_flight.len());
            while in_flight.join_next().await.is_some() {}
        }
        drop(tx);

        writer_task.await.context("Writer task panicked")?
    }

    /// Serve on the process's stdin/stdout.
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }
}

fn text_content(text: String, is_error: bool) -> Value {
    let mut result = json!({
        "content": [{ "type": "text", "text": text }]
    });
    if is_error {
        result["isError"] = json!(true);
    }
    result
}
