// MCP server: line-delimited JSON-RPC over stdio

use crate::framing::{Inbound, InboundCodec};
use crate::protocol::*;
use crate::tools::{DispatchTable, ToolCatalog};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{AnyDelimiterCodecError, FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

/// Longest accepted input line.
const MAX_MESSAGE_BYTES: usize = 8 * 1024 * 1024;

/// Responses waiting for the writer.
const RESPONSE_BUFFER: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read input: {0}")]
    Framing(#[from] AnyDelimiterCodecError),

    #[error("failed to write output: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("response writer stopped: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

pub struct McpServer {
    info: ServerInfo,
    catalog: ToolCatalog,
    dispatch: DispatchTable,
}

impl McpServer {
    pub fn new(info: ServerInfo, catalog: ToolCatalog, dispatch: DispatchTable) -> Self {
        Self {
            info,
            catalog,
            dispatch,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn start(self: Arc<Self>) -> Result<(), ServerError> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one session over any byte stream pair.
    ///
    /// Each line is one JSON-RPC message. `tools/call` requests run in their own
    /// task, so a slow backend call never holds up later messages; responses are
    /// written by a single writer task in completion order. On end of input the
    /// server waits for in-flight calls to answer, then returns.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut lines = FramedRead::new(reader, InboundCodec::new(MAX_MESSAGE_BYTES));
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        let writer = tokio::spawn(write_responses(
            FramedWrite::new(writer, LinesCodec::new()),
            rx,
        ));

        info!(
            server = %self.info.name,
            version = %self.info.version,
            tools = self.catalog.len(),
            "MCP server ready"
        );

        let mut read_error = None;
        while let Some(frame) = lines.next().await {
            let line = match frame {
                Ok(Inbound::Line(line)) => line,
                Ok(Inbound::Rejected(reason)) => {
                    warn!(reason, limit = MAX_MESSAGE_BYTES, "Discarding unreadable message");
                    let _ = tx
                        .send(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(reason)))
                        .await;
                    continue;
                }
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match parse_message(&line) {
                Ok(request) => self.route(request, &tx).await,
                Err(response) => {
                    let _ = tx.send(response).await;
                }
            }

            if tx.is_closed() {
                warn!("Response writer closed, stopping");
                break;
            }
        }

        // In-flight calls hold their own senders; the writer drains until they finish.
        drop(tx);
        writer.await??;

        match read_error {
            Some(e) => Err(e.into()),
            None => {
                info!("Input closed, MCP server stopping");
                Ok(())
            }
        }
    }

    async fn route(self: &Arc<Self>, request: JsonRpcRequest, tx: &mpsc::Sender<JsonRpcResponse>) {
        if request.method == "tools/call" && !request.is_notification() {
            let server = Arc::clone(self);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    let _ = tx.send(response).await;
                }
            });
        } else if let Some(response) = self.handle_request(request).await {
            let _ = tx.send(response).await;
        }
    }

    /// Answer one request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let Some(id) = id else {
            match method.as_str() {
                "notifications/initialized" | "initialized" => info!("Client initialized"),
                other => debug!(method = %other, "Ignoring notification"),
            }
            return None;
        };

        let outcome = match method.as_str() {
            "initialize" => self.initialize(params),
            "notifications/initialized" | "initialized" | "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(params).await,
            other => {
                debug!(method = %other, "Unknown method");
                Err(JsonRpcError::method_not_found(other))
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = match params {
            Some(params) => serde_json::from_value(params)
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?,
            None => InitializeParams::default(),
        };

        match &params.client_info {
            Some(client) => info!(
                client = %client.name,
                client_version = %client.version,
                protocol = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "Initializing session"
            ),
            None => info!("Initializing session"),
        }

        to_result(InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
        })
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result(ListToolsResult {
            tools: self.catalog.list().to_vec(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))
            })?;

        to_result(self.invoke(params).await)
    }

    /// Run a tool and wrap the outcome as tool content. Failures are content too,
    /// never protocol errors.
    pub async fn invoke(&self, params: CallToolParams) -> CallToolResult {
        match self.dispatch.execute(&params.name, params.arguments).await {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => CallToolResult::error(format!("failed to render response: {}", e)),
            },
            Err(e) => CallToolResult::error(e.summary),
        }
    }
}

fn to_result<T: serde::Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

/// Decode one line. Invalid JSON is a parse error; JSON that is not a request
/// is an invalid request, answered with its id when one can be recovered.
fn parse_message(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "Unparseable message");
        JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e.to_string()))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Malformed request");
        JsonRpcResponse::error(id.clone(), JsonRpcError::invalid_request(format!("Invalid request: {}", e)))
    })?;

    if request.jsonrpc != "2.0" {
        return Err(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request("Unsupported jsonrpc version"),
        ));
    }

    Ok(request)
}

async fn write_responses<W>(
    mut sink: FramedWrite<W, LinesCodec>,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let line = serde_json::to_string(&response)?;
        if let Err(e) = sink.send(line).await {
            error!(error = %e, "Failed to write response");
            return Err(e.into());
        }
    }
    Ok(())
}
