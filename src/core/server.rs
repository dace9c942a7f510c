//! MCP Server Implementation
//!
//! This module contains the core MCP server implementation including:
//! - JSON-RPC 2.0 request/response structures
//! - Tool registry and the dispatch boundary that turns tool failures into text
//! - Request routing shared by both transports
//! - HTTP server setup with Actix Web
//! - STDIO server implementation for line-based communication, with requests
//!   handled concurrently and responses written by a single writer task

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use actix_web::{
    App, HttpResponse, HttpServer, Result, web,
    middleware::{Compress, DefaultHeaders, Logger},
};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

use crate::core::error::ToolError;
use crate::tools::{self, ToolContext};

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Hints appended to every failed tool call.
pub const TROUBLESHOOTING: &str = "Troubleshooting:\n\
- Check your GEMINI_API_KEY is valid\n\
- Verify you haven't exceeded free tier limits (15 req/min)\n\
- Ensure text is not empty";

// JSON-RPC 2.0 error codes
const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// Server metadata reported in `initialize` responses.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Name reported in `serverInfo`
    pub server_name: String,
    /// Version reported in `serverInfo`
    pub server_version: String,
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// `id` is None for notifications, which never get a response.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version, always "2.0"
    #[allow(dead_code)]
    jsonrpc: String,
    /// Request identifier echoed back in the response
    pub id: Option<Value>,
    /// Method name (e.g. "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method parameters, if any
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Exactly one of `result` and `error` is present.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    /// JSON-RPC version, always "2.0"
    jsonrpc: String,
    /// Identifier of the request being answered
    pub id: Option<Value>,
    /// Method result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error details on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    /// JSON-RPC error code (e.g. -32601 for an unknown method)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Additional error data, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP tool definition as reported by `tools/list`.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool name used in `tools/call`
    pub name: String,
    /// What the tool does, shown to the client's model
    pub description: String,
    /// JSON Schema of the tool's arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Future returned by a tool handler.
pub type ToolFuture = BoxFuture<'static, Result<String, ToolError>>;

/// Tool handler function type definition.
///
/// Handlers take the raw JSON arguments and resolve to the rendered text or a
/// `ToolError`. They must be Send + Sync to be shared with the HTTP workers.
pub type ToolHandler = Box<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// Registry of available MCP tools.
///
/// Keeps the definitions in registration order for `tools/list` and a map of
/// handlers for `tools/call`.
pub struct ToolRegistry {
    pub tools: Vec<MCPTool>,
    handlers: HashMap<String, ToolHandler>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a tool definition together with its handler.
    ///
    /// # Arguments
    /// * `tool` - Tool definition with name, description, and input schema
    /// * `handler` - Function that executes the tool when called
    pub fn register(&mut self, tool: MCPTool, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Invoke a tool by name and return the text to send back to the client.
    ///
    /// This is the dispatch boundary: an unknown tool and every handler error
    /// come back as ordinary text, never as a protocol fault.
    ///
    /// # Arguments
    /// * `name` - Tool name from the `tools/call` params
    /// * `arguments` - Raw JSON arguments passed to the handler
    pub async fn call(&self, name: &str, arguments: Value) -> String {
        let Some(handler) = self.handlers.get(name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return format!("Unknown tool: {}", name);
        };

        let started = Instant::now();
        let outcome = handler(arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(text) => {
                tracing::info!(tool = name, elapsed_ms, chars = text.len(), "tool call succeeded")
            }
            Err(e) => tracing::warn!(tool = name, elapsed_ms, error = %e, "tool call failed"),
        }

        render_outcome(outcome)
    }
}

/// Map a tool outcome to the text delivered to the client.
pub fn render_outcome(outcome: Result<String, ToolError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(e) => format!("Error: {}\n\n{}", e, TROUBLESHOOTING),
    }
}

/// Build the registry with every tool bound to the given context.
///
/// # Arguments
/// * `context` - Shared context (text generator and overrides) for all tools
pub fn initialize_tools(context: &ToolContext) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    tools::register_all(&mut registry, context);
    Arc::new(registry)
}

/// MCP method routing shared by the STDIO and HTTP transports.
pub struct McpServer {
    state: AppState,
    registry: Arc<ToolRegistry>,
    requests: AtomicU64,
}

impl McpServer {
    pub fn new(state: AppState, registry: Arc<ToolRegistry>) -> Self {
        Self {
            state,
            registry,
            requests: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Total requests handled since start, notifications included.
    pub fn requests_total(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Route one request. Returns None for notifications.
    pub async fn handle(&self, req: MCPRequest) -> Option<MCPResponse> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let Some(id) = req.id else {
            tracing::debug!(method = %req.method, "notification received");
            return None;
        };
        let id = Some(id);

        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => MCPResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            _ => MCPResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", req.method),
            ),
        };
        Some(response)
    }

    /// Handle one raw line from the STDIO transport.
    ///
    /// Returns the serialized response, if any. Lines that fail to parse get a
    /// parse error only when an id can still be recovered from them.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<MCPRequest>(line) {
            Ok(req) => self.handle(req).await?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse JSON-RPC request");
                let id = serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|v| v.get("id").cloned())?;
                MCPResponse::failure(Some(id), PARSE_ERROR, format!("Parse error: {}", e))
            }
        };

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                None
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> MCPResponse {
        MCPResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": self.state.server_name,
                    "version": self.state.server_version
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> MCPResponse {
        MCPResponse::success(id, json!({ "tools": self.registry.tools }))
    }

    /// Execute `tools/call`.
    ///
    /// Success and recovered tool errors look the same on the wire: one text
    /// block with `isError: false`. Only a call without params is a JSON-RPC
    /// error.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> MCPResponse {
        let Some(params) = params else {
            return MCPResponse::failure(id, INVALID_PARAMS, "Invalid params".to_string());
        };

        let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let text = self.registry.call(tool_name, arguments).await;

        MCPResponse::success(
            id,
            json!({
                "content": [
                    {
                        "type": "text",
                        "text": text
                    }
                ],
                "isError": false
            }),
        )
    }
}

async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "aditamil-mcp"
    })))
}

async fn metrics_handler(server: web::Data<McpServer>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "requests_total": server.requests_total(),
        "status": "ok"
    })))
}

/// JSON-RPC over HTTP. Notifications are acknowledged with 202 and no body.
async fn mcp_handler(
    server: web::Data<McpServer>,
    req: web::Json<MCPRequest>,
) -> Result<HttpResponse> {
    match server.handle(req.into_inner()).await {
        Some(response) => Ok(HttpResponse::Ok().json(response)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

/// Run the MCP server in HTTP mode.
///
/// Routes:
/// - `POST /mcp` and `POST /`: JSON-RPC requests
/// - `GET /health` and `GET /`: liveness
/// - `GET /metrics`: request counter
///
/// # Arguments
/// * `server` - Shared request router
/// * `host` - Interface to bind
/// * `port` - Port to bind
/// * `workers` - Number of actix worker threads, at least 1
pub async fn run_server_http(
    server: Arc<McpServer>,
    host: String,
    port: u16,
    workers: usize,
) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = format!("{}:{}", host, port);

    tracing::info!(
        name = %server.state.server_name,
        version = %server.state.server_version,
        bind = %bind_addr,
        workers,
        "MCP server starting (HTTP mode)"
    );

    let data = web::Data::from(server);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .wrap(Logger::new("%r %s %Dms"))
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/mcp", web::post().to(mcp_handler))
            .route("/", web::post().to(mcp_handler))
            .route("/", web::get().to(health))
    })
    .workers(workers)
    .keep_alive(Duration::from_secs(30))
    // Tool calls wait on Gemini; the request timeout only bounds reading the request
    .client_request_timeout(Duration::from_secs(30))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode.
///
/// Reads newline-delimited JSON-RPC requests from stdin and writes one response
/// line per request to stdout. All logging goes to stderr so the protocol
/// stream stays clean.
///
/// # Arguments
/// * `server` - Shared request router
pub async fn run_server_stdio(server: Arc<McpServer>) -> std::io::Result<()> {
    use tokio::io::BufReader;

    tracing::info!(
        name = %server.state.server_name,
        version = %server.state.server_version,
        tools = server.registry.tools.len(),
        "MCP server starting (STDIO mode)"
    );

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    serve_lines(server, stdin, tokio::io::stdout()).await?;

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Serve newline-delimited JSON-RPC from `reader` to `writer`.
///
/// Each line is handled on its own task, so a `ping` is answered while a slow
/// `tools/call` is still waiting on Gemini. Responses are written in completion
/// order by one writer task, one line each; clients match them up by `id`.
/// Returns once the input is exhausted and every in-flight request has been
/// answered.
///
/// # Arguments
/// * `server` - Shared request router
/// * `reader` - Source of request lines
/// * `writer` - Sink for response lines
pub async fn serve_lines<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        let mut out = BufWriter::with_capacity(8192, writer);
        while let Some(response) = rx.recv().await {
            out.write_all(response.as_bytes()).await?;
            out.write_all(b"\n").await?;
            // Flush per response; clients wait for each reply
            out.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let server = Arc::clone(&server);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_line(&line).await {
                // Only fails once the writer has given up on a broken pipe
                if tx.send(response).is_err() {
                    tracing::warn!("response dropped, stdout writer has stopped");
                }
            }
        });
    }

    // The writer ends when the last in-flight request drops its sender
    drop(tx);
    writer_task.await.map_err(std::io::Error::other)?
}
