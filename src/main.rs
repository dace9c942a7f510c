//! MCP Server Entry Point
//!
//! Reads configuration from the environment, builds the Gemini client and the
//! tool registry, then starts the transport selected by `MCP_TRANSPORT_MODE`.
//!
//! Environment Variables:
//! - GEMINI_API_KEY: Gemini API key (required)
//! - GEMINI_MODEL: model name (default: "gemini-3-flash-preview")
//! - GEMINI_API_BASE: API base URL
//! - GEMINI_TIMEOUT_SECS: request timeout (default: none)
//! - SERVER_NAME / SERVER_VERSION: reported by `initialize`
//! - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
//! - HOST / PORT: bind address for HTTP mode (default: 0.0.0.0:3000)
//! - WORKER_THREADS: HTTP worker count
//! - ADITAMIL_CONFIG: YAML config file (default: "aditamil.yaml")
//! - RUST_LOG / LOG_FORMAT: log filter and "json" for JSON log lines

use std::sync::Arc;

use aditamil_mcp::core::config::{Settings, TransportMode};
use aditamil_mcp::core::error::ConfigError;
use aditamil_mcp::core::server::{self, AppState, McpServer};
use aditamil_mcp::gemini::GeminiClient;
use aditamil_mcp::tools::ToolContext;
use tracing_subscriber::EnvFilter;

const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            if matches!(e, ConfigError::MissingApiKey) {
                eprintln!("Get your free API key at: {}", API_KEY_URL);
            }
            std::process::exit(1);
        }
    };

    let client = match GeminiClient::new(&settings.gemini) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("ERROR: failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(model = client.model(), "Gemini client ready");

    let context = ToolContext::new(Arc::new(client)).with_overrides(settings.tools.clone());
    let registry = server::initialize_tools(&context);
    let mcp = Arc::new(McpServer::new(
        AppState {
            server_name: settings.server_name.clone(),
            server_version: settings.server_version.clone(),
        },
        registry,
    ));

    match settings.transport {
        TransportMode::Stdio => server::run_server_stdio(mcp).await,
        TransportMode::Http => {
            server::run_server_http(mcp, settings.host, settings.port, settings.workers).await
        }
        TransportMode::Both => {
            // STDIO in the background, HTTP in the foreground
            let stdio_server = mcp.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_server).await {
                    tracing::error!(error = %e, "STDIO server error");
                }
            });

            let http_result =
                server::run_server_http(mcp, settings.host, settings.port, settings.workers).await;
            stdio_handle.abort();
            http_result
        }
    }
}

/// Log to stderr only; stdout carries the JSON-RPC stream.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
