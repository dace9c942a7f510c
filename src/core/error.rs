//! Error types for tool calls and server startup.
//!
//! `ToolError` covers everything that can go wrong while serving a single
//! `tools/call` request. It never leaves the dispatch boundary as a JSON-RPC
//! fault: `render_outcome` in the server module turns it into plain text.
//! `ConfigError` is only produced at startup and is fatal.

use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Required argument missing or of the wrong type
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Non-success status from the Gemini API
    #[error("Gemini API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure talking to the Gemini API
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Gemini answered with success but the body is not a `generateContent` envelope
    #[error("Unexpected Gemini response: {0}")]
    Protocol(String),

    /// The model answered without any text (blocked prompt, safety stop, ...)
    #[error("Model returned no text: {0}")]
    EmptyReply(String),

    /// Model reply was not the JSON shape the prompt asked for
    #[error("Could not decode model reply: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reply decoded but a field needed for rendering is absent
    #[error("Model reply is missing field '{0}'")]
    MissingField(&'static str),
}

/// Fatal configuration problem detected before serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
