//! Configuration from environment variables and an optional YAML file.
//!
//! Environment variables always win over the file. The file only carries the
//! model selection and per-tool generation overrides, for example:
//!
//! ```yaml
//! model: gemini-3-flash-preview
//! tools:
//!   lookup_word_etymology:
//!     temperature: 0.4
//!     max_output_tokens: 1200
//! ```
//!
//! Tools are keyed by their MCP name. `batch_analyze_texts` items fall back to
//! the `analyze_tamil_etymology` entry when the batch tool has none of its own.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::ConfigError;
use crate::gemini::GenerationParams;

pub const DEFAULT_SERVER_NAME: &str = "aditamil";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CONFIG_PATH: &str = "aditamil.yaml";
pub const DEFAULT_PORT: u16 = 3000;

/// Which transports the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Line-delimited JSON-RPC on stdin/stdout (what MCP clients spawn)
    Stdio,
    /// JSON-RPC over HTTP with Actix Web
    Http,
    /// Both at once; stdio runs in a background task
    Both,
}

impl TransportMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::InvalidValue {
                key: "MCP_TRANSPORT_MODE",
                value: format!("'{}' (must be 'stdio', 'http', or 'both')", other),
            }),
        }
    }
}

/// Per-tool sampling overrides from the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct GenerationOverride {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl GenerationOverride {
    /// Apply the override on top of a tool's built-in parameters.
    pub fn apply(&self, params: GenerationParams) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature.unwrap_or(params.temperature),
            max_output_tokens: self.max_output_tokens.unwrap_or(params.max_output_tokens),
        }
    }
}

/// Shape of the optional YAML config file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub tools: HashMap<String, GenerationOverride>,
}

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    /// None means the request waits as long as the transport allows
    pub timeout: Option<Duration>,
}

/// Everything the binary needs to start serving.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_name: String,
    pub server_version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub gemini: GeminiSettings,
    pub tools: HashMap<String, GenerationOverride>,
}

impl Settings {
    /// Load settings from the process environment and the config file it names.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// `from_env` passes `std::env::var`; tests pass a map so they never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_key = lookup("GEMINI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let config_path = var("ADITAMIL_CONFIG", DEFAULT_CONFIG_PATH);
        let file = load_config(Path::new(&config_path))?;

        let transport = TransportMode::parse(&var("MCP_TRANSPORT_MODE", "stdio"))?;

        let timeout = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "GEMINI_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        // Defaults to CPU count but capped at 16; actix panics on zero
        let workers = lookup("WORKER_THREADS")
            .and_then(|s| s.parse::<usize>().ok())
            .map(|n| n.max(1))
            .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

        Ok(Self {
            server_name: var("SERVER_NAME", DEFAULT_SERVER_NAME),
            server_version: var("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
            transport,
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "3000").parse::<u16>().unwrap_or(DEFAULT_PORT),
            workers,
            gemini: GeminiSettings {
                api_key,
                model: lookup("GEMINI_MODEL")
                    .or(file.model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_base: lookup("GEMINI_API_BASE")
                    .or(file.api_base)
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout,
            },
            tools: file.tools,
        })
    }
}

/// Load the YAML config file.
///
/// A missing file yields the empty configuration; an unreadable or malformed
/// one is an error.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
