//! Core Server Framework Module
//!
//! - config.rs: environment and YAML configuration
//! - error.rs: tool-call and startup error types
//! - server.rs: MCP server implementation with HTTP and STDIO transport

pub mod config;
pub mod error;
pub mod server;
