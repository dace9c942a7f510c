//! AdiTamil MCP server.
//!
//! Exposes four Tamil-etymology tools over the Model Context Protocol. Each
//! tool builds a prompt, asks Google Gemini for a JSON answer and renders that
//! answer as plain text.

pub mod core;
pub mod gemini;
pub mod tools;
