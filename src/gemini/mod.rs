//! Remote text generation.
//!
//! Tools only see the `TextGenerator` trait. The production implementation is
//! `GeminiClient`; tests substitute a stub that returns canned replies.

mod client;

pub use client::{GeminiClient, extract_text};

use async_trait::async_trait;

use crate::core::error::ToolError;

/// Sampling parameters sent with every prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub const fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }
}

/// A stateless text-generation backend: one prompt in, one text reply out.
///
/// Implementations must be safe to share between concurrent calls; each call
/// brings its own prompt and parameters.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, ToolError>;
}
