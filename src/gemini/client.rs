//! Google Gemini `generateContent` client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{GenerationParams, TextGenerator};
use crate::core::config::GeminiSettings;
use crate::core::error::ToolError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
///
/// Built once at startup and shared read-only by every tool call.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    /// Create a client from connection settings.
    ///
    /// No request timeout is set unless the settings carry one.
    pub fn new(settings: &GeminiSettings) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            endpoint: endpoint_url(&settings.api_base, &settings.model),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, ToolError> {
        let started = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_request(prompt, params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(
            model = %self.model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gemini generateContent finished"
        );

        if !status.is_success() {
            return Err(ToolError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        // The envelope is Gemini's, not the model's; only the inner text is
        // model output
        let json: Value =
            serde_json::from_str(&body).map_err(|e| ToolError::Protocol(e.to_string()))?;
        extract_text(&json)
    }
}

fn endpoint_url(api_base: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

fn build_request(prompt: &str, params: GenerationParams) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ],
        "generationConfig": {
            "temperature": params.temperature,
            "maxOutputTokens": params.max_output_tokens
        }
    })
}

/// Pull the reply text out of a `generateContent` response.
///
/// All text parts of the first candidate are concatenated. A response without
/// any text is an error naming the block or finish reason when Gemini gives one.
pub fn extract_text(response: &Value) -> Result<String, ToolError> {
    let candidate = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let text: String = candidate
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    let block_reason = response
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str());
    let finish_reason = candidate
        .and_then(|c| c.get("finishReason"))
        .and_then(|r| r.as_str());

    let reason = match (block_reason, finish_reason) {
        (Some(block), _) => format!("prompt blocked ({})", block),
        (None, Some(finish)) => format!("finish reason {}", finish),
        (None, None) => "no candidates in response".to_string(),
    };
    Err(ToolError::EmptyReply(reason))
}

/// Error text from a failed API call, verbatim when it isn't the usual JSON.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}
