//! Route-filtered analysis: only words that entered through a given language.
//!
//! The route is free text. It is not checked against any list; the model is
//! simply told which route to keep.

use serde::Deserialize;
use serde_json::json;

use super::ToolContext;
use super::reply::{RouteAnalysis, non_empty};
use crate::core::error::ToolError;
use crate::core::server::{MCPTool, ToolRegistry};
use crate::gemini::GenerationParams;

pub const NAME: &str = "find_tamil_words_by_route";

const GENERATION: GenerationParams = GenerationParams::new(0.7, 1500);

#[derive(Debug, Deserialize)]
struct RouteArgs {
    text: String,
    route: String,
}

/// Register the route tool
///
/// # Arguments
/// * `registry` - Tool registry to add the tool to
/// * `context` - Shared context handed to every call
pub fn register(registry: &mut ToolRegistry, context: &ToolContext) {
    let tool = MCPTool {
        name: NAME.to_string(),
        description: "Finds Tamil-origin words in text that came through a specific linguistic route. \
            Useful for exploring how Tamil words entered English through different languages \
            like Portuguese, Dutch, Arabic, etc. Great for linguistic research."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                },
                "route": {
                    "type": "string",
                    "description": "The linguistic route to filter by (e.g., 'Portuguese', 'Dutch', 'Arabic', 'direct')"
                }
            },
            "required": ["text", "route"]
        }),
    };

    let handler = super::typed_handler(context, |ctx, args: RouteArgs| async move {
        find_by_route(&ctx, &args.text, &args.route).await
    });
    registry.register(tool, handler);
}

pub async fn find_by_route(ctx: &ToolContext, text: &str, route: &str) -> Result<String, ToolError> {
    let result: RouteAnalysis = ctx.ask(NAME, &prompt(text, route), GENERATION).await?;
    Ok(render(text, route, &result))
}

pub fn prompt(text: &str, route: &str) -> String {
    format!(
        r#"Analyze this text and identify ONLY words with Tamil origins that came through "{route}": "{text}"

Return ONLY valid JSON:
{{
  "route": "{route}",
  "original_text": "{text}",
  "words_found": [
    {{
      "word": "word",
      "tamilOrigin": "Tamil script",
      "tamilRomanized": "romanized",
      "meaning": "meaning",
      "etymology": "explanation"
    }}
  ],
  "summary": "summary focusing on this specific route"
}}"#
    )
}

/// Render a route-filtered reply. Title and echo come from the caller's
/// arguments, not from the model.
///
/// # Arguments
/// * `text` - Text the caller asked about
/// * `route` - Route the caller filtered by
/// * `result` - Decoded model reply
pub fn render(text: &str, route: &str, result: &RouteAnalysis) -> String {
    let mut lines = vec![
        format!("🔍 TAMIL WORDS VIA {}", route.to_uppercase()),
        format!("Original text: {}\n", text),
    ];

    let words = result.words();
    if words.is_empty() {
        lines.push(format!(
            "❌ No Tamil-origin words found via {} in this text.",
            route
        ));
    } else {
        lines.push(format!(
            "✅ Found {} word(s) with Tamil origins via {}:\n",
            words.len(),
            route
        ));

        for (i, word) in words.iter().enumerate() {
            lines.push(format!("{}. **{}**", i + 1, word.word));
            lines.push(format!(
                "   Tamil: {} ({})",
                word.tamil_origin,
                word.tamil_romanized.as_deref().unwrap_or("")
            ));
            lines.push(format!("   Meaning: {}", word.meaning));
            lines.push(format!("   Etymology: {}\n", word.etymology));
        }
    }

    if let Some(summary) = non_empty(&result.summary) {
        lines.push(format!("📊 {}", summary));
    }

    lines.join("\n")
}
