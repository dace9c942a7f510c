//! Single-word lookup with the full etymology record.

use serde::Deserialize;
use serde_json::json;

use super::ToolContext;
use super::reply::{WordLookup, non_empty};
use crate::core::error::ToolError;
use crate::core::server::{MCPTool, ToolRegistry};
use crate::gemini::GenerationParams;

pub const NAME: &str = "lookup_word_etymology";

const GENERATION: GenerationParams = GenerationParams::new(0.7, 1500);

#[derive(Debug, Deserialize)]
struct LookupArgs {
    word: String,
}

/// Register the lookup tool
///
/// # Arguments
/// * `registry` - Tool registry to add the tool to
/// * `context` - Shared context handed to every call
pub fn register(registry: &mut ToolRegistry, context: &ToolContext) {
    let tool = MCPTool {
        name: NAME.to_string(),
        description: "Looks up the Tamil etymology of a specific word. \
            Returns comprehensive information about its Tamil origin, romanization, \
            meaning, linguistic journey, first recorded use, related words, and usage examples. \
            Use this for deep dives into individual words."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "word": {
                    "type": "string",
                    "description": "The specific word to look up (e.g., 'catamaran', 'curry', 'mango')"
                }
            },
            "required": ["word"]
        }),
    };

    let handler = super::typed_handler(context, |ctx, args: LookupArgs| async move {
        lookup(&ctx, &args.word).await
    });
    registry.register(tool, handler);
}

pub async fn lookup(ctx: &ToolContext, word: &str) -> Result<String, ToolError> {
    let result: WordLookup = ctx.ask(NAME, &prompt(word), GENERATION).await?;
    render(&result)
}

pub fn prompt(word: &str) -> String {
    format!(
        r#"Provide detailed Tamil etymology for the word "{word}".

Return ONLY valid JSON (no markdown, no preamble):
{{
  "word": "{word}",
  "hasTamilOrigin": true/false,
  "tamilOrigin": "original Tamil word in Tamil script",
  "tamilRomanized": "romanized Tamil word with diacritics",
  "meaning": "detailed meaning in Tamil and English",
  "etymology": "comprehensive etymology explanation (3-5 sentences)",
  "route": "linguistic route (direct/via Portuguese/Dutch/Arabic/etc)",
  "firstRecordedUse": "time period (e.g., '16th century')",
  "relatedWords": ["list", "of", "related", "words"],
  "examples": ["example usage 1", "example usage 2"],
  "culturalContext": "cultural significance if any"
}}

If the word does not have Tamil origin, set hasTamilOrigin to false and provide explanation."#
    )
}

/// Render a lookup reply.
///
/// # Arguments
/// * `result` - Decoded model reply
///
/// Fails only when the reply claims a Tamil origin but leaves out one of the
/// fields that claim needs.
pub fn render(result: &WordLookup) -> Result<String, ToolError> {
    let mut lines = vec![format!("🔍 ADITAMIL WORD LOOKUP: {}\n", result.word)];

    if !result.has_tamil_origin() {
        lines.push(format!(
            "❌ '{}' does not appear to have Tamil origin.",
            result.word
        ));
        if let Some(explanation) = non_empty(&result.etymology) {
            lines.push(format!("\n{}", explanation));
        }
        return Ok(lines.join("\n"));
    }

    let origin = result.confirmed()?;
    lines.push("✅ Tamil Origin Confirmed\n".to_string());
    lines.push(format!(
        "Tamil Word: {} ({})",
        origin.tamil_origin, origin.tamil_romanized
    ));
    lines.push(format!("Meaning: {}", origin.meaning));
    lines.push(format!("Route: {}", origin.route));
    lines.push(format!("\nEtymology:\n{}", origin.etymology));

    if let Some(first) = non_empty(&result.first_recorded_use) {
        lines.push(format!("\nFirst Recorded: {}", first));
    }

    if let Some(context) = non_empty(&result.cultural_context) {
        lines.push(format!("\nCultural Context:\n{}", context));
    }

    if let Some(related) = result.related_words.as_ref().filter(|w| !w.is_empty()) {
        lines.push(format!("\nRelated Words: {}", related.join(", ")));
    }

    if let Some(examples) = result.examples.as_ref().filter(|e| !e.is_empty()) {
        lines.push("\nExamples:".to_string());
        lines.extend(examples.iter().map(|example| format!("  • {}", example)));
    }

    Ok(lines.join("\n"))
}
