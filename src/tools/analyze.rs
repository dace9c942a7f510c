//! Full-text analysis: find every Tamil-origin word in a piece of text.

use serde::Deserialize;
use serde_json::json;

use super::ToolContext;
use super::reply::{AnalysisResult, non_empty};
use crate::core::error::ToolError;
use crate::core::server::{MCPTool, ToolRegistry};
use crate::gemini::GenerationParams;

pub const NAME: &str = "analyze_tamil_etymology";

const GENERATION: GenerationParams = GenerationParams::new(0.7, 2048);

#[derive(Debug, Deserialize)]
struct AnalyzeArgs {
    text: String,
}

/// Register the analyze tool
///
/// # Arguments
/// * `registry` - Tool registry to add the tool to
/// * `context` - Shared context handed to every call
pub fn register(registry: &mut ToolRegistry, context: &ToolContext) {
    let tool = MCPTool {
        name: NAME.to_string(),
        description: "Analyzes text (English or Tamil) to identify words with Tamil origins. \
            Returns detailed etymology including the original Tamil word (in Tamil script), \
            meaning, and the linguistic route (direct or via Portuguese/Dutch/Arabic/etc). \
            Perfect for discovering Tamil influence in everyday language."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze for Tamil-origin words (English or Tamil)"
                }
            },
            "required": ["text"]
        }),
    };

    let handler = super::typed_handler(context, |ctx, args: AnalyzeArgs| async move {
        analyze(&ctx, &args.text).await
    });
    registry.register(tool, handler);
}

/// Analyze one text and render the report.
pub async fn analyze(ctx: &ToolContext, text: &str) -> Result<String, ToolError> {
    analyze_as(ctx, NAME, text).await
}

/// Analyze one text on behalf of `tool`.
///
/// `batch_analyze_texts` runs each item through here under its own name so
/// that its configured overrides apply.
///
/// # Arguments
/// * `ctx` - Shared tool context
/// * `tool` - Name used to look up generation overrides
/// * `text` - Text to analyze
pub(crate) async fn analyze_as(
    ctx: &ToolContext,
    tool: &str,
    text: &str,
) -> Result<String, ToolError> {
    let result: AnalysisResult = ctx.ask(tool, &prompt(text), GENERATION).await?;
    Ok(render(&result))
}

pub fn prompt(text: &str) -> String {
    format!(
        r#"Analyze this text and identify ALL words that have Tamil origins, including words that came through other languages (like Portuguese, Dutch, Arabic, etc.): "{text}"

Return ONLY valid JSON (no markdown, no preamble, no explanation) in this exact format:
{{
  "original_text": "{text}",
  "words_found": [
    {{
      "word": "the word found in text",
      "tamilOrigin": "original Tamil word in Tamil script",
      "tamilRomanized": "romanized Tamil word (e.g., kaṭṭumaram)",
      "meaning": "meaning in Tamil/English",
      "etymology": "detailed explanation of how it entered the language",
      "route": "direct/via Portuguese/via Dutch/via Arabic/etc",
      "firstRecordedUse": "approximate time period if known"
    }}
  ],
  "summary": "brief summary of findings (2-3 sentences)"
}}

Be thorough - include common words like: catamaran (கட்டுமரம்), curry (கறி), mango (மாங்காய்), rice (அரிசி), cash (காசு), cheroot (சுருட்டு), betel (வெற்றிலை), etc."#
    )
}

pub fn render(result: &AnalysisResult) -> String {
    let mut lines = vec![
        "📝 ADITAMIL ETYMOLOGY ANALYSIS (ஆதி)".to_string(),
        format!(
            "Original text: {}\n",
            result.original_text.as_deref().unwrap_or("")
        ),
    ];

    let words = result.words();
    if words.is_empty() {
        lines.push("❌ No Tamil-origin words found in this text.".to_string());
    } else {
        lines.push(format!("✅ Found {} word(s) with Tamil origins:\n", words.len()));

        for (i, word) in words.iter().enumerate() {
            lines.push(format!("{}. **{}**", i + 1, word.word));
            lines.push(format!(
                "   Tamil Origin: {} ({})",
                word.tamil_origin,
                word.tamil_romanized.as_deref().unwrap_or("")
            ));
            lines.push(format!("   Meaning: {}", word.meaning));
            lines.push(format!("   Route: {}", word.route));
            lines.push(format!("   Etymology: {}", word.etymology));
            if let Some(first) = non_empty(&word.first_recorded_use) {
                lines.push(format!("   First recorded: {}", first));
            }
            lines.push(String::new());
        }
    }

    if let Some(summary) = non_empty(&result.summary) {
        lines.push(format!("📊 Summary: {}", summary));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::reply::decode;

    fn record(word: &str, first: Option<&str>) -> serde_json::Value {
        let mut value = json!({
            "word": word,
            "tamilOrigin": "கறி",
            "tamilRomanized": "kaṟi",
            "meaning": "sauce",
            "etymology": "via traders",
            "route": "via Portuguese"
        });
        if let Some(first) = first {
            value["firstRecordedUse"] = json!(first);
        }
        value
    }

    #[test]
    fn test_prompt_embeds_text_in_quotes() {
        let prompt = prompt("The catamaran sailed");
        assert!(prompt.contains("\"The catamaran sailed\""));
        assert!(prompt.contains("\"original_text\": \"The catamaran sailed\""));
        assert!(prompt.contains("Return ONLY valid JSON (no markdown"));
        assert!(prompt.contains("\"firstRecordedUse\""));
    }

    #[test]
    fn test_render_enumerates_every_record() {
        let reply = json!({
            "original_text": "curry and rice with cash",
            "words_found": [record("curry", Some("1598")), record("rice", None), record("cash", None)],
            "summary": "Three words."
        });
        let result: AnalysisResult = decode(&reply.to_string()).unwrap();
        let text = render(&result);

        assert!(text.starts_with("📝 ADITAMIL ETYMOLOGY ANALYSIS (ஆதி)\nOriginal text: curry and rice with cash\n"));
        assert!(text.contains("✅ Found 3 word(s) with Tamil origins:"));
        assert!(text.contains("1. **curry**"));
        assert!(text.contains("2. **rice**"));
        assert!(text.contains("3. **cash**"));
        assert!(!text.contains("4. **"));
        assert_eq!(text.matches("   Tamil Origin: கறி (kaṟi)").count(), 3);
        assert_eq!(text.matches("   Meaning: sauce").count(), 3);
        assert_eq!(text.matches("   Route: via Portuguese").count(), 3);
        assert_eq!(text.matches("   Etymology: via traders").count(), 3);
        assert_eq!(text.matches("   First recorded: ").count(), 1);
        assert!(text.ends_with("📊 Summary: Three words."));
    }

    #[test]
    fn test_render_without_summary() {
        let reply = json!({ "words_found": [record("mango", None)] });
        let result: AnalysisResult = decode(&reply.to_string()).unwrap();
        let text = render(&result);

        assert!(text.contains("1. **mango**"));
        assert!(!text.contains("📊"));
    }

    #[test]
    fn test_render_no_words() {
        let result: AnalysisResult =
            decode(r#"{"original_text": "hello", "words_found": [], "summary": ""}"#).unwrap();
        let text = render(&result);

        assert_eq!(
            text,
            "📝 ADITAMIL ETYMOLOGY ANALYSIS (ஆதி)\nOriginal text: hello\n\n❌ No Tamil-origin words found in this text."
        );
    }

    #[test]
    fn test_render_missing_romanization_leaves_empty_parens() {
        let reply = json!({
            "words_found": [{
                "word": "betel", "tamilOrigin": "வெற்றிலை", "meaning": "leaf",
                "etymology": "via Malayalam", "route": "via Portuguese"
            }]
        });
        let result: AnalysisResult = decode(&reply.to_string()).unwrap();
        assert!(render(&result).contains("   Tamil Origin: வெற்றிலை ()"));
    }
}
