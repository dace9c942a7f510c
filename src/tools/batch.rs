//! Batch analysis: run the full-text analysis over several texts in order.

use serde::Deserialize;
use serde_json::json;

use super::{ToolContext, analyze};
use crate::core::error::ToolError;
use crate::core::server::{MCPTool, ToolRegistry};

pub const NAME: &str = "batch_analyze_texts";

const RULE_WIDTH: usize = 60;

#[derive(Debug, Deserialize)]
struct BatchArgs {
    texts: Vec<String>,
}

/// Register the batch tool
///
/// # Arguments
/// * `registry` - Tool registry to add the tool to
/// * `context` - Shared context handed to every call
pub fn register(registry: &mut ToolRegistry, context: &ToolContext) {
    let tool = MCPTool {
        name: NAME.to_string(),
        description: "Analyzes multiple texts for Tamil-origin words in a single batch operation. \
            More efficient than calling analyze_tamil_etymology multiple times. \
            Useful for processing multiple sentences, paragraphs, or documents."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "texts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Array of texts to analyze (each can be a sentence or paragraph)"
                }
            },
            "required": ["texts"]
        }),
    };

    let handler = super::typed_handler(context, |ctx, args: BatchArgs| async move {
        analyze_batch(&ctx, &args.texts).await
    });
    registry.register(tool, handler);
}

/// Analyze each text one after another.
///
/// The first failing text fails the whole batch. Items use the
/// `batch_analyze_texts` overrides, falling back to the analyze tool's.
pub async fn analyze_batch(ctx: &ToolContext, texts: &[String]) -> Result<String, ToolError> {
    let mut sections = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        tracing::debug!(item = i + 1, total = texts.len(), "analyzing batch item");
        let report = analyze::analyze_as(ctx, NAME, text).await?;
        sections.push(section(i + 1, texts.len(), &report));
    }

    Ok(sections.join("\n") + &summary(texts.len()))
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn section(index: usize, total: usize, report: &str) -> String {
    format!(
        "{rule}\nTEXT {index}/{total}\n{rule}\n{report}\n",
        rule = rule()
    )
}

fn summary(total: usize) -> String {
    format!(
        "\n{rule}\nBATCH SUMMARY\n{rule}\nAnalyzed {total} text(s) for Tamil-origin words.\n",
        rule = rule()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_banner() {
        let rule = "=".repeat(60);
        assert_eq!(
            section(2, 3, "report"),
            format!("{rule}\nTEXT 2/3\n{rule}\nreport\n")
        );
    }

    #[test]
    fn test_summary_counts_texts() {
        let text = summary(0);
        assert!(text.contains("BATCH SUMMARY"));
        assert!(text.ends_with("Analyzed 0 text(s) for Tamil-origin words.\n"));
    }
}
