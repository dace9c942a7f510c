//! Decoding of model replies.
//!
//! Gemini is asked for bare JSON but often wraps it in a markdown code fence.
//! Every reply goes through `decode`, which strips the fence markers before
//! handing the text to serde. Optional fields are `Option` so that an absent
//! or `null` value is simply omitted when rendering. Optional fields also go
//! through the `lenient_*` helpers: a value of the wrong JSON type is coerced
//! or dropped, never a decode error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::error::ToolError;

/// Remove every markdown fence marker and surrounding whitespace.
pub fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strip fences and decode the reply into `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, ToolError> {
    Ok(serde_json::from_str(&strip_fences(raw))?)
}

/// One Tamil-origin word found by a full-text analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtymologyRecord {
    pub word: String,
    pub tamil_origin: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tamil_romanized: Option<String>,
    pub meaning: String,
    pub etymology: String,
    pub route: String,
    /// Models sometimes answer with a bare year (`1598`)
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_recorded_use: Option<String>,
}

/// Reply to `analyze_tamil_etymology`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub original_text: Option<String>,
    #[serde(default)]
    pub words_found: Option<Vec<EtymologyRecord>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,
}

impl AnalysisResult {
    pub fn words(&self) -> &[EtymologyRecord] {
        self.words_found.as_deref().unwrap_or(&[])
    }
}

/// One word found by a route-filtered analysis. The route is implied.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWord {
    pub word: String,
    pub tamil_origin: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tamil_romanized: Option<String>,
    pub meaning: String,
    pub etymology: String,
}

/// Reply to `find_tamil_words_by_route`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteAnalysis {
    #[serde(default, deserialize_with = "lenient_string")]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub original_text: Option<String>,
    #[serde(default)]
    pub words_found: Option<Vec<RouteWord>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,
}

impl RouteAnalysis {
    pub fn words(&self) -> &[RouteWord] {
        self.words_found.as_deref().unwrap_or(&[])
    }
}

/// Reply to `lookup_word_etymology`.
///
/// Everything except `word` is optional at decode time. The fields needed for a
/// positive result are checked by `confirmed`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordLookup {
    pub word: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_tamil_origin: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tamil_origin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tamil_romanized: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meaning: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub etymology: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_recorded_use: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub related_words: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub examples: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cultural_context: Option<String>,
}

/// The fields a positive word lookup must carry.
#[derive(Debug)]
pub struct ConfirmedOrigin<'a> {
    pub tamil_origin: &'a str,
    pub tamil_romanized: &'a str,
    pub meaning: &'a str,
    pub route: &'a str,
    pub etymology: &'a str,
}

impl WordLookup {
    pub fn has_tamil_origin(&self) -> bool {
        self.has_tamil_origin.unwrap_or(false)
    }

    pub fn confirmed(&self) -> Result<ConfirmedOrigin<'_>, ToolError> {
        Ok(ConfirmedOrigin {
            tamil_origin: required(&self.tamil_origin, "tamilOrigin")?,
            tamil_romanized: self.tamil_romanized.as_deref().unwrap_or(""),
            meaning: required(&self.meaning, "meaning")?,
            route: required(&self.route, "route")?,
            etymology: required(&self.etymology, "etymology")?,
        })
    }
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, ToolError> {
    field.as_deref().ok_or(ToolError::MissingField(name))
}

/// `Some` only for a present, non-blank value.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Scalar as text: strings as-is, numbers and booleans stringified.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Optional string that tolerates numbers and booleans; other types become None.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// Optional list of strings. A lone scalar becomes a one-element list and
/// non-scalar items are skipped.
fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items.into_iter().filter_map(scalar_text).collect()),
        Value::Null | Value::Object(_) => None,
        scalar => scalar_text(scalar).map(|s| vec![s]),
    })
}

/// Optional flag with truthiness for non-boolean values.
///
/// `"true"`/`"false"` (any case) parse as booleans; any other string is true
/// when non-blank. Numbers are true when non-zero.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                Some(s.eq_ignore_ascii_case("true") || !s.is_empty())
            }
        }
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::Array(items) => Some(!items.is_empty()),
        Value::Object(map) => Some(!map.is_empty()),
        Value::Null => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS: &str = r#"{
        "original_text": "Pass the curry",
        "words_found": [
            {
                "word": "curry",
                "tamilOrigin": "கறி",
                "tamilRomanized": "kaṟi",
                "meaning": "sauce, relish",
                "etymology": "Portuguese traders borrowed caril from kaṟi.",
                "route": "via Portuguese",
                "firstRecordedUse": "16th century"
            }
        ],
        "summary": "One Tamil loanword."
    }"#;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n[]\n```  "), "[]");
        assert_eq!(strip_fences("  {}  "), "{}");
    }

    #[test]
    fn test_decode_same_with_and_without_fences() {
        let fenced = format!("```json\n{}\n```", ANALYSIS);

        let plain: AnalysisResult = decode(ANALYSIS).unwrap();
        let stripped: AnalysisResult = decode(&fenced).unwrap();

        assert_eq!(plain.words().len(), 1);
        assert_eq!(stripped.words().len(), 1);
        assert_eq!(plain.words()[0].word, stripped.words()[0].word);
        assert_eq!(plain.words()[0].tamil_origin, "கறி");
        assert_eq!(plain.summary, stripped.summary);
        assert_eq!(plain.original_text.as_deref(), Some("Pass the curry"));
    }

    #[test]
    fn test_decode_missing_optional_fields() {
        let reply = r#"{"words_found": [{"word": "cash", "tamilOrigin": "காசு",
            "meaning": "coin", "etymology": "from kācu", "route": "via Portuguese"}]}"#;
        let result: AnalysisResult = decode(reply).unwrap();

        let record = &result.words()[0];
        assert!(record.tamil_romanized.is_none());
        assert!(record.first_recorded_use.is_none());
        assert!(result.summary.is_none());
        assert!(result.original_text.is_none());
    }

    #[test]
    fn test_decode_null_words_is_empty() {
        let result: AnalysisResult = decode(r#"{"words_found": null}"#).unwrap();
        assert!(result.words().is_empty());
    }

    #[test]
    fn test_decode_missing_required_record_field() {
        let reply = r#"{"words_found": [{"word": "cash"}]}"#;
        let result = decode::<AnalysisResult>(reply);
        assert!(matches!(result, Err(ToolError::Decode(_))));
    }

    #[test]
    fn test_decode_non_json() {
        let result = decode::<AnalysisResult>("Sure! Here are the Tamil words you asked for.");
        assert!(matches!(result, Err(ToolError::Decode(_))));
    }

    #[test]
    fn test_word_lookup_confirmed_requires_fields() {
        let lookup: WordLookup =
            decode(r#"{"word": "mango", "hasTamilOrigin": true, "tamilOrigin": "மாங்காய்"}"#).unwrap();

        assert!(lookup.has_tamil_origin());
        let err = lookup.confirmed().unwrap_err();
        assert!(matches!(err, ToolError::MissingField("meaning")));
    }

    #[test]
    fn test_word_lookup_defaults_to_no_origin() {
        let lookup: WordLookup = decode(r#"{"word": "table"}"#).unwrap();
        assert!(!lookup.has_tamil_origin());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn test_numeric_first_recorded_use_is_text() {
        let reply = r#"{"words_found": [{"word": "curry", "tamilOrigin": "கறி",
            "meaning": "sauce", "etymology": "caril", "route": "via Portuguese",
            "firstRecordedUse": 1598}]}"#;
        let result: AnalysisResult = decode(reply).unwrap();
        assert_eq!(result.words()[0].first_recorded_use.as_deref(), Some("1598"));
    }

    #[test]
    fn test_wrongly_typed_optionals_are_dropped() {
        let reply = r#"{"words_found": [{"word": "curry", "tamilOrigin": "கறி",
            "tamilRomanized": {"iso": "kaṟi"}, "meaning": "sauce", "etymology": "caril",
            "route": "direct", "firstRecordedUse": ["16th", "century"]}],
            "summary": 3}"#;
        let result: AnalysisResult = decode(reply).unwrap();

        let record = &result.words()[0];
        assert!(record.tamil_romanized.is_none());
        assert!(record.first_recorded_use.is_none());
        assert_eq!(result.summary.as_deref(), Some("3"));
    }

    #[test]
    fn test_lookup_single_string_lists() {
        let lookup: WordLookup = decode(
            r#"{"word": "curry", "examples": "Curry is tasty.", "relatedWords": "kari"}"#,
        )
        .unwrap();
        assert_eq!(lookup.examples, Some(vec!["Curry is tasty.".to_string()]));
        assert_eq!(lookup.related_words, Some(vec!["kari".to_string()]));
    }

    #[test]
    fn test_lookup_list_skips_non_scalars() {
        let lookup: WordLookup =
            decode(r#"{"word": "curry", "relatedWords": ["kari", {"x": 1}, 7], "examples": {"a": "b"}}"#)
                .unwrap();
        assert_eq!(lookup.related_words, Some(vec!["kari".to_string(), "7".to_string()]));
        assert!(lookup.examples.is_none());
    }

    #[test]
    fn test_lookup_has_tamil_origin_truthiness() {
        let cases = [
            (r#""true""#, true),
            (r#""False""#, false),
            (r#""yes""#, true),
            (r#""""#, false),
            ("1", true),
            ("0", false),
            ("null", false),
        ];
        for (raw, expected) in cases {
            let lookup: WordLookup =
                decode(&format!(r#"{{"word": "w", "hasTamilOrigin": {}}}"#, raw)).unwrap();
            assert_eq!(lookup.has_tamil_origin(), expected, "hasTamilOrigin = {}", raw);
        }
    }

    #[test]
    fn test_lookup_numeric_scalars_are_text() {
        let lookup: WordLookup = decode(
            r#"{"word": "cash", "hasTamilOrigin": true, "tamilOrigin": "காசு",
                "meaning": "coin", "route": "direct", "etymology": "kācu",
                "firstRecordedUse": 1593, "culturalContext": false}"#,
        )
        .unwrap();
        assert_eq!(lookup.first_recorded_use.as_deref(), Some("1593"));
        assert_eq!(lookup.cultural_context.as_deref(), Some("false"));
        assert!(lookup.confirmed().is_ok());
    }
}
