//! JSON decoding of step output.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n(.*?)\r?\n?```").unwrap());

/// Decode step output as JSON.
///
/// The whole text is tried first. Agents often wrap JSON in a fenced code
/// block, so the first fenced block that decodes is accepted as well.
pub fn decode_output(text: &str) -> Result<Value, serde_json::Error> {
    let whole = serde_json::from_str(text.trim());
    if whole.is_ok() {
        return whole;
    }

    for caps in FENCED_JSON.captures_iter(text) {
        if let Some(body) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(body.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    whole
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_plain_json() {
        assert_eq!(decode_output(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(decode_output("  [1, 2]\n").unwrap(), json!([1, 2]));
        assert_eq!(decode_output("42").unwrap(), json!(42));
    }

    #[test]
    fn decodes_fenced_block() {
        let text = "Here is the result:\n```json\n{\"ok\": true}\n```\nDone.";
        assert_eq!(decode_output(text).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn decodes_unlabelled_fence() {
        let text = "```\n[\"x\"]\n```";
        assert_eq!(decode_output(text).unwrap(), json!(["x"]));
    }

    #[test]
    fn skips_fences_that_are_not_json() {
        let text = "```\nnot json\n```\n```json\n{\"b\": 2}\n```";
        assert_eq!(decode_output(text).unwrap(), json!({"b": 2}));
    }

    #[test]
    fn invalid_text_is_error() {
        assert!(decode_output("not json at all").is_err());
        assert!(decode_output("").is_err());
    }
}
