//! Typed decoding of free-form completions
//!
//! Models wrap their JSON in prose or code fences. The first opening bracket of
//! the expected kind is matched to its closing bracket, honoring string
//! literals and escapes, and only that slice is parsed.

use crate::error::DecodeError;
use crate::types::ClassifiedStatement;
use riskmine_domain::{Mitigation, MitigationRank};
use serde_json::{Map, Value};
use tracing::debug;

/// Locate the first balanced JSON value opened by `open` (`[` or `{`)
pub fn locate_json(text: &str, open: char) -> Result<&str, DecodeError> {
    let what = if open == '[' { "array" } else { "object" };
    let start = text.find(open).ok_or(DecodeError::NoMatch(what))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(DecodeError::Malformed(format!("unbalanced {}", what)))
}

fn parse(slice: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(slice).map_err(|e| DecodeError::Malformed(e.to_string()))
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Decode a classification completion
///
/// Elements without a non-empty `risk_text` are dropped. An array whose
/// elements are all non-objects is a schema mismatch; an empty array is not.
pub fn decode_statements(response: &str) -> Result<Vec<ClassifiedStatement>, DecodeError> {
    let value = parse(locate_json(response, '[')?)?;
    let items = value
        .as_array()
        .ok_or_else(|| DecodeError::SchemaMismatch("expected an array".to_string()))?;

    if !items.is_empty() && !items.iter().any(Value::is_object) {
        return Err(DecodeError::SchemaMismatch(
            "array contains no objects".to_string(),
        ));
    }

    let mut statements = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            debug!(idx, "skipping non-object element");
            continue;
        };
        let Some(risk_text) = non_empty_str(obj, "risk_text") else {
            debug!(idx, "skipping element without risk_text");
            continue;
        };
        statements.push(ClassifiedStatement {
            risk_text,
            summary: non_empty_str(obj, "summary"),
            category: non_empty_str(obj, "category"),
        });
    }

    Ok(statements)
}

/// Decode a mitigation completion
///
/// Missing or unusable fields decode as `None`; only a missing or invalid
/// object is an error.
pub fn decode_mitigation(response: &str) -> Result<Mitigation, DecodeError> {
    let value = parse(locate_json(response, '{')?)?;
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::SchemaMismatch("expected an object".to_string()))?;

    Ok(Mitigation {
        idea: non_empty_str(obj, "mitigation_idea"),
        rank: obj.get("mitigation_rank").and_then(decode_rank),
    })
}

/// Integers 1-3 or their string forms
fn decode_rank(value: &Value) -> Option<MitigationRank> {
    let raw = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    MitigationRank::from_value(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_plain_array() {
        assert_eq!(locate_json("[1, 2]", '[').unwrap(), "[1, 2]");
    }

    #[test]
    fn test_locate_amid_prose() {
        let text = "Sure! Here you go:\n```json\n[{\"a\": 1}]\n```\nAnything else?";
        assert_eq!(locate_json(text, '[').unwrap(), "[{\"a\": 1}]");
    }

    #[test]
    fn test_locate_ignores_brackets_in_strings() {
        let text = r#"[{"risk_text": "Rates [may] rise }", "summary": "a \"quoted\" ]"}] trailing ]"#;
        let slice = locate_json(text, '[').unwrap();
        assert!(slice.ends_with("\"}]"));
        assert!(serde_json::from_str::<Value>(slice).is_ok());
    }

    #[test]
    fn test_locate_nested() {
        let text = "x {\"a\": {\"b\": [1, {\"c\": 2}]}} y }";
        assert_eq!(locate_json(text, '{').unwrap(), "{\"a\": {\"b\": [1, {\"c\": 2}]}}");
    }

    #[test]
    fn test_locate_no_match() {
        assert_eq!(locate_json("no json here", '['), Err(DecodeError::NoMatch("array")));
    }

    #[test]
    fn test_locate_unbalanced() {
        assert!(matches!(
            locate_json("[{\"a\": 1}", '['),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_statements() {
        let response = r#"Here are the risks:
[
  {"risk_text": "Competition is intense.", "summary": "Competitive pressure", "category": "Market"},
  {"risk_text": "  ", "summary": "blank", "category": "Other"},
  {"summary": "no text"},
  {"risk_text": "Laws may change.", "category": "Regulatory"}
]"#;
        let statements = decode_statements(response).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].category.as_deref(), Some("Market"));
        assert_eq!(statements[1].risk_text, "Laws may change.");
        assert_eq!(statements[1].summary, None);
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode_statements("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_array_of_scalars_is_schema_mismatch() {
        assert!(matches!(
            decode_statements("[1, 2, 3]"),
            Err(DecodeError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_decode_invalid_json_is_malformed() {
        assert!(matches!(
            decode_statements("[{risk_text: unquoted}]"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_mitigation() {
        let response = r#"{"mitigation_idea": "Use demand forecasting models.", "mitigation_rank": 1}"#;
        let mitigation = decode_mitigation(response).unwrap();
        assert_eq!(mitigation.idea.as_deref(), Some("Use demand forecasting models."));
        assert_eq!(mitigation.rank, Some(MitigationRank::Useful));
        assert!(mitigation.is_complete());
    }

    #[test]
    fn test_decode_mitigation_string_rank() {
        let mitigation = decode_mitigation(r#"JSON: {"mitigation_idea": "x", "mitigation_rank": "3"}"#).unwrap();
        assert_eq!(mitigation.rank, Some(MitigationRank::Dubious));
    }

    #[test]
    fn test_decode_mitigation_missing_fields_are_none() {
        let mitigation = decode_mitigation(r#"{"mitigation_idea": "Monitor suppliers."}"#).unwrap();
        assert!(mitigation.idea.is_some());
        assert_eq!(mitigation.rank, None);

        let mitigation = decode_mitigation(r#"{"mitigation_rank": 7, "mitigation_idea": ""}"#).unwrap();
        assert!(mitigation.is_empty());
    }

    #[test]
    fn test_decode_mitigation_no_object() {
        assert_eq!(
            decode_mitigation("I cannot help with that."),
            Err(DecodeError::NoMatch("object"))
        );
    }
}
