use serde_json::Value;
use tracing::{debug, info};

/// Text pulled out of one input item, with the item it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatableUnit {
    pub text: String,
    pub source: Value,
}

/// Object fields consulted for text, in priority order
const TEXT_FIELDS: [&str; 3] = ["Text", "text", "source"];

/// Split raw input into items.
///
/// Accepted shapes, first match wins:
/// 1. a JSON array: its elements
/// 2. a JSON object with a `translations` array: that array
/// 3. anything else: one item per non-blank line
///
/// An empty array from 1 or 2 falls through to 3.
pub fn parse_items(content: &str) -> Vec<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        let items = match value {
            Value::Array(items) => Some(items),
            Value::Object(mut object) => match object.remove("translations") {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            },
            _ => None,
        };

        match items {
            Some(items) if !items.is_empty() => return items,
            Some(_) => debug!("JSON input holds no items, reading it line by line"),
            None => debug!("JSON input has no item array, reading it line by line"),
        }
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect()
}

/// Translatable text of one item: the string itself, or the first non-empty
/// `Text` / `text` / `source` field of an object
pub fn extract_text(item: &Value) -> Option<String> {
    match item {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(object) => TEXT_FIELDS
            .iter()
            .filter_map(|field| object.get(*field).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Parse input and keep the items that carry text. Returns the units and the
/// number of items skipped.
pub fn translatable_units(content: &str) -> (Vec<TranslatableUnit>, usize) {
    let items = parse_items(content);
    let total = items.len();

    let units: Vec<TranslatableUnit> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match extract_text(&item) {
            Some(text) => Some(TranslatableUnit { text, source: item }),
            None => {
                info!("Skipping item {} without translatable text", idx + 1);
                None
            }
        })
        .collect();

    let skipped = total - units.len();
    (units, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_array() {
        let items = parse_items(r#"["good morning", {"text": "good night"}]"#);
        assert_eq!(items, vec![json!("good morning"), json!({"text": "good night"})]);
    }

    #[test]
    fn test_translations_field() {
        let items = parse_items(r#"{"translations": [{"Text": "a"}, "b"], "meta": 1}"#);
        assert_eq!(items, vec![json!({"Text": "a"}), json!("b")]);
    }

    #[test]
    fn test_newline_input_discards_blank_lines() {
        let items = parse_items("a\n\nb\n");
        assert_eq!(items, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_crlf_and_whitespace_lines() {
        let items = parse_items("first line\r\n   \r\nsecond line\r\n");
        assert_eq!(items, vec![json!("first line"), json!("second line")]);
    }

    #[test]
    fn test_empty_translations_falls_back_to_lines() {
        let content = r#"{ "translations": [] }"#;
        let items = parse_items(content);
        assert_eq!(items, vec![json!(content)]);
    }

    #[test]
    fn test_empty_array_falls_back_to_lines() {
        assert_eq!(parse_items("[]"), vec![json!("[]")]);
    }

    #[test]
    fn test_json_scalar_is_read_as_lines() {
        assert_eq!(parse_items("42"), vec![json!("42")]);
        assert_eq!(parse_items("\"quoted\""), vec![json!("\"quoted\"")]);
    }

    #[test]
    fn test_extract_text_field_priority() {
        assert_eq!(extract_text(&json!({"Text": "A", "text": "b", "source": "c"})).as_deref(), Some("A"));
        assert_eq!(extract_text(&json!({"text": "b", "source": "c"})).as_deref(), Some("b"));
        assert_eq!(extract_text(&json!({"source": "c"})).as_deref(), Some("c"));
        assert_eq!(extract_text(&json!({"Text": "", "source": "c"})).as_deref(), Some("c"));
    }

    #[test]
    fn test_extract_text_none() {
        assert_eq!(extract_text(&json!({"id": 7})), None);
        assert_eq!(extract_text(&json!({"text": 7})), None);
        assert_eq!(extract_text(&json!(null)), None);
        assert_eq!(extract_text(&json!("  ")), None);
        assert_eq!(extract_text(&json!(["nested"])), None);
    }

    #[test]
    fn test_translatable_units_counts_skipped() {
        let (units, skipped) = translatable_units(r#"["one", {"id": 2}, {"source": "three"}]"#);

        assert_eq!(skipped, 1);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text, "one");
        assert_eq!(units[1].text, "three");
        assert_eq!(units[1].source, json!({"source": "three"}));
    }
}
