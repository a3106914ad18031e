//! Conversion between stored payloads and the text shown in the editor.
//!
//! Decoding never fails: anything that cannot be interpreted as JSON is shown
//! as the raw text. Encoding never rewrites the user's text; it only reports
//! whether the text is valid JSON so the caller can ask before saving
//! something that is not.

use serde_json::Value;

use crate::error::{KvError, Result};
use crate::store::Record;

/// How a stored payload was interpreted for editing
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A JSON value, shown pretty-printed
    Structured(Value),
    /// Opaque text, shown verbatim
    RawText(String),
}

impl Decoded {
    pub fn is_structured(&self) -> bool {
        matches!(self, Decoded::Structured(_))
    }

    /// The editable text for this payload
    pub fn into_text(self) -> String {
        match self {
            Decoded::Structured(value) => pretty(&value),
            Decoded::RawText(text) => text,
        }
    }
}

/// Interpret a record's payload for editing.
pub fn decode(record: &Record) -> Decoded {
    let Some(value) = record.value.as_ref().filter(|v| !v.is_null()) else {
        return Decoded::RawText(String::new());
    };

    match value {
        // JSON-encoded string: show the parsed document when it parses
        Value::String(text) if record.is_json => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => Decoded::Structured(parsed),
            Err(_) => Decoded::RawText(text.clone()),
        },
        Value::String(text) => Decoded::RawText(text.clone()),
        other => Decoded::Structured(other.clone()),
    }
}

/// Shorthand for `decode(record).into_text()`
pub fn editable_text(record: &Record) -> String {
    decode(record).into_text()
}

/// Two-space indented JSON
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Text parses as JSON
    Json,
    /// Text is not JSON; saving it needs the user's approval
    PlainText,
    /// Whitespace only; sent without validation
    Blank,
}

/// Edited text ready to be stored.
///
/// The payload is always the text exactly as edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    payload: String,
    kind: PayloadKind,
    parse_error: Option<String>,
}

impl Encoded {
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Why the text is not JSON, when it is not
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn needs_confirmation(&self) -> bool {
        self.kind == PayloadKind::PlainText
    }
}

/// Prepare edited text for storage.
pub fn encode(text: &str) -> Encoded {
    if text.trim().is_empty() {
        return Encoded {
            payload: text.to_string(),
            kind: PayloadKind::Blank,
            parse_error: None,
        };
    }

    match serde_json::from_str::<Value>(text) {
        Ok(_) => Encoded {
            payload: text.to_string(),
            kind: PayloadKind::Json,
            parse_error: None,
        },
        Err(e) => Encoded {
            payload: text.to_string(),
            kind: PayloadKind::PlainText,
            parse_error: Some(e.to_string()),
        },
    }
}

/// Reformat JSON text with two-space indentation.
pub fn format_json(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)?;
    Ok(pretty(&value))
}

pub fn validate_json(text: &str) -> Result<()> {
    serde_json::from_str::<Value>(text)
        .map(|_| ())
        .map_err(|e| KvError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Option<Value>, is_json: bool) -> Record {
        Record {
            key: "k".to_string(),
            raw_value: value.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            value,
            is_json,
        }
    }

    #[test]
    fn structured_payload_round_trips() {
        let original = json!({"name": "kv", "tags": ["a", "b"], "nested": {"n": 3}});
        let text = editable_text(&record(Some(original.clone()), true));

        assert!(text.contains("\n  \"name\": \"kv\""));
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn object_keys_keep_store_order() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        let text = editable_text(&record(Some(value), true));
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn json_string_payload_is_parsed() {
        let rec = record(Some(json!(r#"{"a":1}"#)), true);
        assert_eq!(decode(&rec), Decoded::Structured(json!({"a": 1})));
        assert_eq!(editable_text(&rec), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn invalid_json_string_falls_back_to_raw_text() {
        let rec = record(Some(json!("{not json")), true);
        assert_eq!(decode(&rec), Decoded::RawText("{not json".to_string()));
    }

    #[test]
    fn plain_text_is_shown_verbatim() {
        // Not flagged as JSON, so even JSON-looking text stays untouched
        let rec = record(Some(json!("[1, 2]")), false);
        assert_eq!(editable_text(&rec), "[1, 2]");
    }

    #[test]
    fn non_text_payload_without_hint_is_pretty_printed() {
        let rec = record(Some(json!([1, 2])), false);
        assert_eq!(editable_text(&rec), "[\n  1,\n  2\n]");
    }

    #[test]
    fn missing_or_null_payload_is_empty() {
        assert_eq!(editable_text(&record(None, false)), "");
        assert_eq!(editable_text(&record(Some(Value::Null), true)), "");
    }

    #[test]
    fn encode_keeps_text_verbatim() {
        let text = "{ \"a\" :1 }";
        let encoded = encode(text);
        assert_eq!(encoded.kind(), PayloadKind::Json);
        assert_eq!(encoded.payload(), text);
        assert!(!encoded.needs_confirmation());
    }

    #[test]
    fn encode_flags_plain_text() {
        let encoded = encode("not json");
        assert_eq!(encoded.kind(), PayloadKind::PlainText);
        assert!(encoded.needs_confirmation());
        assert!(encoded.parse_error().is_some());
        assert_eq!(encoded.into_payload(), "not json");
    }

    #[test]
    fn encode_skips_validation_for_blank_text() {
        let encoded = encode("  \n");
        assert_eq!(encoded.kind(), PayloadKind::Blank);
        assert!(!encoded.needs_confirmation());
    }

    #[test]
    fn decoded_text_encodes_as_json() {
        let text = editable_text(&record(Some(json!({"a": [true, null]})), true));
        assert_eq!(encode(&text).kind(), PayloadKind::Json);
    }

    #[test]
    fn format_json_reindents() {
        assert_eq!(format_json("[1,{\"b\":2}]").unwrap(), "[\n  1,\n  {\n    \"b\": 2\n  }\n]");
        assert!(matches!(format_json("{"), Err(KvError::Parse(_))));
    }

    #[test]
    fn validate_json_reports_parse_errors() {
        assert!(validate_json("{\"ok\": true}").is_ok());
        assert!(matches!(validate_json("nope"), Err(KvError::Parse(_))));
    }
}
