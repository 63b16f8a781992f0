//! Backend error payloads.
//!
//! # Design
//! - The backend answers failures with a bare string, a `{"detail": ...}`
//!   object, or a tree of field names mapping to message arrays.
//! - Decode into one union and flatten every string leaf in document order so
//!   callers always get a single display string.

use serde_json::{Map, Value};

/// Decoded error body returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// Body was empty or carried no string content.
    Empty,
    /// Plain text body, or a JSON string.
    Text(String),
    /// JSON object, typically field name to message list.
    Object(Map<String, Value>),
    /// JSON array of messages or nested objects.
    List(Vec<Value>),
}

impl ErrorPayload {
    /// Decode a raw response body.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    Self::Empty
                } else {
                    Self::Text(text)
                }
            }
        }
    }

    /// Classify an already-decoded JSON value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) if text.trim().is_empty() => Self::Empty,
            Value::String(text) => Self::Text(text.trim().to_string()),
            Value::Object(map) => Self::Object(map),
            Value::Array(items) => Self::List(items),
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Empty,
        }
    }

    /// Every human-readable message in document order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            Self::Empty => {}
            Self::Text(text) => out.push(text.clone()),
            Self::Object(map) => {
                for value in map.values() {
                    collect_strings(value, &mut out);
                }
            }
            Self::List(items) => {
                for value in items {
                    collect_strings(value, &mut out);
                }
            }
        }
        out
    }

    /// Single display string, joining every message with a space.
    #[must_use]
    pub fn display_message(&self) -> Option<String> {
        let messages = self.messages();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join(" "))
        }
    }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_array_flattens_to_its_message() {
        let payload = ErrorPayload::from_body(br#"{"name": ["This field is required."]}"#);
        assert_eq!(
            payload.display_message().as_deref(),
            Some("This field is required.")
        );
    }

    #[test]
    fn plain_string_bodies_are_text() {
        assert_eq!(
            ErrorPayload::from_body(b"Bad Gateway"),
            ErrorPayload::Text("Bad Gateway".into())
        );
        assert_eq!(
            ErrorPayload::from_body(br#""Department already exists""#)
                .display_message()
                .as_deref(),
            Some("Department already exists")
        );
    }

    #[test]
    fn detail_objects_flatten() {
        let payload =
            ErrorPayload::from_body(br#"{"detail": "Authentication credentials were not provided."}"#);
        assert_eq!(
            payload.display_message().as_deref(),
            Some("Authentication credentials were not provided.")
        );
    }

    #[test]
    fn nested_shapes_keep_document_order() {
        let payload = ErrorPayload::from_body(
            br#"{
                "email": ["Enter a valid email address."],
                "bank": {"ifsc": ["Invalid IFSC."], "account": [{"number": "Too short."}]},
                "code": 400,
                "mobile": ["Ensure this field has no more than 11 characters."]
            }"#,
        );
        assert_eq!(
            payload.messages(),
            vec![
                "Enter a valid email address.",
                "Invalid IFSC.",
                "Too short.",
                "Ensure this field has no more than 11 characters.",
            ]
        );
    }

    #[test]
    fn empty_and_scalar_bodies_have_no_message() {
        assert_eq!(ErrorPayload::from_body(b""), ErrorPayload::Empty);
        assert_eq!(ErrorPayload::from_body(b"  "), ErrorPayload::Empty);
        assert_eq!(ErrorPayload::from_body(b"null").display_message(), None);
        assert_eq!(ErrorPayload::from_body(b"{}").display_message(), None);
    }

    #[test]
    fn top_level_arrays_flatten() {
        let payload = ErrorPayload::from_body(br#"["first", ["second"], {"x": "third"}]"#);
        assert_eq!(
            payload.display_message().as_deref(),
            Some("first second third")
        );
    }
}
