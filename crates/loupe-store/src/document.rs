//! Document envelope and identity mapping.
//!
//! The public wire shape carries the document key as an `objectID` member of
//! the JSON object; the store keys records by the same string internally.
//! [`StoredDocument`] is the internal envelope: the key held apart from the
//! field map, with pure conversions in both directions. The key and
//! `objectID` are always in 1:1 correspondence and never diverge.

use serde_json::{Map, Value};

use loupe_core::fresh_object_id;

/// Public name of the document key on the wire.
pub const OBJECT_ID: &str = "objectID";

/// A document as held by the store: key plus arbitrary fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Internal key, equal to the public `objectID`.
    pub id: String,
    /// Arbitrary caller-supplied fields (never contains `objectID`).
    pub fields: Map<String, Value>,
}

impl StoredDocument {
    /// Build an envelope from a public JSON object.
    ///
    /// Uses the object's `objectID` as the key when present (numbers are
    /// stringified); otherwise mints a fresh one. The caller learns the
    /// resulting key back through the returned envelope's `id`.
    pub fn from_public(mut fields: Map<String, Value>) -> Self {
        let id = match fields.remove(OBJECT_ID) {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => fresh_object_id(),
        };
        Self { id, fields }
    }

    /// Build an envelope under an explicit key, discarding any `objectID`
    /// member the body may carry.
    pub fn with_id(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove(OBJECT_ID);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Convert back to the public shape: fields plus `objectID`.
    pub fn to_public(&self) -> Map<String, Value> {
        let mut out = self.fields.clone();
        out.insert(OBJECT_ID.to_string(), Value::String(self.id.clone()));
        out
    }

    /// Collect the document's free-text content: every string and number
    /// reachable in the field map, in order, joined by spaces.
    pub fn full_text(&self) -> String {
        let mut parts = Vec::new();
        for value in self.fields.values() {
            collect_text(value, &mut parts);
        }
        parts.join(" ")
    }
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_text(item, out);
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_from_public_uses_object_id() {
        let doc = StoredDocument::from_public(obj(json!({
            "objectID": "asdf",
            "text": "test"
        })));
        assert_eq!(doc.id, "asdf");
        assert!(!doc.fields.contains_key(OBJECT_ID));
        assert_eq!(doc.fields["text"], json!("test"));
    }

    #[test]
    fn test_from_public_generates_missing_id() {
        let doc = StoredDocument::from_public(obj(json!({"text": "test"})));
        assert_eq!(doc.id.len(), 36);
    }

    #[test]
    fn test_from_public_stringifies_numeric_id() {
        let doc = StoredDocument::from_public(obj(json!({"objectID": 42})));
        assert_eq!(doc.id, "42");
    }

    #[test]
    fn test_with_id_discards_body_object_id() {
        let doc = StoredDocument::with_id("real", obj(json!({"objectID": "stale", "a": 1})));
        assert_eq!(doc.id, "real");
        assert!(!doc.fields.contains_key(OBJECT_ID));
    }

    #[test]
    fn test_round_trip_is_identity() {
        let original = obj(json!({"objectID": "x", "text": "test", "n": 3}));
        let doc = StoredDocument::from_public(original.clone());
        assert_eq!(doc.to_public(), original);
    }

    #[test]
    fn test_full_text_collects_nested_values() {
        let doc = StoredDocument::from_public(obj(json!({
            "title": "Alien",
            "year": 1979,
            "cast": ["Weaver", {"name": "Holm"}],
            "seen": true
        })));
        let text = doc.full_text();
        assert!(text.contains("Alien"));
        assert!(text.contains("1979"));
        assert!(text.contains("Weaver"));
        assert!(text.contains("Holm"));
        assert!(!text.contains("true"));
    }
}
