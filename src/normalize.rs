//! Normalization of untrusted per-language input.
//!
//! Every read of a multilingual field goes through here: a serialized column,
//! an already-parsed JSON document and a browser form submission all end up as
//! the same canonical `LanguageCollection`. Malformed input is never an error;
//! it simply yields fewer (or no) entries.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::collection::LanguageCollection;
use crate::i18n::ClangId;
use crate::value::{FieldKind, FieldValue, LanguageValue};

/// Raw field input as it crosses into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// Persisted or transmitted JSON text
    Serialized(String),
    /// Already-decoded JSON document
    Parsed(Value),
    /// Form submission: positional index -> `{clang_id, value}`
    Form(Map<String, Value>),
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        RawInput::Serialized(text.to_string())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        RawInput::Serialized(text)
    }
}

impl From<Option<&str>> for RawInput {
    fn from(text: Option<&str>) -> Self {
        match text {
            Some(text) => RawInput::Serialized(text.to_string()),
            None => RawInput::Parsed(Value::Null),
        }
    }
}

impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        RawInput::Parsed(value)
    }
}

impl From<Map<String, Value>> for RawInput {
    fn from(form: Map<String, Value>) -> Self {
        RawInput::Form(form)
    }
}

impl From<&LanguageCollection> for RawInput {
    fn from(collection: &LanguageCollection) -> Self {
        match serde_json::to_value(collection) {
            Ok(value) => RawInput::Parsed(value),
            Err(_) => RawInput::Parsed(Value::Null),
        }
    }
}

/// Normalizer bound to one field configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    kind: FieldKind,
}

impl Normalizer {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Produce the canonical collection for `raw`.
    ///
    /// Entries are kept in input order; entries without a usable `clang_id`,
    /// entries for languages outside `active`, and later duplicates of an
    /// already seen language are dropped.
    pub fn normalize(&self, raw: impl Into<RawInput>, active: &HashSet<ClangId>) -> LanguageCollection {
        let items = match raw.into() {
            RawInput::Serialized(text) => match parse_serialized(&text) {
                Some(value) => entries_of(value),
                None => return LanguageCollection::new(),
            },
            RawInput::Parsed(value) => entries_of(value),
            RawInput::Form(form) => ordered_form_entries(form),
        };

        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for item in items {
            let Value::Object(entry) = item else {
                trace!("Skipping non-object entry");
                continue;
            };

            let Some(clang_id) = entry.get("clang_id").and_then(coerce_clang_id) else {
                trace!("Skipping entry without usable clang_id");
                continue;
            };

            if !active.contains(&clang_id) {
                trace!(%clang_id, "Dropping entry for inactive language");
                continue;
            }

            if !seen.insert(clang_id) {
                trace!(%clang_id, "Dropping duplicate entry");
                continue;
            }

            let value = match entry.get("value") {
                Some(value) => FieldValue::from_json(value, self.kind),
                None => FieldValue::empty(self.kind),
            };
            entries.push(LanguageValue { clang_id, value });
        }

        entries.into_iter().collect()
    }
}

/// Normalize `raw` as a plain text field.
pub fn normalize(raw: impl Into<RawInput>, active: &HashSet<ClangId>) -> LanguageCollection {
    Normalizer::default().normalize(raw, active)
}

fn parse_serialized(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Unparsable language data treated as empty");
            None
        }
    }
}

/// Sequence items of an arbitrary JSON document.
///
/// Arrays yield their elements; objects are treated as form submissions.
fn entries_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => ordered_form_entries(map),
        _ => Vec::new(),
    }
}

/// Values of a form map ordered by numeric key, non-numeric keys last.
fn ordered_form_entries(form: Map<String, Value>) -> Vec<Value> {
    let mut keyed: Vec<(Option<u64>, Value)> = form
        .into_iter()
        .map(|(key, value)| (key.trim().parse::<u64>().ok(), value))
        .collect();
    // Stable sort keeps the map's own order among non-numeric keys.
    keyed.sort_by_key(|(index, _)| index.unwrap_or(u64::MAX));
    keyed.into_iter().map(|(_, value)| value).collect()
}

fn coerce_clang_id(value: &Value) -> Option<ClangId> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .filter(|id| *id > 0)
            .and_then(|id| u32::try_from(id).ok())
            .map(ClangId),
        Value::String(text) => ClangId::parse(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn active(ids: &[u32]) -> HashSet<ClangId> {
        ids.iter().copied().map(ClangId).collect()
    }

    fn pairs(collection: &LanguageCollection) -> Vec<(u32, String)> {
        collection
            .iter()
            .map(|e| (e.clang_id.get(), e.value.primary().to_string()))
            .collect()
    }

    // ==================== Dedup / Filter Tests ====================

    #[test]
    fn test_first_wins_and_unknown_dropped() {
        let raw = r#"[{"clang_id":1,"value":"Hi"},{"clang_id":1,"value":"Duplicate"},{"clang_id":99,"value":"Ghost"}]"#;
        let collection = normalize(raw, &active(&[1, 2]));
        assert_eq!(pairs(&collection), vec![(1, "Hi".to_string())]);
    }

    #[test]
    fn test_preserves_input_order() {
        let raw = json!([
            {"clang_id": 2, "value": "Hello"},
            {"clang_id": 1, "value": "Hallo"}
        ]);
        let collection = normalize(raw, &active(&[1, 2]));
        assert_eq!(
            pairs(&collection),
            vec![(2, "Hello".to_string()), (1, "Hallo".to_string())]
        );
    }

    #[test]
    fn test_string_clang_id_is_coerced() {
        let raw = json!([{"clang_id": "2", "value": "Hello"}]);
        let collection = normalize(raw, &active(&[2]));
        assert!(collection.contains(ClangId(2)));
    }

    #[test]
    fn test_invalid_clang_ids_skipped() {
        let raw = json!([
            {"clang_id": 0, "value": "zero"},
            {"clang_id": -1, "value": "negative"},
            {"clang_id": "de", "value": "code"},
            {"clang_id": null, "value": "null"},
            {"value": "missing"}
        ]);
        assert!(normalize(raw, &active(&[1])).is_empty());
    }

    #[test]
    fn test_missing_value_becomes_empty() {
        let raw = json!([{"clang_id": 1}]);
        let collection = normalize(raw, &active(&[1]));
        assert_eq!(pairs(&collection), vec![(1, String::new())]);
    }

    #[test]
    fn test_blank_values_are_kept_in_memory() {
        let raw = json!([{"clang_id": 1, "value": "  "}]);
        assert_eq!(normalize(raw, &active(&[1])).len(), 1);
    }

    #[test]
    fn test_non_object_entries_skipped() {
        let raw = json!([1, "two", null, [3], {"clang_id": 1, "value": "ok"}]);
        let collection = normalize(raw, &active(&[1]));
        assert_eq!(pairs(&collection), vec![(1, "ok".to_string())]);
    }

    // ==================== Malformed Input Tests ====================

    #[test]
    fn test_unparsable_string_is_empty() {
        assert!(normalize("[{\"clang_id\":1,", &active(&[1])).is_empty());
        assert!(normalize("not json", &active(&[1])).is_empty());
    }

    #[test]
    fn test_empty_and_null_input() {
        assert!(normalize("", &active(&[1])).is_empty());
        assert!(normalize("null", &active(&[1])).is_empty());
        assert!(normalize(None::<&str>, &active(&[1])).is_empty());
        assert!(normalize(Value::Null, &active(&[1])).is_empty());
    }

    #[test]
    fn test_scalar_documents_are_empty() {
        assert!(normalize("42", &active(&[1])).is_empty());
        assert!(normalize(json!("text"), &active(&[1])).is_empty());
    }

    #[test]
    fn test_single_entry_object_is_not_a_sequence() {
        let raw = json!({"clang_id": 1, "value": "Hallo"});
        assert!(normalize(raw, &active(&[1])).is_empty());
    }

    // ==================== Form Submission Tests ====================

    #[test]
    fn test_form_ordered_by_numeric_index() {
        let mut form = Map::new();
        form.insert("10".to_string(), json!({"clang_id": 3, "value": "c"}));
        form.insert("2".to_string(), json!({"clang_id": 2, "value": "b"}));
        form.insert("0".to_string(), json!({"clang_id": 1, "value": "a"}));

        let collection = normalize(form, &active(&[1, 2, 3]));
        let ids: Vec<_> = collection.ids().map(ClangId::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_form_and_array_inputs_agree() {
        let array = json!([
            {"clang_id": "2", "value": "Hello"},
            {"clang_id": "1", "value": "Hallo"}
        ]);
        let mut form = Map::new();
        form.insert("0".to_string(), json!({"clang_id": "2", "value": "Hello"}));
        form.insert("1".to_string(), json!({"clang_id": "1", "value": "Hallo"}));

        let set = active(&[1, 2]);
        let from_array = normalize(array.clone(), &set);
        let from_form = normalize(form, &set);
        let from_text = normalize(array.to_string(), &set);

        assert_eq!(from_array, from_form);
        assert_eq!(from_array, from_text);
    }

    // ==================== Kind Tests ====================

    #[test]
    fn test_composite_kind() {
        let raw = json!([
            {"clang_id": 1, "value": {"media": "a.jpg", "text": "Alt"}},
            {"clang_id": 2, "value": "b.jpg"}
        ]);
        let collection =
            Normalizer::new(FieldKind::Media { with_text: true }).normalize(raw, &active(&[1, 2]));

        assert_eq!(
            collection.get(ClangId(1)).map(|e| &e.value),
            Some(&FieldValue::Media {
                media: "a.jpg".to_string(),
                text: "Alt".to_string()
            })
        );
        assert_eq!(
            collection.get(ClangId(2)).and_then(|e| e.value.caption()),
            Some("")
        );
    }

    // ==================== Idempotence Tests ====================

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!([
            {"clang_id": 2, "value": "Hello"},
            {"clang_id": 9, "value": "Ghost"},
            {"clang_id": 2, "value": "Again"},
            {"clang_id": "1", "value": 5}
        ]);
        let set = active(&[1, 2]);
        let once = normalize(raw, &set);
        let twice = normalize(once.to_json().expect("Should serialize"), &set);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_collection_input_round_trips() {
        let set = active(&[1, 2]);
        let collection = normalize(r#"[{"clang_id":1,"value":"a"}]"#, &set);
        assert_eq!(normalize(&collection, &set), collection);
    }
}
