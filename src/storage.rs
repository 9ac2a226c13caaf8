//! Persisted representation of multilingual fields.
//!
//! A record is a set of text columns; multilingual columns hold the compact
//! JSON array produced by [`format_for_save`]. Text fields persist `NULL` when
//! nothing is translated, media fields persist `[]`.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::collection::LanguageCollection;
use crate::error::LangFieldError;
use crate::i18n::LanguageDirectory;
use crate::value::{EmptyEncoding, FieldKind};

/// Maximum characters of a text value shown in list summaries.
const LIST_VALUE_CHARS: usize = 50;

/// One stored record: column name -> persisted text (`None` is SQL `NULL`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRecord {
    columns: BTreeMap<String, Option<String>>,
}

impl StoredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column assignment.
    pub fn with_column(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.set(name, value.map(str::to_string));
        self
    }

    /// Persisted text of a column; `None` for `NULL` or a missing column.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns.get(name).and_then(|value| value.as_deref())
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        self.columns.insert(name.into(), value);
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Build a record from a JSON object.
    ///
    /// Strings are taken verbatim, `null` becomes `NULL`, and arrays or
    /// objects are stored as their compact JSON text. Anything other than an
    /// object yields an empty record.
    pub fn from_json(value: &Value) -> StoredRecord {
        let Value::Object(map) = value else {
            return StoredRecord::new();
        };

        let columns = map
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::Null => None,
                    Value::String(text) => Some(text.clone()),
                    other => Some(other.to_string()),
                };
                (name.clone(), text)
            })
            .collect();

        StoredRecord { columns }
    }
}

/// Serialize a collection for storage.
///
/// Values are trimmed and blank entries pruned first. A collection left with
/// no entries is written in the kind's empty encoding.
pub fn format_for_save(collection: &LanguageCollection, kind: FieldKind) -> Result<Option<String>, LangFieldError> {
    let cleaned: LanguageCollection = collection
        .iter()
        .map(|entry| {
            let mut entry = entry.clone();
            entry.value = entry.value.trimmed();
            entry
        })
        .collect::<LanguageCollection>()
        .pruned();

    if cleaned.is_empty() {
        debug!(?kind, "Saving empty language collection");
        return Ok(match kind.empty_encoding() {
            EmptyEncoding::Null => None,
            EmptyEncoding::EmptyArray => Some("[]".to_string()),
        });
    }

    cleaned.to_json().map(Some)
}

/// Compact one-line summary for record listings, e.g. `de: Hallo | en: Hello`.
///
/// Blank values are skipped, languages unknown to the directory show their
/// numeric id, and text values are cut to 50 characters. Returns `-` when
/// nothing is translated.
pub fn list_display(collection: &LanguageCollection, directory: &dyn LanguageDirectory) -> String {
    let parts: Vec<String> = collection
        .iter()
        .filter(|entry| !entry.value.is_blank())
        .map(|entry| {
            let label = directory
                .language_by_id(entry.clang_id)
                .map(|lang| lang.code)
                .unwrap_or_else(|| entry.clang_id.to_string());
            let shown: String = match entry.value.caption() {
                Some(_) => entry.value.primary().to_string(),
                None => entry.value.primary().chars().take(LIST_VALUE_CHARS).collect(),
            };
            format!("{}: {}", label, shown)
        })
        .collect();

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" | ")
    }
}
