//! Ordered per-language collection for one field of one record.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LangFieldError;
use crate::i18n::ClangId;
use crate::value::{FieldValue, LanguageValue};

/// Ordered set of translations, unique by `clang_id`.
///
/// Order is the editor's selection order. Construction through
/// `FromIterator`, deserialization or the normalizer keeps the first entry
/// for each language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LanguageCollection {
    entries: Vec<LanguageValue>,
}

impl LanguageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguageValue> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[LanguageValue] {
        &self.entries
    }

    /// Entry for a language, if present (blank or not).
    pub fn get(&self, clang_id: ClangId) -> Option<&LanguageValue> {
        self.entries.iter().find(|entry| entry.clang_id == clang_id)
    }

    pub fn contains(&self, clang_id: ClangId) -> bool {
        self.get(clang_id).is_some()
    }

    /// First entry regardless of language.
    pub fn first(&self) -> Option<&LanguageValue> {
        self.entries.first()
    }

    /// Language identifiers in collection order.
    pub fn ids(&self) -> impl Iterator<Item = ClangId> + '_ {
        self.entries.iter().map(|entry| entry.clang_id)
    }

    /// Copy without the entry for `clang_id`.
    pub fn without(&self, clang_id: ClangId) -> LanguageCollection {
        LanguageCollection {
            entries: self
                .entries
                .iter()
                .filter(|entry| entry.clang_id != clang_id)
                .cloned()
                .collect(),
        }
    }

    /// Copy with `value` appended for `clang_id`, replacing any existing entry.
    pub(crate) fn with_appended(&self, clang_id: ClangId, value: FieldValue) -> LanguageCollection {
        let mut next = self.without(clang_id);
        next.entries.push(LanguageValue { clang_id, value });
        next
    }

    /// Copy without blank entries; required before persisting.
    pub fn pruned(&self) -> LanguageCollection {
        LanguageCollection {
            entries: self
                .entries
                .iter()
                .filter(|entry| !entry.value.is_blank())
                .cloned()
                .collect(),
        }
    }

    /// Compact JSON array in the persisted format.
    pub fn to_json(&self) -> Result<String, LangFieldError> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

impl FromIterator<LanguageValue> for LanguageCollection {
    fn from_iter<I: IntoIterator<Item = LanguageValue>>(iter: I) -> Self {
        let mut entries: Vec<LanguageValue> = Vec::new();
        for entry in iter {
            if !entries.iter().any(|seen| seen.clang_id == entry.clang_id) {
                entries.push(entry);
            }
        }
        Self { entries }
    }
}

impl<'de> Deserialize<'de> for LanguageCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<LanguageValue>::deserialize(deserializer).map(|entries| entries.into_iter().collect())
    }
}

impl IntoIterator for LanguageCollection {
    type Item = LanguageValue;
    type IntoIter = std::vec::IntoIter<LanguageValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a LanguageCollection {
    type Item = &'a LanguageValue;
    type IntoIter = std::slice::Iter<'a, LanguageValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
