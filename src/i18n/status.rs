//! Translation status reporting.
//!
//! Aggregates, per active language, how many of a record's multilingual
//! fields carry a non-empty translation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::accessor::has_translation;
use crate::collection::LanguageCollection;
use crate::i18n::{ClangId, Language};

/// Completion figures for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageStatus {
    /// Language the figures refer to
    pub language: Language,

    /// Number of fields with a non-empty translation
    pub translated_count: usize,

    /// Number of tracked multilingual fields
    pub total_fields: usize,

    /// Whether every tracked field is translated
    pub is_complete: bool,

    /// Rounded share of translated fields (0-100); 100 when nothing is tracked
    pub percentage: u32,
}

impl LanguageStatus {
    fn new(language: Language, translated_count: usize, total_fields: usize) -> Self {
        let percentage = if total_fields > 0 {
            ((translated_count as f64 / total_fields as f64) * 100.0).round() as u32
        } else {
            100
        };

        Self {
            language,
            translated_count,
            total_fields,
            is_complete: translated_count == total_fields,
            percentage,
        }
    }
}

/// Status report across all active languages, in directory order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusReport {
    languages: Vec<LanguageStatus>,
}

impl StatusReport {
    /// Figures for one language, if it is active.
    pub fn get(&self, id: ClangId) -> Option<&LanguageStatus> {
        self.languages.iter().find(|status| status.language.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguageStatus> {
        self.languages.iter()
    }

    /// Whether every active language is complete.
    pub fn is_complete(&self) -> bool {
        self.languages.iter().all(|status| status.is_complete)
    }
}

/// Count translated fields per active language.
///
/// `fields` maps field names to their normalized collections.
pub fn translation_status(
    fields: &BTreeMap<String, LanguageCollection>,
    all_languages: &[Language],
) -> StatusReport {
    let languages = all_languages
        .iter()
        .map(|language| {
            let translated = fields
                .values()
                .filter(|collection| has_translation(collection, language.id))
                .count();
            LanguageStatus::new(language.clone(), translated, fields.len())
        })
        .collect();

    StatusReport { languages }
}
