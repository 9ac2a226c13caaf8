//! Required-language validation for form submissions.
//!
//! A multilingual field marked as required either names the languages that
//! must be filled in, or only demands that at least one language is. The
//! result is a single user-facing message for the first problem found.

use thiserror::Error;
use tracing::debug;

use crate::accessor::has_translation;
use crate::i18n::{ClangId, LanguageDirectory};
use crate::normalize::{Normalizer, RawInput};
use crate::value::FieldKind;

/// Template used when none is configured. `{language}` is replaced by the
/// missing language's name.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "Please provide a translation for {language}.";

/// Message used when no specific languages are required and nothing is filled in.
pub const DEFAULT_ANY_MESSAGE: &str = "Please provide at least one translation.";

/// A failed required-language check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationFailure {
    /// Field that failed validation
    pub field: String,

    /// First required language without a translation; `None` when the field
    /// has no translation at all and no specific languages are required
    pub missing_language: Option<ClangId>,

    /// Message to show the editor
    pub message: String,
}

/// Validator for one required multilingual field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangRequiredValidator {
    field: String,
    kind: FieldKind,
    required: Vec<ClangId>,
    message: Option<String>,
}

impl LangRequiredValidator {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldKind::Text,
            required: Vec::new(),
            message: None,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_required(mut self, required: impl IntoIterator<Item = ClangId>) -> Self {
        self.required = required.into_iter().collect();
        self
    }

    /// Message template; `{language}` is substituted when present.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn required(&self) -> &[ClangId] {
        &self.required
    }

    /// Parse a comma-separated required list such as `"1, 2"`.
    ///
    /// Blank and non-numeric items are skipped.
    ///
    /// # Arguments
    /// * `list` - Comma-separated language identifiers
    ///
    /// # Returns
    /// The identifiers in the given order.
    pub fn parse_required(list: &str) -> Vec<ClangId> {
        ClangId::parse_list(list)
    }

    /// Check a submitted value.
    ///
    /// The raw input is normalized against the directory's active languages
    /// first, so entries for inactive languages never satisfy a requirement.
    ///
    /// # Arguments
    /// * `raw` - Submitted value in any accepted input form
    /// * `directory` - Source of active languages and display names
    ///
    /// # Returns
    /// `Ok(())` when the field passes, otherwise the first failure.
    pub fn validate(
        &self,
        raw: impl Into<RawInput>,
        directory: &dyn LanguageDirectory,
    ) -> Result<(), ValidationFailure> {
        let collection = Normalizer::new(self.kind).normalize(raw, &directory.active_ids());

        if self.required.is_empty() {
            if collection.iter().any(|entry| !entry.value.is_blank()) {
                return Ok(());
            }
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_ANY_MESSAGE.to_string());
            return Err(self.fail(None, message));
        }

        let Some(missing) = self
            .required
            .iter()
            .copied()
            .find(|id| !has_translation(&collection, *id))
        else {
            return Ok(());
        };

        let name = directory
            .language_by_id(missing)
            .map(|lang| lang.name)
            .unwrap_or_else(|| format!("ID {}", missing));
        let template = self.message.as_deref().unwrap_or(DEFAULT_REQUIRED_MESSAGE);

        Err(self.fail(Some(missing), template.replace("{language}", &name)))
    }

    fn fail(&self, missing_language: Option<ClangId>, message: String) -> ValidationFailure {
        debug!(field = %self.field, ?missing_language, "Required-language validation failed");
        ValidationFailure {
            field: self.field.clone(),
            missing_language,
            message,
        }
    }
}
