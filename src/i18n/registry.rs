//! Language directory: the host's list of active content languages.
//!
//! The normalization engine never owns this list. Callers hand it a
//! `LanguageDirectory` and every operation takes a fresh snapshot.

use std::collections::HashSet;
use std::path::Path;

use crate::error::LangFieldError;
use crate::i18n::{ClangId, Language};

/// Collaborator interface implemented by the host system.
pub trait LanguageDirectory {
    /// All active languages in their canonical (host-defined) order.
    fn active_languages(&self) -> Vec<Language>;

    /// Look up a single language by identifier.
    fn language_by_id(&self, id: ClangId) -> Option<Language> {
        self.active_languages().into_iter().find(|lang| lang.id == id)
    }

    /// Identifiers of all active languages.
    fn active_ids(&self) -> HashSet<ClangId> {
        self.active_languages().iter().map(|lang| lang.id).collect()
    }

    /// Language the current request is rendered in.
    ///
    /// Defaults to the first active language; `None` when nothing is active.
    fn current_language(&self) -> Option<Language> {
        self.active_languages().into_iter().next()
    }
}

/// In-memory directory backed by a fixed list of languages.
///
/// Used by the CLI and by hosts whose language list is known up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDirectory {
    languages: Vec<Language>,
    current: Option<ClangId>,
}

impl StaticDirectory {
    /// Build a directory, rejecting duplicate identifiers or codes.
    pub fn new(languages: Vec<Language>) -> Result<Self, LangFieldError> {
        let mut ids = HashSet::new();
        let mut codes = HashSet::new();

        for lang in &languages {
            if !ids.insert(lang.id) {
                return Err(LangFieldError::DuplicateLanguage(lang.id));
            }
            if !codes.insert(lang.code.to_lowercase()) {
                return Err(LangFieldError::DuplicateLanguageCode(lang.code.clone()));
            }
        }

        Ok(Self {
            languages,
            current: None,
        })
    }

    /// Pin the current language to one of the configured languages.
    pub fn with_current(mut self, id: ClangId) -> Result<Self, LangFieldError> {
        if !self.is_active(id) {
            return Err(LangFieldError::InactiveLanguage(id));
        }
        self.current = Some(id);
        Ok(self)
    }

    /// Parse a comma-separated list of `id:code:name` definitions.
    pub fn parse(definitions: &str) -> Result<Self, LangFieldError> {
        let languages = definitions
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                Language::parse_definition(part)
                    .ok_or_else(|| LangFieldError::InvalidLanguageDefinition(part.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(languages)
    }

    /// Load a JSON array of `{id, code, name}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, LangFieldError> {
        let content = std::fs::read_to_string(path).map_err(|source| LangFieldError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let languages: Vec<Language> = serde_json::from_str(&content)?;
        Self::new(languages)
    }

    /// Get a language by its code (case-insensitive).
    pub fn get_by_code(&self, code: &str) -> Option<&Language> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Check whether an identifier belongs to an active language.
    pub fn is_active(&self, id: ClangId) -> bool {
        self.languages.iter().any(|lang| lang.id == id)
    }

    /// Borrow the configured languages.
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            current: None,
        }
    }
}

impl LanguageDirectory for StaticDirectory {
    fn active_languages(&self) -> Vec<Language> {
        self.languages.clone()
    }

    fn language_by_id(&self, id: ClangId) -> Option<Language> {
        self.languages.iter().find(|lang| lang.id == id).cloned()
    }

    fn current_language(&self) -> Option<Language> {
        match self.current {
            Some(id) => self.language_by_id(id),
            None => self.languages.first().cloned(),
        }
    }
}

/// A snapshot taken from another directory.
impl LanguageDirectory for Vec<Language> {
    fn active_languages(&self) -> Vec<Language> {
        self.clone()
    }
}

/// Default language set: German (1) and English (2).
fn default_languages() -> Vec<Language> {
    vec![
        Language::new(1, "de", "Deutsch"),
        Language::new(2, "en", "English"),
    ]
}
