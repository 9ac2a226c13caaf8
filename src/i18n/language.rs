//! Language type: identifier plus display metadata.
//!
//! Content languages are identified by a numeric `clang_id`. The host system
//! owns the list of languages; this crate only ever sees snapshots of it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a content language (`clang_id`).
///
/// Serialized as a bare integer so the persisted form stays
/// `{"clang_id": 1, ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClangId(pub u32);

impl ClangId {
    /// Get the raw numeric identifier.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Parse an identifier from untrusted text.
    ///
    /// Leading and trailing whitespace is ignored. Zero, negative and
    /// non-numeric input yield `None`.
    pub fn parse(text: &str) -> Option<ClangId> {
        match text.trim().parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(ClangId(id)),
        }
    }

    /// Parse a comma-separated list such as `"1, 2"`, skipping unusable items.
    pub fn parse_list(list: &str) -> Vec<ClangId> {
        list.split(',').filter_map(ClangId::parse).collect()
    }
}

impl From<u32> for ClangId {
    fn from(id: u32) -> Self {
        ClangId(id)
    }
}

impl fmt::Display for ClangId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content language as described by the host's language directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// Numeric identifier used in persisted collections
    pub id: ClangId,

    /// Short language code (e.g., "de", "en")
    pub code: String,

    /// Human-readable display name (e.g., "Deutsch", "English")
    pub name: String,
}

impl Language {
    /// Create a language entry.
    pub fn new(id: u32, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ClangId(id),
            code: code.into(),
            name: name.into(),
        }
    }

    /// Parse an `id:code:name` definition as used in configuration.
    ///
    /// The name may itself contain colons; only the first two separate.
    pub fn parse_definition(definition: &str) -> Option<Language> {
        let mut parts = definition.trim().splitn(3, ':');
        let id = ClangId::parse(parts.next()?)?;
        let code = parts.next()?.trim();
        let name = parts.next()?.trim();

        if code.is_empty() || name.is_empty() {
            return None;
        }

        Some(Language {
            id,
            code: code.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ClangId Tests ====================

    #[test]
    fn test_clang_id_parse_valid() {
        assert_eq!(ClangId::parse("3"), Some(ClangId(3)));
        assert_eq!(ClangId::parse("  12 "), Some(ClangId(12)));
    }

    #[test]
    fn test_clang_id_parse_rejects_zero_and_negative() {
        assert_eq!(ClangId::parse("0"), None);
        assert_eq!(ClangId::parse("-1"), None);
    }

    #[test]
    fn test_clang_id_parse_rejects_garbage() {
        assert_eq!(ClangId::parse(""), None);
        assert_eq!(ClangId::parse("de"), None);
        assert_eq!(ClangId::parse("1.5"), None);
    }

    #[test]
    fn test_clang_id_serializes_as_integer() {
        let json = serde_json::to_string(&ClangId(7)).expect("Should serialize");
        assert_eq!(json, "7");
    }

    #[test]
    fn test_clang_id_display() {
        assert_eq!(ClangId(42).to_string(), "42");
    }

    #[test]
    fn test_clang_id_parse_list() {
        assert_eq!(ClangId::parse_list(" 3,1 ,x,,0"), vec![ClangId(3), ClangId(1)]);
        assert!(ClangId::parse_list("").is_empty());
    }

    // ==================== Definition Parsing Tests ====================

    #[test]
    fn test_parse_definition() {
        let lang = Language::parse_definition("1:de:Deutsch").expect("Should parse");
        assert_eq!(lang, Language::new(1, "de", "Deutsch"));
    }

    #[test]
    fn test_parse_definition_name_with_colon() {
        let lang = Language::parse_definition(" 4:pt:Português: Brasil ").expect("Should parse");
        assert_eq!(lang.code, "pt");
        assert_eq!(lang.name, "Português: Brasil");
    }

    #[test]
    fn test_parse_definition_invalid() {
        assert!(Language::parse_definition("de:Deutsch").is_none());
        assert!(Language::parse_definition("1:de").is_none());
        assert!(Language::parse_definition("1::Deutsch").is_none());
        assert!(Language::parse_definition("x:de:Deutsch").is_none());
    }
}
