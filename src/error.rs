//! Error types for configuration and query-building operations.
//!
//! Malformed field input never surfaces here: it degrades to an empty
//! collection. These errors cover programmer and configuration mistakes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::i18n::ClangId;

/// Primary error type for the crate.
#[derive(Debug, Error)]
pub enum LangFieldError {
    /// Column or alias name cannot be used as a SQL identifier.
    #[error("invalid SQL identifier `{0}`")]
    InvalidIdentifier(String),

    /// Field is not declared as multilingual in the record schema.
    #[error("unknown multilingual field `{field}`")]
    UnknownField {
        /// Name of the field that was requested.
        field: String,
    },

    /// Language code does not belong to any active language.
    #[error("unknown language code `{code}`")]
    UnknownLanguageCode {
        /// Code that was requested.
        code: String,
    },

    /// Identifier does not belong to any active language.
    #[error("language id {0} is not active")]
    InactiveLanguage(ClangId),

    /// Two languages in a directory share the same identifier.
    #[error("duplicate language id {0}")]
    DuplicateLanguage(ClangId),

    /// Two languages in a directory share the same code.
    #[error("duplicate language code `{0}`")]
    DuplicateLanguageCode(String),

    /// Language definition could not be parsed.
    #[error("invalid language definition `{0}`")]
    InvalidLanguageDefinition(String),

    /// Serializing or parsing a JSON document failed.
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    /// Reading a language file failed.
    #[error("failed to read {path}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
