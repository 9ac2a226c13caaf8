//! Language handling: identifiers, the host's language directory, status
//! reporting and required-language validation.
//!
//! # Architecture
//!
//! - `language`: `ClangId` newtype and the `Language` metadata type
//! - `registry`: `LanguageDirectory` collaborator trait and a static implementation
//! - `status`: per-language translation status across a record's fields
//! - `validator`: required-language check for form submissions
//!
//! # Example
//!
//! ```rust,ignore
//! use lang_fields::i18n::{ClangId, LanguageDirectory, StaticDirectory};
//!
//! let directory = StaticDirectory::parse("1:de:Deutsch,2:en:English")?;
//! let english = directory.language_by_id(ClangId(2));
//! ```

mod language;
mod registry;
mod status;
mod validator;

pub use language::{ClangId, Language};
pub use registry::{LanguageDirectory, StaticDirectory};
pub use status::{translation_status, LanguageStatus, StatusReport};
pub use validator::{LangRequiredValidator, ValidationFailure, DEFAULT_ANY_MESSAGE, DEFAULT_REQUIRED_MESSAGE};
