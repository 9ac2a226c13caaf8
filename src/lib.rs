//! Multilingual form field values.
//!
//! One logical field stores one value per content language as an ordered,
//! de-duplicated collection keyed by `clang_id`. This crate normalizes
//! untrusted input into that collection, reads and edits it, filters stored
//! records by it (in memory or as PostgreSQL fragments) and validates
//! required languages.
//!
//! ```rust,ignore
//! use lang_fields::{accessor, normalize, ClangId, LanguageDirectory, StaticDirectory};
//!
//! let directory = StaticDirectory::default();
//! let title = normalize(r#"[{"clang_id":1,"value":"Hallo"}]"#, &directory.active_ids());
//! let title = accessor::set_value(&title, ClangId(2), "Hello");
//! assert_eq!(accessor::get_value(&title, ClangId(2)), "Hello");
//! ```

pub mod accessor;
pub mod collection;
pub mod config;
pub mod error;
pub mod i18n;
pub mod normalize;
pub mod query;
pub mod schema;
pub mod storage;
pub mod value;

pub use collection::LanguageCollection;
pub use error::LangFieldError;
pub use i18n::{ClangId, Language, LanguageDirectory, StaticDirectory};
pub use normalize::{normalize, Normalizer, RawInput};
pub use query::{Filter, LangQuery, OrderKey, SearchCase, ValueExpr};
pub use schema::{Dataset, LocalizedAccessors, RecordSchema};
pub use storage::{format_for_save, StoredRecord};
pub use value::{FieldKind, FieldValue, LanguageValue};
