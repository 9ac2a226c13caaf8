//! Record schemas and per-record views.
//!
//! A `RecordSchema` declares which columns of a record type are multilingual
//! and of which kind. It is built once and passed by reference; nothing is
//! cached behind the caller's back.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::accessor;
use crate::collection::LanguageCollection;
use crate::error::LangFieldError;
use crate::i18n::{translation_status, ClangId, Language, LanguageDirectory, StatusReport};
use crate::normalize::Normalizer;
use crate::storage::{format_for_save, list_display, StoredRecord};
use crate::value::{FieldKind, FieldValue};

/// One multilingual column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

/// Multilingual fields of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    table: String,
    fields: Vec<FieldDef>,
}

impl RecordSchema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a multilingual field. Redeclaring a name replaces its kind.
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(existing) => existing.kind = kind,
            None => self.fields.push(FieldDef { name, kind }),
        }
        self
    }

    /// Build from host column metadata `(column, type name, with_text)`.
    ///
    /// Columns whose type is not one of the `lang_*` types are ignored.
    pub fn from_columns<'c>(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = (&'c str, &'c str, bool)>,
    ) -> Self {
        columns
            .into_iter()
            .fold(Self::new(table), |schema, (name, type_name, with_text)| {
                match FieldKind::from_type_name(type_name, with_text) {
                    Some(kind) => schema.with_field(name, kind),
                    None => schema,
                }
            })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Like [`field`](Self::field) but fails for undeclared names.
    pub fn require(&self, name: &str) -> Result<&FieldDef, LangFieldError> {
        self.field(name).ok_or_else(|| LangFieldError::UnknownField {
            field: name.to_string(),
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

/// `(field, language code)` lookup table for per-language accessors such as
/// `title` in `de`.
///
/// Built once from a schema and a language snapshot. Codes match
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct LocalizedAccessors {
    fields: HashSet<String>,
    table: HashMap<(String, String), ClangId>,
}

impl LocalizedAccessors {
    pub fn build(schema: &RecordSchema, languages: &[Language]) -> Self {
        let fields: HashSet<String> = schema.field_names().map(str::to_string).collect();
        let table = fields
            .iter()
            .flat_map(|field| {
                languages
                    .iter()
                    .map(move |lang| ((field.clone(), lang.code.to_lowercase()), lang.id))
            })
            .collect();

        Self { fields, table }
    }

    /// Language identifier behind `field` + `code`.
    pub fn resolve(&self, field: &str, code: &str) -> Result<ClangId, LangFieldError> {
        if !self.fields.contains(field) {
            return Err(LangFieldError::UnknownField {
                field: field.to_string(),
            });
        }

        self.table
            .get(&(field.to_string(), code.to_lowercase()))
            .copied()
            .ok_or_else(|| LangFieldError::UnknownLanguageCode {
                code: code.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Multilingual view over one stored record.
///
/// Holds a snapshot of the active languages taken at construction; every
/// read normalizes the stored column against that snapshot and every write
/// stores the column in its persisted form immediately.
#[derive(Debug, Clone)]
pub struct Dataset<'s> {
    schema: &'s RecordSchema,
    record: StoredRecord,
    languages: Vec<Language>,
}

impl<'s> Dataset<'s> {
    pub fn new(schema: &'s RecordSchema, record: StoredRecord, directory: &dyn LanguageDirectory) -> Self {
        Self {
            schema,
            record,
            languages: directory.active_languages(),
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        self.schema
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn record(&self) -> &StoredRecord {
        &self.record
    }

    pub fn into_record(self) -> StoredRecord {
        self.record
    }

    fn active_ids(&self) -> HashSet<ClangId> {
        self.languages.iter().map(|lang| lang.id).collect()
    }

    /// Normalized collection of a multilingual field.
    pub fn translations(&self, field: &str) -> Result<LanguageCollection, LangFieldError> {
        let def = self.schema.require(field)?;
        Ok(Normalizer::new(def.kind).normalize(self.record.get(field), &self.active_ids()))
    }

    /// Normalized collections of every declared field.
    pub fn all_translations(&self) -> Result<BTreeMap<String, LanguageCollection>, LangFieldError> {
        self.schema
            .field_names()
            .map(|name| Ok((name.to_string(), self.translations(name)?)))
            .collect()
    }

    pub fn value_in_language(&self, field: &str, clang_id: ClangId) -> Result<String, LangFieldError> {
        Ok(accessor::get_value(&self.translations(field)?, clang_id))
    }

    /// Value through the localized accessor table, e.g. `("title", "de")`.
    pub fn localized_value(
        &self,
        accessors: &LocalizedAccessors,
        field: &str,
        code: &str,
    ) -> Result<String, LangFieldError> {
        let clang_id = accessors.resolve(field, code)?;
        self.value_in_language(field, clang_id)
    }

    /// Set one language's value and store the column.
    ///
    /// On a media-with-caption field the text becomes the media filename.
    pub fn set_value_in_language(
        &mut self,
        field: &str,
        clang_id: ClangId,
        value: &str,
    ) -> Result<(), LangFieldError> {
        self.set_field_value_in_language(field, clang_id, FieldValue::from(value))
    }

    /// Set one language's value, reshaped for the field's kind, and store the column.
    pub fn set_field_value_in_language(
        &mut self,
        field: &str,
        clang_id: ClangId,
        value: FieldValue,
    ) -> Result<(), LangFieldError> {
        let kind = self.schema.require(field)?.kind;
        let updated = accessor::set_value_for_kind(&self.translations(field)?, kind, clang_id, value);
        let stored = format_for_save(&updated, kind)?;

        debug!(field, %clang_id, entries = updated.len(), "Stored language value");
        self.record.set(field, stored);
        Ok(())
    }

    pub fn has_translation(&self, field: &str, clang_id: ClangId) -> Result<bool, LangFieldError> {
        Ok(accessor::has_translation(&self.translations(field)?, clang_id))
    }

    pub fn available_languages(&self, field: &str) -> Result<Vec<Language>, LangFieldError> {
        Ok(accessor::available_languages(&self.translations(field)?, &self.languages))
    }

    pub fn translated_languages(&self, field: &str) -> Result<Vec<Language>, LangFieldError> {
        Ok(accessor::translated_languages(&self.translations(field)?, &self.languages))
    }

    pub fn value_with_fallback(
        &self,
        field: &str,
        preferred: ClangId,
        fallbacks: &[ClangId],
    ) -> Result<String, LangFieldError> {
        Ok(accessor::value_with_fallback(&self.translations(field)?, preferred, fallbacks))
    }

    /// Status across every declared field and active language.
    pub fn translation_status(&self) -> Result<StatusReport, LangFieldError> {
        Ok(translation_status(&self.all_translations()?, &self.languages))
    }

    /// Whether every declared field is translated in every `required` language.
    pub fn is_fully_translated_for(&self, required: &[ClangId]) -> Result<bool, LangFieldError> {
        let fields = self.all_translations()?;
        Ok(accessor::is_fully_translated_for(fields.values(), required))
    }

    pub fn list_display(&self, field: &str) -> Result<String, LangFieldError> {
        Ok(list_display(&self.translations(field)?, &self.languages))
    }
}
