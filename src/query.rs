//! Filters, projections and sort keys over persisted multilingual columns.
//!
//! Everything here works on the *stored* JSON text, never on normalized
//! collections, so a storage layer can filter many records without loading
//! each one through the normalizer. Each builder can be evaluated in memory
//! against a [`StoredRecord`] or compiled into a PostgreSQL fragment with
//! `sqlx::QueryBuilder`; both paths implement the same rules:
//!
//! - a column that is `NULL`, unparsable or not a JSON array has no entries;
//! - an entry belongs to a language when its `clang_id`, read as text,
//!   equals the language id;
//! - the value of a language is the value of its *first* entry, the media
//!   filename for composites;
//! - a value is non-empty when it contains a non-whitespace character.
//!
//! SQL compilation expects valid JSON (or `NULL`) in the column, which is
//! what [`format_for_save`](crate::storage::format_for_save) writes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use crate::error::LangFieldError;
use crate::i18n::{ClangId, LanguageDirectory};
use crate::storage::StoredRecord;

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Case policy for text search.
///
/// The default is case-sensitive containment (`LIKE`); `Insensitive` compares
/// lowercased text in memory and uses `ILIKE` in SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchCase {
    #[default]
    Sensitive,
    Insensitive,
}

impl SearchCase {
    fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            SearchCase::Sensitive => haystack.contains(needle),
            SearchCase::Insensitive => haystack.to_lowercase().contains(&needle.to_lowercase()),
        }
    }

    fn operator(self) -> &'static str {
        match self {
            SearchCase::Sensitive => "LIKE",
            SearchCase::Insensitive => "ILIKE",
        }
    }
}

/// Record predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// An entry for the language exists, blank or not
    TranslationExists { field: String, clang_id: ClangId },
    /// The language's value is non-empty
    TranslationNotEmpty { field: String, clang_id: ClangId },
    /// An entry for the language contains `term` (media or caption)
    TranslationLike {
        field: String,
        clang_id: ClangId,
        term: String,
        case: SearchCase,
    },
    /// An entry for one of `clang_ids` contains `term` (media or caption)
    SearchAllLanguages {
        field: String,
        term: String,
        clang_ids: Vec<ClangId>,
        case: SearchCase,
    },
    /// All filters match; true when empty
    All(Vec<Filter>),
    /// At least one filter matches; false when empty
    Any(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn translation_exists(field: impl Into<String>, clang_id: ClangId) -> Filter {
        Filter::TranslationExists {
            field: field.into(),
            clang_id,
        }
    }

    pub fn translation_not_empty(field: impl Into<String>, clang_id: ClangId) -> Filter {
        Filter::TranslationNotEmpty {
            field: field.into(),
            clang_id,
        }
    }

    pub fn translation_like(
        field: impl Into<String>,
        clang_id: ClangId,
        term: impl Into<String>,
        case: SearchCase,
    ) -> Filter {
        Filter::TranslationLike {
            field: field.into(),
            clang_id,
            term: term.into(),
            case,
        }
    }

    /// [`translation_exists`](Filter::translation_exists) for the directory's
    /// current language; `None` when the directory has no languages.
    pub fn current_language_exists(field: impl Into<String>, directory: &dyn LanguageDirectory) -> Option<Filter> {
        let current = directory.current_language()?;
        Some(Filter::translation_exists(field, current.id))
    }

    pub fn current_language_like(
        field: impl Into<String>,
        term: impl Into<String>,
        case: SearchCase,
        directory: &dyn LanguageDirectory,
    ) -> Option<Filter> {
        let current = directory.current_language()?;
        Some(Filter::translation_like(field, current.id, term, case))
    }

    /// Search every active language.
    ///
    /// Pass the directory's active identifiers; entries left behind by
    /// deactivated languages never match, as they never survive normalization.
    pub fn search_all_languages(
        field: impl Into<String>,
        term: impl Into<String>,
        clang_ids: &[ClangId],
        case: SearchCase,
    ) -> Filter {
        Filter::SearchAllLanguages {
            field: field.into(),
            term: term.into(),
            clang_ids: clang_ids.to_vec(),
            case,
        }
    }

    /// Every field has an entry for every language.
    ///
    /// Existence rule: unlike
    /// [`has_translation`](crate::accessor::has_translation), an entry whose
    /// value was later emptied still counts.
    pub fn fully_translated(fields: &[&str], clang_ids: &[ClangId]) -> Filter {
        Filter::All(
            fields
                .iter()
                .flat_map(|field| clang_ids.iter().map(move |id| Filter::translation_exists(*field, *id)))
                .collect(),
        )
    }

    /// Some field lacks an entry for some language.
    pub fn incomplete_translations(fields: &[&str], clang_ids: &[ClangId]) -> Filter {
        Filter::Any(
            fields
                .iter()
                .flat_map(|field| {
                    clang_ids
                        .iter()
                        .map(move |id| Filter::translation_exists(*field, *id).negate())
                })
                .collect(),
        )
    }

    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::All(mut filters) => {
                filters.push(other);
                Filter::All(filters)
            }
            first => Filter::All(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Any(mut filters) => {
                filters.push(other);
                Filter::Any(filters)
            }
            first => Filter::Any(vec![first, other]),
        }
    }

    pub fn negate(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// Evaluate against one stored record.
    pub fn matches(&self, record: &StoredRecord) -> bool {
        match self {
            Filter::TranslationExists { field, clang_id } => {
                RawEntries::of(record, field).first_tagged(*clang_id).is_some()
            }
            Filter::TranslationNotEmpty { field, clang_id } => {
                is_nonblank(RawEntries::of(record, field).lookup(*clang_id).as_deref())
            }
            Filter::TranslationLike {
                field,
                clang_id,
                term,
                case,
            } => RawEntries::of(record, field)
                .tagged(*clang_id)
                .any(|entry| entry_contains(entry, term, *case)),
            Filter::SearchAllLanguages {
                field,
                term,
                clang_ids,
                case,
            } => {
                let entries = RawEntries::of(record, field);
                clang_ids.iter().any(|id| {
                    entries
                        .tagged(*id)
                        .any(|entry| entry_contains(entry, term, *case))
                })
            }
            Filter::All(filters) => filters.iter().all(|filter| filter.matches(record)),
            Filter::Any(filters) => filters.iter().any(|filter| filter.matches(record)),
            Filter::Not(filter) => !filter.matches(record),
        }
    }

    /// Append the equivalent boolean SQL expression.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) -> Result<(), LangFieldError> {
        match self {
            Filter::TranslationExists { field, clang_id } => {
                let column = quote_identifier(field)?;
                qb.push(format!(
                    "EXISTS (SELECT 1 FROM {} AS e WHERE e->>'clang_id' = ",
                    elements(&column)
                ));
                qb.push_bind(clang_id.to_string());
                qb.push(")");
            }
            Filter::TranslationNotEmpty { field, clang_id } => {
                let column = quote_identifier(field)?;
                qb.push("COALESCE(");
                push_lookup(qb, &column, *clang_id);
                qb.push(format!(", '') ~ '{}'", NON_BLANK_PATTERN));
            }
            Filter::TranslationLike {
                field,
                clang_id,
                term,
                case,
            } => {
                let column = quote_identifier(field)?;
                qb.push(format!(
                    "EXISTS (SELECT 1 FROM {} AS e WHERE e->>'clang_id' = ",
                    elements(&column)
                ));
                qb.push_bind(clang_id.to_string());
                qb.push(" AND ");
                push_entry_like(qb, term, *case);
                qb.push(")");
            }
            Filter::SearchAllLanguages {
                field,
                term,
                clang_ids,
                case,
            } => {
                let column = quote_identifier(field)?;
                qb.push(format!(
                    "EXISTS (SELECT 1 FROM {} AS e WHERE e->>'clang_id' = ANY(",
                    elements(&column)
                ));
                qb.push_bind(clang_ids.iter().map(ClangId::to_string).collect::<Vec<_>>());
                qb.push(") AND ");
                push_entry_like(qb, term, *case);
                qb.push(")");
            }
            Filter::All(filters) => push_joined(qb, filters, " AND ", "TRUE")?,
            Filter::Any(filters) => push_joined(qb, filters, " OR ", "FALSE")?,
            Filter::Not(filter) => {
                qb.push("NOT (");
                filter.push_sql(qb)?;
                qb.push(")");
            }
        }
        Ok(())
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        self.negate()
    }
}

/// Value produced by a [`ValueExpr`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Selected {
    Null,
    Text(String),
    Count(usize),
}

/// Derived column computed from a multilingual field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    /// The language's value, `NULL` when absent
    Translation { field: String, clang_id: ClangId },
    /// Preferred language, then fallbacks in order, then the first entry, then `""`
    Fallback {
        field: String,
        preferred: ClangId,
        fallbacks: Vec<ClangId>,
    },
    /// Number of stored entries
    TranslationCount { field: String },
    /// `translated` or `untranslated` by the existence rule
    TranslationState { field: String, clang_id: ClangId },
}

impl ValueExpr {
    pub fn select_translation(field: impl Into<String>, clang_id: ClangId) -> ValueExpr {
        ValueExpr::Translation {
            field: field.into(),
            clang_id,
        }
    }

    /// Same precedence chain as
    /// [`value_with_fallback`](crate::accessor::value_with_fallback).
    pub fn fallback_select_value(field: impl Into<String>, preferred: ClangId, fallbacks: &[ClangId]) -> ValueExpr {
        ValueExpr::Fallback {
            field: field.into(),
            preferred,
            fallbacks: fallbacks.to_vec(),
        }
    }

    pub fn select_current_language(
        field: impl Into<String>,
        directory: &dyn LanguageDirectory,
    ) -> Option<ValueExpr> {
        let current = directory.current_language()?;
        Some(ValueExpr::select_translation(field, current.id))
    }

    pub fn translation_count(field: impl Into<String>) -> ValueExpr {
        ValueExpr::TranslationCount { field: field.into() }
    }

    pub fn translation_status_group(field: impl Into<String>, clang_id: ClangId) -> ValueExpr {
        ValueExpr::TranslationState {
            field: field.into(),
            clang_id,
        }
    }

    /// Evaluate against one stored record.
    pub fn evaluate(&self, record: &StoredRecord) -> Selected {
        match self {
            ValueExpr::Translation { field, clang_id } => RawEntries::of(record, field)
                .lookup(*clang_id)
                .map(Selected::Text)
                .unwrap_or(Selected::Null),
            ValueExpr::Fallback {
                field,
                preferred,
                fallbacks,
            } => {
                let entries = RawEntries::of(record, field);
                let chosen = std::iter::once(preferred)
                    .chain(fallbacks)
                    .filter_map(|id| entries.lookup(*id))
                    .find(|value| is_nonblank(Some(value.as_str())))
                    .or_else(|| entries.first_any())
                    .unwrap_or_default();
                Selected::Text(chosen)
            }
            ValueExpr::TranslationCount { field } => Selected::Count(RawEntries::of(record, field).items.len()),
            ValueExpr::TranslationState { field, clang_id } => {
                let state = if RawEntries::of(record, field).first_tagged(*clang_id).is_some() {
                    "translated"
                } else {
                    "untranslated"
                };
                Selected::Text(state.to_string())
            }
        }
    }

    /// Append the equivalent SQL value expression.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) -> Result<(), LangFieldError> {
        match self {
            ValueExpr::Translation { field, clang_id } => {
                let column = quote_identifier(field)?;
                push_lookup(qb, &column, *clang_id);
            }
            ValueExpr::Fallback {
                field,
                preferred,
                fallbacks,
            } => {
                let column = quote_identifier(field)?;
                qb.push("CASE");
                for id in std::iter::once(preferred).chain(fallbacks) {
                    qb.push(" WHEN COALESCE(");
                    push_lookup(qb, &column, *id);
                    qb.push(format!(", '') ~ '{}' THEN ", NON_BLANK_PATTERN));
                    push_lookup(qb, &column, *id);
                }
                qb.push(format!(
                    " ELSE COALESCE((SELECT {} FROM {} WITH ORDINALITY AS t(e, ord) \
                     WHERE t.e->>'clang_id' IS NOT NULL ORDER BY t.ord LIMIT 1), '') END",
                    primary("t.e"),
                    elements(&column)
                ));
            }
            ValueExpr::TranslationCount { field } => {
                let column = quote_identifier(field)?;
                qb.push(format!("jsonb_array_length({})", as_array(&column)));
            }
            ValueExpr::TranslationState { field, clang_id } => {
                qb.push("CASE WHEN ");
                Filter::translation_exists(field.clone(), *clang_id).push_sql(qb)?;
                qb.push(" THEN 'translated' ELSE 'untranslated' END");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Placement of records without a value for the sort language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    #[default]
    Last,
}

/// Sort key on one language's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    field: String,
    clang_id: ClangId,
    direction: Direction,
    nulls: NullsOrder,
}

impl OrderKey {
    /// Ascending, `NULLS LAST`.
    pub fn by_language(field: impl Into<String>, clang_id: ClangId) -> OrderKey {
        OrderKey {
            field: field.into(),
            clang_id,
            direction: Direction::Asc,
            nulls: NullsOrder::Last,
        }
    }

    /// Sort by the directory's current language.
    pub fn by_current_language(field: impl Into<String>, directory: &dyn LanguageDirectory) -> Option<OrderKey> {
        let current = directory.current_language()?;
        Some(OrderKey::by_language(field, current.id))
    }

    pub fn direction(mut self, direction: Direction) -> OrderKey {
        self.direction = direction;
        self
    }

    pub fn nulls(mut self, nulls: NullsOrder) -> OrderKey {
        self.nulls = nulls;
        self
    }

    /// The value this record sorts by; `None` when the language is missing.
    pub fn key(&self, record: &StoredRecord) -> Option<String> {
        RawEntries::of(record, &self.field).lookup(self.clang_id)
    }

    pub fn compare(&self, a: &StoredRecord, b: &StoredRecord) -> Ordering {
        match (self.key(a), self.key(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => match self.nulls {
                NullsOrder::First => Ordering::Less,
                NullsOrder::Last => Ordering::Greater,
            },
            (Some(_), None) => match self.nulls {
                NullsOrder::First => Ordering::Greater,
                NullsOrder::Last => Ordering::Less,
            },
            (Some(a), Some(b)) => match self.direction {
                Direction::Asc => a.cmp(&b),
                Direction::Desc => b.cmp(&a),
            },
        }
    }

    /// Stable in-memory sort.
    pub fn sort(&self, records: &mut [StoredRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) -> Result<(), LangFieldError> {
        let column = quote_identifier(&self.field)?;
        push_lookup(qb, &column, self.clang_id);
        qb.push(match self.direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
        qb.push(match self.nulls {
            NullsOrder::First => " NULLS FIRST",
            NullsOrder::Last => " NULLS LAST",
        });
        Ok(())
    }
}

/// Record returned by [`LangQuery::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRow {
    pub record: StoredRecord,
    pub selected: BTreeMap<String, Selected>,
}

/// Query over one table combining filters, derived columns and sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangQuery {
    table: String,
    filters: Vec<Filter>,
    selects: Vec<(ValueExpr, String)>,
    order: Vec<OrderKey>,
}

impl LangQuery {
    pub fn new(table: impl Into<String>) -> LangQuery {
        LangQuery {
            table: table.into(),
            filters: Vec::new(),
            selects: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> LangQuery {
        self.filters.push(filter);
        self
    }

    pub fn select(mut self, expr: ValueExpr, alias: impl Into<String>) -> LangQuery {
        self.selects.push((expr, alias.into()));
        self
    }

    pub fn order_by(mut self, key: OrderKey) -> LangQuery {
        self.order.push(key);
        self
    }

    /// Evaluate in memory: filter, sort, then compute derived columns.
    pub fn apply(&self, records: impl IntoIterator<Item = StoredRecord>) -> Vec<QueryRow> {
        let mut matching: Vec<StoredRecord> = records
            .into_iter()
            .filter(|record| self.filters.iter().all(|filter| filter.matches(record)))
            .collect();

        matching.sort_by(|a, b| {
            self.order
                .iter()
                .map(|key| key.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        matching
            .into_iter()
            .map(|record| {
                let selected = self
                    .selects
                    .iter()
                    .map(|(expr, alias)| (alias.clone(), expr.evaluate(&record)))
                    .collect();
                QueryRow { record, selected }
            })
            .collect()
    }

    /// Compile into a PostgreSQL query; all values are bound parameters.
    pub fn to_sql(&self) -> Result<QueryBuilder<'static, Postgres>, LangFieldError> {
        let table = quote_identifier(&self.table)?;
        let mut qb = QueryBuilder::new("SELECT *");

        for (expr, alias) in &self.selects {
            let alias = quote_identifier(alias)?;
            qb.push(", ");
            expr.push_sql(&mut qb)?;
            qb.push(format!(" AS {}", alias));
        }

        qb.push(format!(" FROM {}", table));

        if !self.filters.is_empty() {
            qb.push(" WHERE ");
            push_joined(&mut qb, &self.filters, " AND ", "TRUE")?;
        }

        for (index, key) in self.order.iter().enumerate() {
            qb.push(if index == 0 { " ORDER BY " } else { ", " });
            key.push_sql(&mut qb)?;
        }

        Ok(qb)
    }
}

// ==================== In-memory evaluation ====================

/// Entries of one stored column, read without normalization.
struct RawEntries {
    items: Vec<Value>,
}

impl RawEntries {
    fn of(record: &StoredRecord, field: &str) -> RawEntries {
        let items = match record.get(field).map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Array(items))) => items,
            _ => Vec::new(),
        };
        RawEntries { items }
    }

    fn tagged(&self, clang_id: ClangId) -> impl Iterator<Item = &Value> {
        let wanted = clang_id.to_string();
        self.items
            .iter()
            .filter(move |entry| clang_text(entry).as_deref() == Some(wanted.as_str()))
    }

    fn first_tagged(&self, clang_id: ClangId) -> Option<&Value> {
        self.tagged(clang_id).next()
    }

    fn lookup(&self, clang_id: ClangId) -> Option<String> {
        self.first_tagged(clang_id).and_then(primary_text)
    }

    fn first_any(&self) -> Option<String> {
        self.items
            .iter()
            .find(|entry| clang_text(entry).is_some())
            .and_then(primary_text)
    }
}

/// `entry->>'clang_id'`
fn clang_text(entry: &Value) -> Option<String> {
    entry.get("clang_id").and_then(json_text)
}

/// Media filename for composites, the value itself otherwise.
fn primary_text(entry: &Value) -> Option<String> {
    match entry.get("value")? {
        Value::Object(map) => map.get("media").and_then(json_text),
        other => json_text(other),
    }
}

fn caption_text(entry: &Value) -> Option<String> {
    match entry.get("value")? {
        Value::Object(map) => map.get("text").and_then(json_text),
        _ => None,
    }
}

/// Text rendering of a JSON value as PostgreSQL's `->>` produces it.
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn entry_contains(entry: &Value, term: &str, case: SearchCase) -> bool {
    [primary_text(entry), caption_text(entry)]
        .into_iter()
        .flatten()
        .any(|text| case.contains(&text, term))
}

fn is_nonblank(value: Option<&str>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}

// ==================== SQL fragments ====================

const NON_BLANK_PATTERN: &str = r"\S";

fn quote_identifier(name: &str) -> Result<String, LangFieldError> {
    let regex = IDENTIFIER_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

    if regex.is_match(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(LangFieldError::InvalidIdentifier(name.to_string()))
    }
}

/// The column as a JSON array; anything else reads as `[]`.
fn as_array(column: &str) -> String {
    format!(
        "CASE WHEN jsonb_typeof({column}::jsonb) = 'array' THEN {column}::jsonb ELSE '[]'::jsonb END"
    )
}

fn elements(column: &str) -> String {
    format!("jsonb_array_elements({})", as_array(column))
}

fn primary(entry: &str) -> String {
    format!(
        "CASE WHEN jsonb_typeof({entry}->'value') = 'object' \
         THEN {entry}->'value'->>'media' ELSE {entry}->>'value' END"
    )
}

/// Scalar subquery: value of the first entry for `clang_id`, or `NULL`.
fn push_lookup(qb: &mut QueryBuilder<'_, Postgres>, column: &str, clang_id: ClangId) {
    qb.push(format!(
        "(SELECT {} FROM {} WITH ORDINALITY AS t(e, ord) WHERE t.e->>'clang_id' = ",
        primary("t.e"),
        elements(column)
    ));
    qb.push_bind(clang_id.to_string());
    qb.push(" ORDER BY t.ord LIMIT 1)");
}

/// `(primary LIKE $n OR caption LIKE $m)` for the row alias `e`.
fn push_entry_like(qb: &mut QueryBuilder<'_, Postgres>, term: &str, case: SearchCase) {
    let pattern = format!("%{}%", escape_like(term));
    qb.push(format!("(({}) {} ", primary("e"), case.operator()));
    qb.push_bind(pattern.clone());
    qb.push(format!(" OR e->'value'->>'text' {} ", case.operator()));
    qb.push_bind(pattern);
    qb.push(")");
}

fn push_joined(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) -> Result<(), LangFieldError> {
    if filters.is_empty() {
        qb.push(empty);
        return Ok(());
    }

    qb.push("(");
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            qb.push(separator);
        }
        filter.push_sql(qb)?;
    }
    qb.push(")");
    Ok(())
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
