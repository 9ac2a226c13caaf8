//! lang-fields - inspect and check multilingual field values from the shell
//!
//! Usage:
//!   lang-fields normalize [--kind text|media|media-with-text] <file|->
//!   lang-fields status <record.json>
//!   lang-fields validate <record.json> <field> [required-ids]
//!   lang-fields value <record.json> <field> [preferred-id]
//!   lang-fields search <records.json> <field> <term>
//!
//! `normalize` prints the canonical persisted text (or `null`). `status`
//! treats every string or array member of the record object as a multilingual
//! text field and prints the per-language status as JSON. `validate` exits
//! with code 1 and prints the message when the field fails. `value` prints
//! the field in the preferred language (the current language by default),
//! walking LANG_FIELDS_FALLBACKS when it is blank. `search` reads a JSON array
//! of records and prints those whose field contains the term in any active
//! language.
//!
//! Optional environment variables:
//! - LANG_FIELDS_LANGUAGES_FILE (JSON array of {id, code, name})
//! - LANG_FIELDS_LANGUAGES (defaults to 1:de:Deutsch,2:en:English)
//! - LANG_FIELDS_CURRENT_LANGUAGE (defaults to the first language)
//! - LANG_FIELDS_FALLBACKS
//! - LANG_FIELDS_SEARCH_CASE (sensitive or insensitive, used by `search`)
//! - LANG_FIELDS_REQUIRED_MESSAGE

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::Read;
use tracing::{debug, info};

use lang_fields::config::Config;
use lang_fields::i18n::{ClangId, LangRequiredValidator, LanguageDirectory};
use lang_fields::{
    format_for_save, Dataset, FieldKind, Filter, Normalizer, RawInput, RecordSchema, StoredRecord,
};

const USAGE: &str = "Usage:
  lang-fields normalize [--kind text|media|media-with-text] <file|->
  lang-fields status <record.json>
  lang-fields validate <record.json> <field> [required-ids]
  lang-fields value <record.json> <field> [preferred-id]
  lang-fields search <records.json> <field> <term>";

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("lang_fields=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    debug!(languages = config.directory.languages().len(), "Configuration loaded");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!("Missing command\n{}", USAGE);
    };

    match command.as_str() {
        "normalize" => run_normalize(&config, rest),
        "status" => run_status(&config, rest),
        "validate" => run_validate(&config, rest),
        "value" => run_value(&config, rest),
        "search" => run_search(&config, rest),
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command `{}`\n{}", other, USAGE),
    }
}

fn run_normalize(config: &Config, args: &[String]) -> Result<()> {
    let mut kind = FieldKind::Text;
    let mut source = None;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--kind" => {
                let name = args.next().context("--kind requires a value")?;
                kind = parse_kind(name)?;
            }
            _ if source.is_none() => source = Some(arg.as_str()),
            _ => bail!("Unexpected argument `{}`\n{}", arg, USAGE),
        }
    }

    let source = source.context("normalize requires an input file or `-`")?;
    let input = read_input(source)?;

    let collection = Normalizer::new(kind).normalize(input, &config.directory.active_ids());
    info!(entries = collection.len(), "Normalized input");

    match format_for_save(&collection, kind)? {
        Some(text) => println!("{}", text),
        None => println!("null"),
    }
    Ok(())
}

fn run_status(config: &Config, args: &[String]) -> Result<()> {
    let [path] = args else {
        bail!("status takes exactly one record file\n{}", USAGE);
    };

    let record_json = read_record(path)?;
    let schema = infer_schema(&record_json);
    let dataset = Dataset::new(&schema, StoredRecord::from_json(&record_json), &config.directory);

    let report = dataset.translation_status()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_validate(config: &Config, args: &[String]) -> Result<()> {
    let (path, field, required) = match args {
        [path, field] => (path, field, Vec::new()),
        [path, field, required] => (path, field, ClangId::parse_list(required)),
        _ => bail!("validate takes a record file, a field and optional required ids\n{}", USAGE),
    };

    let record_json = read_record(path)?;
    let raw = match record_json.get(field.as_str()) {
        Some(Value::String(text)) => RawInput::Serialized(text.clone()),
        Some(value) => RawInput::Parsed(value.clone()),
        None => RawInput::Parsed(Value::Null),
    };

    let mut validator = LangRequiredValidator::new(field.as_str()).with_required(required);
    if let Some(message) = &config.required_message {
        validator = validator.with_message(message.as_str());
    }

    match validator.validate(raw, &config.directory) {
        Ok(()) => {
            info!(field = %field, "Validation passed");
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure);
            std::process::exit(1);
        }
    }
}

fn run_value(config: &Config, args: &[String]) -> Result<()> {
    let (path, field, preferred) = match args {
        [path, field] => (path, field, None),
        [path, field, preferred] => {
            let id = ClangId::parse(preferred)
                .with_context(|| format!("`{}` is not a language id", preferred))?;
            (path, field, Some(id))
        }
        _ => bail!("value takes a record file, a field and an optional language id\n{}", USAGE),
    };

    let record_json = read_record(path)?;
    println!("{}", field_value(config, &record_json, field, preferred)?);
    Ok(())
}

fn run_search(config: &Config, args: &[String]) -> Result<()> {
    let [path, field, term] = args else {
        bail!("search takes a records file, a field and a term\n{}", USAGE);
    };

    let content = read_input(path)?;
    let records: Vec<Value> =
        serde_json::from_str(&content).with_context(|| format!("{} must contain a JSON array", path))?;

    let found = search_records(config, records, field, term);
    info!(field = %field, matches = found.len(), "Search finished");
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

/// Value of `field` in `preferred` (or the current language), then the configured fallbacks.
fn field_value(config: &Config, record: &Value, field: &str, preferred: Option<ClangId>) -> Result<String> {
    let preferred = match preferred {
        Some(id) => id,
        None => {
            config
                .directory
                .current_language()
                .context("No active languages configured")?
                .id
        }
    };

    let schema = RecordSchema::new("record").with_field(field, FieldKind::Text);
    let dataset = Dataset::new(&schema, StoredRecord::from_json(record), &config.directory);
    Ok(dataset.value_with_fallback(field, preferred, &config.fallbacks)?)
}

fn search_records(config: &Config, records: Vec<Value>, field: &str, term: &str) -> Vec<Value> {
    let active: Vec<ClangId> = config.directory.languages().iter().map(|lang| lang.id).collect();
    let filter = Filter::search_all_languages(field, term, &active, config.search_case);

    records
        .into_iter()
        .filter(|record| filter.matches(&StoredRecord::from_json(record)))
        .collect()
}

fn parse_kind(name: &str) -> Result<FieldKind> {
    match name {
        "text" => Ok(FieldKind::Text),
        "textarea" => Ok(FieldKind::Textarea),
        "media" => Ok(FieldKind::Media { with_text: false }),
        "media-with-text" => Ok(FieldKind::Media { with_text: true }),
        other => bail!("Unknown field kind `{}`", other),
    }
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}

fn read_record(path: &str) -> Result<Value> {
    let content = read_input(path)?;
    let record: Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path))?;
    if !record.is_object() {
        bail!("{} must contain a JSON object", path);
    }
    Ok(record)
}

/// Every string or array member is taken to be a multilingual text field.
fn infer_schema(record: &Value) -> RecordSchema {
    let mut schema = RecordSchema::new("record");
    if let Value::Object(map) = record {
        for (name, value) in map {
            if value.is_string() || value.is_array() {
                schema = schema.with_field(name.as_str(), FieldKind::Text);
            }
        }
    }
    schema
}
