use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::warn;

use crate::i18n::{ClangId, LanguageDirectory, StaticDirectory};
use crate::query::SearchCase;

/// Inline language list used when neither variable is set.
pub const DEFAULT_LANGUAGES: &str = "1:de:Deutsch,2:en:English";

#[derive(Debug, Clone)]
pub struct Config {
    // Languages
    pub directory: StaticDirectory,
    pub fallbacks: Vec<ClangId>,

    // Query behavior
    pub search_case: SearchCase,

    // Validation
    pub required_message: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // A language file takes precedence over the inline list
        let directory = match std::env::var("LANG_FIELDS_LANGUAGES_FILE") {
            Ok(path) => StaticDirectory::from_json_file(Path::new(&path))
                .with_context(|| format!("Failed to load languages from {}", path))?,
            Err(_) => {
                let definitions = std::env::var("LANG_FIELDS_LANGUAGES")
                    .unwrap_or_else(|_| DEFAULT_LANGUAGES.to_string());
                StaticDirectory::parse(&definitions).context("LANG_FIELDS_LANGUAGES is invalid")?
            }
        };

        let directory = match std::env::var("LANG_FIELDS_CURRENT_LANGUAGE") {
            Ok(value) => {
                let id = ClangId::parse(&value)
                    .with_context(|| format!("LANG_FIELDS_CURRENT_LANGUAGE `{}` is not a language id", value))?;
                directory
                    .with_current(id)
                    .context("LANG_FIELDS_CURRENT_LANGUAGE is invalid")?
            }
            Err(_) => directory,
        };

        let fallbacks = std::env::var("LANG_FIELDS_FALLBACKS")
            .map(|list| ClangId::parse_list(&list))
            .unwrap_or_default();
        for id in &fallbacks {
            if directory.language_by_id(*id).is_none() {
                warn!(%id, "Fallback language is not active");
            }
        }

        let search_case = match std::env::var("LANG_FIELDS_SEARCH_CASE") {
            Ok(value) => parse_search_case(&value)?,
            Err(_) => SearchCase::default(),
        };

        Ok(Self {
            directory,
            fallbacks,
            search_case,
            required_message: std::env::var("LANG_FIELDS_REQUIRED_MESSAGE")
                .ok()
                .filter(|message| !message.trim().is_empty()),
        })
    }
}

fn parse_search_case(value: &str) -> Result<SearchCase> {
    match value.trim().to_lowercase().as_str() {
        "" | "sensitive" => Ok(SearchCase::Sensitive),
        "insensitive" => Ok(SearchCase::Insensitive),
        other => bail!("LANG_FIELDS_SEARCH_CASE must be `sensitive` or `insensitive`, got `{}`", other),
    }
}
