//! Per-language values and the field kinds that shape them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::i18n::ClangId;

/// Configuration of a multilingual field.
///
/// The kind decides, once per field, which `FieldValue` shape its
/// collection carries and how an empty collection is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    /// Single-line text
    #[default]
    Text,
    /// Multi-line text
    Textarea,
    /// Media filename, optionally with a caption per language
    Media { with_text: bool },
}

/// How a collection with no translations is written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyEncoding {
    /// Persist SQL `NULL`
    Null,
    /// Persist the literal `[]`
    EmptyArray,
}

impl FieldKind {
    /// Map a host field type name (`lang_text`, `lang_textarea`, `lang_media`).
    pub fn from_type_name(type_name: &str, with_text: bool) -> Option<FieldKind> {
        match type_name {
            "lang_text" => Some(FieldKind::Text),
            "lang_textarea" => Some(FieldKind::Textarea),
            "lang_media" => Some(FieldKind::Media { with_text }),
            _ => None,
        }
    }

    /// Whether values carry a media + caption composite.
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldKind::Media { with_text: true })
    }

    /// Empty-state encoding this kind contractually uses.
    pub fn empty_encoding(&self) -> EmptyEncoding {
        match self {
            FieldKind::Text | FieldKind::Textarea => EmptyEncoding::Null,
            FieldKind::Media { .. } => EmptyEncoding::EmptyArray,
        }
    }
}

/// Value stored for one language.
///
/// Plain values serialize as a JSON string, composites as
/// `{"media": ..., "text": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Media {
        media: String,
        #[serde(default)]
        text: String,
    },
}

impl FieldValue {
    /// Empty value in the shape `kind` requires.
    pub fn empty(kind: FieldKind) -> FieldValue {
        if kind.is_composite() {
            FieldValue::Media {
                media: String::new(),
                text: String::new(),
            }
        } else {
            FieldValue::Text(String::new())
        }
    }

    /// Shape an untrusted JSON value for a field of `kind`.
    ///
    /// A composite arriving at a plain field contributes its `media` member;
    /// a plain string arriving at a composite field becomes the media part
    /// with an empty caption.
    pub fn from_json(value: &Value, kind: FieldKind) -> FieldValue {
        if kind.is_composite() {
            match value {
                Value::Object(map) => FieldValue::Media {
                    media: map.get("media").map(scalar_text).unwrap_or_default(),
                    text: map.get("text").map(scalar_text).unwrap_or_default(),
                },
                other => FieldValue::Media {
                    media: scalar_text(other),
                    text: String::new(),
                },
            }
        } else {
            match value {
                Value::Object(map) => {
                    FieldValue::Text(map.get("media").map(scalar_text).unwrap_or_default())
                }
                other => FieldValue::Text(scalar_text(other)),
            }
        }
    }

    /// Same value in the shape `kind` requires.
    ///
    /// Text becomes the media part of a composite with an empty caption; a
    /// composite given to a plain field keeps only its media part.
    pub fn coerce(self, kind: FieldKind) -> FieldValue {
        match (self, kind.is_composite()) {
            (FieldValue::Text(text), true) => FieldValue::Media {
                media: text,
                text: String::new(),
            },
            (FieldValue::Media { media, .. }, false) => FieldValue::Text(media),
            (value, _) => value,
        }
    }

    /// Primary payload: the text itself, or the media filename.
    pub fn primary(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Media { media, .. } => media,
        }
    }

    /// Caption of a composite value, if any.
    pub fn caption(&self) -> Option<&str> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Media { text, .. } => Some(text),
        }
    }

    /// True when the primary payload is empty after trimming.
    ///
    /// A caption without media does not count as content.
    pub fn is_blank(&self) -> bool {
        self.primary().trim().is_empty()
    }

    /// Copy with surrounding whitespace removed from every part.
    pub fn trimmed(&self) -> FieldValue {
        match self {
            FieldValue::Text(text) => FieldValue::Text(text.trim().to_string()),
            FieldValue::Media { media, text } => FieldValue::Media {
                media: media.trim().to_string(),
                text: text.trim().to_string(),
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

/// Text form of a JSON scalar; containers and `null` read as empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// One translation slot: a language and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageValue {
    pub clang_id: ClangId,
    pub value: FieldValue,
}

impl LanguageValue {
    pub fn new(clang_id: ClangId, value: impl Into<FieldValue>) -> Self {
        Self {
            clang_id,
            value: value.into(),
        }
    }
}
