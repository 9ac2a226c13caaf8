//! Read/write helpers over a normalized collection.
//!
//! All functions are pure: mutations return a new collection and leave the
//! input untouched. A missing language is a normal state and reads as `""`.

use crate::collection::LanguageCollection;
use crate::i18n::{ClangId, Language, LanguageDirectory};
use crate::value::{FieldKind, FieldValue};

/// Value stored for `clang_id`, or `None` if the language is absent.
pub fn get_field_value(collection: &LanguageCollection, clang_id: ClangId) -> Option<&FieldValue> {
    collection.get(clang_id).map(|entry| &entry.value)
}

/// Primary text for `clang_id`; `""` when absent.
///
/// For media fields this is the filename.
pub fn get_value(collection: &LanguageCollection, clang_id: ClangId) -> String {
    get_field_value(collection, clang_id)
        .map(|value| value.primary().to_string())
        .unwrap_or_default()
}

/// Replace the text for `clang_id` in a plain text field.
///
/// Any existing entry is removed. A new entry is appended at the end only if
/// the trimmed value is non-empty, so setting `""` deletes the translation.
/// Use [`set_value_for_kind`] for media fields.
pub fn set_value(collection: &LanguageCollection, clang_id: ClangId, value: &str) -> LanguageCollection {
    set_field_value(collection, clang_id, FieldValue::from(value))
}

/// Like [`set_field_value`], first reshaping `value` for a field of `kind`.
///
/// A plain string set on a media-with-caption field becomes a composite with
/// an empty caption, so the collection keeps a single shape.
pub fn set_value_for_kind(
    collection: &LanguageCollection,
    kind: FieldKind,
    clang_id: ClangId,
    value: impl Into<FieldValue>,
) -> LanguageCollection {
    set_field_value(collection, clang_id, value.into().coerce(kind))
}

/// Like [`set_value`] for any value shape; the value is stored as given.
pub fn set_field_value(
    collection: &LanguageCollection,
    clang_id: ClangId,
    value: FieldValue,
) -> LanguageCollection {
    if value.is_blank() {
        collection.without(clang_id)
    } else {
        collection.with_appended(clang_id, value)
    }
}

/// True iff an entry exists and its primary value is non-empty after trimming.
pub fn has_translation(collection: &LanguageCollection, clang_id: ClangId) -> bool {
    get_field_value(collection, clang_id).is_some_and(|value| !value.is_blank())
}

/// Active languages not yet present, in the directory's order.
pub fn available_languages(collection: &LanguageCollection, all_languages: &[Language]) -> Vec<Language> {
    all_languages
        .iter()
        .filter(|language| !collection.contains(language.id))
        .cloned()
        .collect()
}

/// Languages present in the collection, in collection order.
///
/// Identifiers the directory no longer knows are skipped.
pub fn translated_languages(
    collection: &LanguageCollection,
    directory: &dyn LanguageDirectory,
) -> Vec<Language> {
    collection
        .ids()
        .filter_map(|id| directory.language_by_id(id))
        .collect()
}

/// Value chosen by the fallback chain.
///
/// Tries `preferred`, then each of `fallbacks` in order, taking the first
/// non-blank value; otherwise the first entry of the collection whatever its
/// language; otherwise `None`.
pub fn field_value_with_fallback<'a>(
    collection: &'a LanguageCollection,
    preferred: ClangId,
    fallbacks: &[ClangId],
) -> Option<&'a FieldValue> {
    std::iter::once(&preferred)
        .chain(fallbacks)
        .filter_map(|id| get_field_value(collection, *id))
        .find(|value| !value.is_blank())
        .or_else(|| collection.first().map(|entry| &entry.value))
}

/// Primary text chosen by the fallback chain; `""` for an empty collection.
pub fn value_with_fallback(collection: &LanguageCollection, preferred: ClangId, fallbacks: &[ClangId]) -> String {
    field_value_with_fallback(collection, preferred, fallbacks)
        .map(|value| value.primary().to_string())
        .unwrap_or_default()
}

/// Primary text in the directory's current language, then the fallback chain.
pub fn value_in_current_language(
    collection: &LanguageCollection,
    directory: &dyn LanguageDirectory,
    fallbacks: &[ClangId],
) -> String {
    match directory.current_language() {
        Some(current) => value_with_fallback(collection, current.id, fallbacks),
        None => String::new(),
    }
}

/// Whether every collection has a non-empty translation for every required language.
pub fn is_fully_translated_for<'a>(
    collections: impl IntoIterator<Item = &'a LanguageCollection>,
    required: &[ClangId],
) -> bool {
    collections
        .into_iter()
        .all(|collection| required.iter().all(|id| has_translation(collection, *id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::StaticDirectory;
    use crate::value::LanguageValue;

    fn collection(entries: &[(u32, &str)]) -> LanguageCollection {
        entries
            .iter()
            .map(|(id, value)| LanguageValue::new(ClangId(*id), *value))
            .collect()
    }

    fn ids(collection: &LanguageCollection) -> Vec<u32> {
        collection.ids().map(ClangId::get).collect()
    }

    // ==================== get_value Tests ====================

    #[test]
    fn test_get_value_present() {
        let c = collection(&[(1, "Hallo"), (2, "Hello")]);
        assert_eq!(get_value(&c, ClangId(2)), "Hello");
    }

    #[test]
    fn test_get_value_absent_is_empty() {
        let c = collection(&[(1, "Hallo")]);
        assert_eq!(get_value(&c, ClangId(7)), "");
        assert_eq!(get_value(&LanguageCollection::new(), ClangId(1)), "");
    }

    #[test]
    fn test_get_value_media_returns_filename() {
        let c: LanguageCollection = vec![LanguageValue::new(
            ClangId(1),
            FieldValue::Media {
                media: "a.jpg".to_string(),
                text: "Alt".to_string(),
            },
        )]
        .into_iter()
        .collect();
        assert_eq!(get_value(&c, ClangId(1)), "a.jpg");
    }

    // ==================== set_value Tests ====================

    #[test]
    fn test_set_value_appends_new_language() {
        let c = collection(&[(1, "Hallo")]);
        let next = set_value(&c, ClangId(2), "Hello");
        assert_eq!(ids(&next), vec![1, 2]);
        assert_eq!(get_value(&next, ClangId(2)), "Hello");
    }

    #[test]
    fn test_set_value_replaces_and_moves_to_end() {
        let c = collection(&[(1, "Hallo"), (2, "Hello")]);
        let next = set_value(&c, ClangId(1), "Servus");
        assert_eq!(ids(&next), vec![2, 1]);
        assert_eq!(get_value(&next, ClangId(1)), "Servus");
    }

    #[test]
    fn test_set_value_is_copy_on_write() {
        let c = collection(&[(1, "Hallo")]);
        let _ = set_value(&c, ClangId(1), "Servus");
        assert_eq!(get_value(&c, ClangId(1)), "Hallo");
    }

    #[test]
    fn test_set_value_empty_deletes() {
        let c = collection(&[(1, "Hallo"), (2, "Hello")]);
        let next = set_value(&c, ClangId(1), "  ");
        assert_eq!(ids(&next), vec![2]);
        assert!(!has_translation(&next, ClangId(1)));
    }

    #[test]
    fn test_set_value_empty_on_absent_language() {
        let c = collection(&[(1, "Hallo")]);
        let next = set_value(&c, ClangId(3), "");
        assert_eq!(next, c);
        assert!(!has_translation(&next, ClangId(3)));
    }

    #[test]
    fn test_set_value_keeps_zero() {
        let next = set_value(&LanguageCollection::new(), ClangId(1), "0");
        assert_eq!(get_value(&next, ClangId(1)), "0");
        assert!(has_translation(&next, ClangId(1)));
    }

    #[test]
    fn test_set_field_value_media_without_file_deletes() {
        let c = collection(&[(1, "a.jpg")]);
        let next = set_field_value(
            &c,
            ClangId(1),
            FieldValue::Media {
                media: String::new(),
                text: "Caption only".to_string(),
            },
        );
        assert!(next.is_empty());
    }

    #[test]
    fn test_set_value_for_kind_keeps_composite_shape() {
        let kind = FieldKind::Media { with_text: true };
        let c: LanguageCollection = vec![LanguageValue::new(
            ClangId(1),
            FieldValue::Media {
                media: "a.jpg".to_string(),
                text: "Alt".to_string(),
            },
        )]
        .into_iter()
        .collect();

        let next = set_value_for_kind(&c, kind, ClangId(2), "b.jpg");

        assert!(next.iter().all(|entry| entry.value.caption().is_some()));
        assert_eq!(get_value(&next, ClangId(2)), "b.jpg");
    }

    #[test]
    fn test_set_value_for_kind_flattens_composite_for_text() {
        let next = set_value_for_kind(
            &LanguageCollection::new(),
            FieldKind::Text,
            ClangId(1),
            FieldValue::Media {
                media: "Titel".to_string(),
                text: "ignored".to_string(),
            },
        );
        assert_eq!(get_field_value(&next, ClangId(1)), Some(&FieldValue::from("Titel")));
    }

    // ==================== has_translation Tests ====================

    #[test]
    fn test_has_translation() {
        let c = collection(&[(1, "Hallo"), (2, " ")]);
        assert!(has_translation(&c, ClangId(1)));
        assert!(!has_translation(&c, ClangId(2)));
        assert!(!has_translation(&c, ClangId(3)));
    }

    #[test]
    fn test_has_translation_caption_alone_does_not_count() {
        let c: LanguageCollection = vec![LanguageValue::new(
            ClangId(1),
            FieldValue::Media {
                media: String::new(),
                text: "Alt".to_string(),
            },
        )]
        .into_iter()
        .collect();
        assert!(!has_translation(&c, ClangId(1)));
    }

    // ==================== available_languages Tests ====================

    #[test]
    fn test_available_languages_in_directory_order() {
        let all = vec![
            Language::new(1, "de", "Deutsch"),
            Language::new(2, "en", "English"),
            Language::new(3, "fr", "Français"),
        ];
        let c = collection(&[(1, "Hallo")]);
        let available: Vec<_> = available_languages(&c, &all).into_iter().map(|l| l.id.get()).collect();
        assert_eq!(available, vec![2, 3]);
    }

    #[test]
    fn test_available_languages_ignores_insertion_order() {
        let all = vec![
            Language::new(1, "de", "Deutsch"),
            Language::new(2, "en", "English"),
            Language::new(3, "fr", "Français"),
            Language::new(4, "it", "Italiano"),
        ];
        let c = collection(&[(3, "Bonjour"), (1, "Hallo")]);
        let available: Vec<_> = available_languages(&c, &all).into_iter().map(|l| l.id.get()).collect();
        assert_eq!(available, vec![2, 4]);
    }

    #[test]
    fn test_available_languages_counts_blank_entries_as_present() {
        let all = vec![Language::new(1, "de", "Deutsch"), Language::new(2, "en", "English")];
        let c = collection(&[(2, "")]);
        let available: Vec<_> = available_languages(&c, &all).into_iter().map(|l| l.id.get()).collect();
        assert_eq!(available, vec![1]);
    }

    // ==================== translated_languages Tests ====================

    #[test]
    fn test_translated_languages_skips_unknown() {
        let directory = StaticDirectory::default();
        let c = collection(&[(2, "Hello"), (9, "Ghost"), (1, "Hallo")]);
        let codes: Vec<_> = translated_languages(&c, &directory)
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, vec!["en", "de"]);
    }

    // ==================== Fallback Tests ====================

    #[test]
    fn test_fallback_prefers_requested_language() {
        let c = collection(&[(1, "a"), (2, "b")]);
        assert_eq!(value_with_fallback(&c, ClangId(2), &[ClangId(1)]), "b");
    }

    #[test]
    fn test_fallback_chain_order() {
        let c = collection(&[(1, "a"), (3, "c")]);
        assert_eq!(value_with_fallback(&c, ClangId(2), &[ClangId(3), ClangId(1)]), "c");
    }

    #[test]
    fn test_fallback_skips_blank_values() {
        let c = collection(&[(1, "a"), (2, "  "), (3, "")]);
        assert_eq!(value_with_fallback(&c, ClangId(2), &[ClangId(3), ClangId(1)]), "a");
    }

    #[test]
    fn test_fallback_to_first_entry() {
        let c = collection(&[(4, "d"), (5, "e")]);
        assert_eq!(value_with_fallback(&c, ClangId(1), &[ClangId(2)]), "d");
    }

    #[test]
    fn test_fallback_first_entry_even_if_blank() {
        let c = collection(&[(4, ""), (5, "e")]);
        assert_eq!(value_with_fallback(&c, ClangId(1), &[]), "");
    }

    #[test]
    fn test_fallback_empty_collection() {
        assert_eq!(value_with_fallback(&LanguageCollection::new(), ClangId(1), &[ClangId(2)]), "");
        assert!(field_value_with_fallback(&LanguageCollection::new(), ClangId(1), &[]).is_none());
    }

    #[test]
    fn test_value_in_current_language() {
        let c = collection(&[(1, ""), (2, "Hello")]);
        let german = StaticDirectory::default();
        let english = StaticDirectory::default().with_current(ClangId(2)).expect("Should pin");

        assert_eq!(value_in_current_language(&c, &english, &[]), "Hello");
        assert_eq!(value_in_current_language(&c, &german, &[ClangId(2)]), "Hello");
        assert_eq!(value_in_current_language(&c, &Vec::<Language>::new(), &[]), "");
    }

    // ==================== Completeness Tests ====================

    #[test]
    fn test_is_fully_translated_for() {
        let title = collection(&[(1, "Titel"), (2, "Title")]);
        let body = collection(&[(1, "Text"), (2, "")]);

        assert!(is_fully_translated_for([&title, &body], &[ClangId(1)]));
        assert!(!is_fully_translated_for([&title, &body], &[ClangId(1), ClangId(2)]));
        assert!(is_fully_translated_for([&title], &[ClangId(1), ClangId(2)]));
    }

    #[test]
    fn test_is_fully_translated_for_nothing_required() {
        assert!(is_fully_translated_for([&LanguageCollection::new()], &[]));
    }
}
