//! Supported-language filtering and the language picker keyboard

use kbchat_common::Language;
use kbchat_telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Callback payload prefix of language picker buttons
pub const LANGUAGE_CALLBACK_PREFIX: &str = "lang_";

/// Entries of `all` whose code is in `supported`, ordered by their index.
/// Entries sharing an index keep their table order.
pub fn supported_languages(all: &[Language], supported: &[String]) -> Vec<Language> {
    let mut languages: Vec<Language> = all
        .iter()
        .filter(|language| supported.iter().any(|code| code == &language.code))
        .cloned()
        .collect();
    languages.sort_by_key(|language| language.index);
    languages
}

/// One button per row; `None` when there is nothing to pick from
pub fn language_keyboard(languages: &[Language]) -> Option<InlineKeyboardMarkup> {
    if languages.is_empty() {
        return None;
    }

    let rows = languages
        .iter()
        .map(|language| {
            vec![InlineKeyboardButton::new(
                language.text.clone(),
                format!("{}{}", LANGUAGE_CALLBACK_PREFIX, language.code),
            )]
        })
        .collect();

    Some(InlineKeyboardMarkup::new(rows))
}
