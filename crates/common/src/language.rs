//! Static language table
//!
//! Each entry is what the language picker renders: a display label in the
//! language's own script, the code stored per session, and the ordinal used
//! to order the picker rows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Label shown on the picker button
    pub text: String,
    /// Two-letter code sent to the backend and stored per session
    pub code: String,
    /// Ordinal position in the picker
    pub index: u32,
}

impl Language {
    pub fn new(text: impl Into<String>, code: impl Into<String>, index: u32) -> Self {
        Self {
            text: text.into(),
            code: code.into(),
            index,
        }
    }
}

/// The full built-in language table, used when `LANGUAGES` is not set.
pub fn default_languages() -> Vec<Language> {
    vec![
        Language::new("English", "en", 1),
        Language::new("বাংলা", "bn", 2),
        Language::new("ગુજરાતી", "gu", 3),
        Language::new("हिंदी", "hi", 4),
        Language::new("ಕನ್ನಡ", "kn", 5),
        Language::new("മലയാളം ", "ml", 6),
        Language::new("मराठी", "mr", 7),
        Language::new("ଓଡ଼ିଆ", "or", 8),
        Language::new("ਪੰਜਾਬੀ", "pa", 9),
        Language::new("தமிழ்", "ta", 10),
        Language::new("తెలుగు", "te", 11),
    ]
}
