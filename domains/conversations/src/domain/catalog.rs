//! Localized message catalog
//!
//! Built once at startup from one JSON file per language and shared
//! read-only afterwards. Lookups fall back to the default language when the
//! requested language or key is missing, and to built-in English text when
//! the default language lacks the key as well.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keys the conversation flow reads from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Confirmation after a language is picked
    LanguageSelection,
    /// "Please wait" while the backend is queried
    ContextLoading,
    /// Shown once when the backend call fails
    ContextError,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanguageSelection => "language_selection",
            Self::ContextLoading => "context_loading_msg",
            Self::ContextError => "context_error_msg",
        }
    }

    fn builtin_text(&self) -> &'static str {
        match self {
            Self::LanguageSelection => {
                "Language selected. You can now type your question or send a voice message."
            }
            Self::ContextLoading => "Please wait while I look that up...",
            Self::ContextError => "Sorry, something went wrong. Please try again later.",
        }
    }
}

type LanguageTable = HashMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    default_language: String,
    tables: HashMap<String, LanguageTable>,
}

impl MessageCatalog {
    pub fn new(default_language: impl Into<String>, tables: HashMap<String, LanguageTable>) -> Self {
        Self {
            default_language: default_language.into(),
            tables,
        }
    }

    /// Load `<code>.json` files from `dir`; the file stem is the language code
    pub fn load_dir(
        dir: impl AsRef<Path>,
        default_language: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut tables = HashMap::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CatalogError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();

            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let raw = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let table: LanguageTable =
                serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                    path: path.clone(),
                    source,
                })?;

            tracing::debug!(language = %code, keys = table.len(), "Loaded message catalog");
            tables.insert(code.to_string(), table);
        }

        Ok(Self::new(default_language, tables))
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Language codes with a loaded table
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Raw lookup with default-language fallback
    pub fn message(&self, language: &str, key: &str) -> Option<String> {
        self.message_for(language, key, None)
    }

    /// Like [`message`](Self::message), preferring a bot-specific variant
    /// when the entry is an object keyed by bot id
    pub fn message_for(&self, language: &str, key: &str, bot_id: Option<&str>) -> Option<String> {
        if let Some(message) = self.lookup(language, key, bot_id) {
            return Some(message);
        }

        if language != self.default_language {
            tracing::warn!(
                language = %language,
                key = %key,
                fallback = %self.default_language,
                "Catalog entry missing, using default language"
            );
            return self.lookup(&self.default_language, key, bot_id);
        }

        None
    }

    /// Text for a flow key; never empty-handed
    pub fn text(&self, language: &str, key: MessageKey) -> String {
        self.message(language, key.as_str())
            .unwrap_or_else(|| key.builtin_text().to_string())
    }

    fn lookup(&self, language: &str, key: &str, bot_id: Option<&str>) -> Option<String> {
        let entry = self.tables.get(language)?.get(key)?;

        if let (Some(bot_id), Value::Object(variants)) = (bot_id, entry) {
            if let Some(Value::String(text)) = variants.get(bot_id) {
                return Some(text.clone());
            }
        }

        match entry {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: Value) -> LanguageTable {
        serde_json::from_value(value).unwrap()
    }

    fn catalog() -> MessageCatalog {
        let mut tables = HashMap::new();
        tables.insert(
            "en".to_string(),
            table(json!({
                "language_selection": "English selected",
                "context_loading_msg": "Loading...",
                "context_error_msg": "Something went wrong",
                "greeting": {"bot-a": "Hello from A"}
            })),
        );
        tables.insert(
            "hi".to_string(),
            table(json!({
                "context_loading_msg": "कृपया प्रतीक्षा करें...",
                "greeting": {"bot-a": "A की ओर से नमस्ते"}
            })),
        );
        MessageCatalog::new("en", tables)
    }

    #[test]
    fn test_message_in_requested_language() {
        assert_eq!(
            catalog().message("hi", "context_loading_msg").as_deref(),
            Some("कृपया प्रतीक्षा करें...")
        );
    }

    #[test]
    fn test_missing_key_falls_back_to_default_language() {
        assert_eq!(
            catalog().message("hi", "context_error_msg").as_deref(),
            Some("Something went wrong")
        );
    }

    #[test]
    fn test_missing_language_falls_back_to_default_language() {
        assert_eq!(
            catalog().message("ta", "language_selection").as_deref(),
            Some("English selected")
        );
    }

    #[test]
    fn test_unknown_key_everywhere_is_none() {
        assert_eq!(catalog().message("hi", "nope"), None);
    }

    #[test]
    fn test_bot_specific_variant() {
        assert_eq!(
            catalog()
                .message_for("hi", "greeting", Some("bot-a"))
                .as_deref(),
            Some("A की ओर से नमस्ते")
        );
        assert_eq!(catalog().message_for("hi", "greeting", None), None);
    }

    #[test]
    fn test_text_uses_builtin_when_catalog_is_empty() {
        let empty = MessageCatalog::new("en", HashMap::new());
        assert_eq!(
            empty.text("hi", MessageKey::ContextError),
            MessageKey::ContextError.builtin_text()
        );
    }

    #[test]
    fn test_load_dir_reads_json_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("en.json"),
            r#"{"context_loading_msg": "Loading..."}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("hi.json"),
            r#"{"context_loading_msg": "लोड हो रहा है..."}"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "not a catalog").unwrap();

        let catalog = MessageCatalog::load_dir(dir.path(), "en").unwrap();

        let mut languages: Vec<&str> = catalog.languages().collect();
        languages.sort_unstable();
        assert_eq!(languages, vec!["en", "hi"]);
        assert_eq!(
            catalog.text("hi", MessageKey::ContextLoading),
            "लोड हो रहा है..."
        );
    }

    #[test]
    fn test_load_dir_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.json"), "{ not json").unwrap();

        let err = MessageCatalog::load_dir(dir.path(), "en").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = MessageCatalog::load_dir("/definitely/not/here", "en").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_shipped_catalogs_cover_flow_keys() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../languages");
        let catalog = MessageCatalog::load_dir(dir, "en").unwrap();

        for key in [
            MessageKey::LanguageSelection,
            MessageKey::ContextLoading,
            MessageKey::ContextError,
        ] {
            assert!(catalog.message("en", key.as_str()).is_some());
            assert!(catalog.message("hi", key.as_str()).is_some());
        }
    }
}
