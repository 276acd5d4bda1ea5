//! Internationalization (i18n) support
//!
//! English and Brazilian Portuguese strings are built in. A site can
//! override or add languages with YAML files in its `i18n_dir`.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Built-in language files
const BUILTIN_LANGUAGES: &[(&str, &str)] = &[
    ("en", include_str!("languages/en.yml")),
    ("pt-BR", include_str!("languages/pt-BR.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the built-in languages loaded
    pub fn new(language: &str) -> Self {
        let mut i18n = Self {
            language: language.to_string(),
            translations: HashMap::new(),
        };

        for (lang, content) in BUILTIN_LANGUAGES {
            match serde_yaml::from_str(content) {
                Ok(data) => {
                    i18n.translations.insert(lang.to_string(), data);
                }
                Err(e) => tracing::warn!("Failed to parse built-in language {}: {}", lang, e),
            }
        }

        i18n
    }

    /// Load language files from a directory, overriding built-in keys
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("en")
                .to_string();

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    self.translations.entry(lang).or_default().extend(data);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => tracing::warn!("Failed to parse language file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key, falling back to English, then to the key
    pub fn get(&self, key: &str) -> String {
        self.lookup(key)
            .map(yaml_value_to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Abbreviated month name, `month` in 1..=12
    pub fn month_abbr(&self, month: u32) -> String {
        self.month_from("months_short", month)
    }

    /// Full month name, `month` in 1..=12
    pub fn month_name(&self, month: u32) -> String {
        self.month_from("months", month)
    }

    fn month_from(&self, key: &str, month: u32) -> String {
        let index = month.saturating_sub(1) as usize;
        match self.lookup(key) {
            Some(serde_yaml::Value::Sequence(names)) => names
                .get(index)
                .map(yaml_value_to_string)
                .unwrap_or_else(|| month.to_string()),
            _ => month.to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.translations
            .get(&self.language)
            .and_then(|data| data.get(key))
            .or_else(|| self.translations.get("en").and_then(|data| data.get(key)))
    }

    /// All string translations for the current language, English filling gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();

        for lang in [self.language.as_str(), "en"] {
            if let Some(data) = self.translations.get(lang) {
                for (key, value) in data {
                    if matches!(value, serde_yaml::Value::Sequence(_)) {
                        continue;
                    }
                    result
                        .entry(key.clone())
                        .or_insert_with(|| yaml_value_to_string(value));
                }
            }
        }

        result
    }
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}
