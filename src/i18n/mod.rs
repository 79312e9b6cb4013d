//! Interface translation.
//!
//! Dictionaries are fetched once at startup. Lookups fall back from the
//! current language to English to the caller's own text, so a missing or
//! partial dictionary only ever degrades to untranslated labels.

mod preferences;

pub use preferences::{
    FilePreferences, LANGUAGE_KEY, MemoryPreferences, PreferenceStore, THEME_KEY, Theme,
};

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use tracing::{info, warn};

use crate::gateway::{Backend, TranslationSet};
use crate::render::{LanguageOption, RenderCommand, RenderSink};

/// Fallback language and the language every other one falls back to.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages the interface offers: code and label in the language itself.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "हिन्दी"),
    ("ta", "தமிழ்"),
    ("te", "తెలుగు"),
];

/// How the first interface language is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePolicy {
    /// Use the persisted language, else the configured default.
    #[default]
    Restore,
    /// Use the persisted language, else ask the user.
    Prompt,
}

/// Result of resolving the startup language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialLanguage {
    /// Language is settled.
    Ready(String),
    /// Nothing persisted and the policy wants the user to choose.
    NeedsPrompt,
}

/// Label of a supported language code.
#[must_use]
pub fn language_label(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find_map(|(c, label)| (*c == code).then_some(*label))
}

/// Whether `code` is one of [`LANGUAGES`].
#[must_use]
pub fn is_supported(code: &str) -> bool {
    language_label(code).is_some()
}

/// Every supported language as a prompt option.
#[must_use]
pub fn language_options() -> Vec<LanguageOption> {
    LANGUAGES
        .iter()
        .map(|(code, label)| LanguageOption {
            code: (*code).to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

/// Dictionary holder and current-language state.
#[derive(Debug)]
pub struct Translator {
    dictionaries: RwLock<TranslationSet>,
    language: RwLock<String>,
    preferences: Arc<dyn PreferenceStore>,
}

impl Translator {
    /// Create a translator with empty dictionaries.
    ///
    /// The starting language is the persisted one when it is supported,
    /// otherwise `default_language` (itself falling back to English).
    pub fn new(preferences: Arc<dyn PreferenceStore>, default_language: &str) -> Self {
        let language = preferences
            .get(LANGUAGE_KEY)
            .filter(|code| is_supported(code))
            .or_else(|| is_supported(default_language).then(|| default_language.to_string()))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let mut dictionaries = TranslationSet::new();
        dictionaries.insert(DEFAULT_LANGUAGE.to_string(), HashMap::new());

        Self {
            dictionaries: RwLock::new(dictionaries),
            language: RwLock::new(language),
            preferences,
        }
    }

    /// Fetch the dictionaries. Failure leaves an English-only empty set.
    pub async fn load(&self, backend: &dyn Backend) {
        let loaded = match backend.fetch_translations().await {
            Ok(set) => {
                info!(
                    name: "i18n.loaded",
                    languages = set.len(),
                    "Translations loaded"
                );
                set
            }
            Err(e) => {
                warn!(
                    name: "i18n.load.failed",
                    error = %e,
                    "Translations unavailable, running in English only"
                );
                let mut fallback = TranslationSet::new();
                fallback.insert(DEFAULT_LANGUAGE.to_string(), HashMap::new());
                fallback
            }
        };
        *self
            .dictionaries
            .write()
            .unwrap_or_else(PoisonError::into_inner) = loaded;
    }

    /// Current language code.
    pub fn language(&self) -> String {
        self.language
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look `key` up in the current language, then English, then return
    /// `fallback`.
    pub fn translate(&self, key: &str, fallback: &str) -> String {
        let language = self.language();
        let dictionaries = self
            .dictionaries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        [language.as_str(), DEFAULT_LANGUAGE]
            .iter()
            .filter_map(|code| dictionaries.get(*code))
            .find_map(|dict| dict.get(key).filter(|text| !text.is_empty()))
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Decide the startup language under `policy`.
    pub fn initial_language(&self, policy: LanguagePolicy) -> InitialLanguage {
        let persisted = self
            .preferences
            .get(LANGUAGE_KEY)
            .filter(|code| is_supported(code));
        match (persisted, policy) {
            (Some(code), _) => InitialLanguage::Ready(code),
            (None, LanguagePolicy::Restore) => InitialLanguage::Ready(self.language()),
            (None, LanguagePolicy::Prompt) => InitialLanguage::NeedsPrompt,
        }
    }

    /// Re-translate every tagged label in the sink.
    pub fn apply(&self, sink: &dyn RenderSink) {
        let language = self.language();
        sink.render(RenderCommand::ApplyTranslations {
            dictionary: self.effective_dictionary(&language),
            language,
        });
    }

    /// Switch language, persist it, re-apply labels, and confirm in the new
    /// language. Unsupported codes are ignored; returns whether the switch
    /// happened.
    pub fn set_language(&self, code: &str, sink: &dyn RenderSink) -> bool {
        let Some(label) = language_label(code) else {
            return false;
        };

        *self.language.write().unwrap_or_else(PoisonError::into_inner) = code.to_string();
        if let Err(e) = self.preferences.set(LANGUAGE_KEY, code) {
            warn!(
                name: "i18n.persist.failed",
                language = code,
                error = %e,
                "Could not persist language"
            );
        }
        info!(name: "i18n.language.changed", language = code, "Interface language changed");

        self.apply(sink);
        let confirmation = format!(
            "{} {label}",
            self.translate("msg_language_changed", "Language changed to")
        );
        sink.render(RenderCommand::system(confirmation));
        true
    }

    fn effective_dictionary(&self, language: &str) -> HashMap<String, String> {
        let dictionaries = self
            .dictionaries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut merged = dictionaries
            .get(DEFAULT_LANGUAGE)
            .cloned()
            .unwrap_or_default();
        if let Some(dict) = dictionaries.get(language) {
            merged.extend(dict.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}
