//! Language registry: single source of truth for the supported languages.

use std::sync::OnceLock;

/// Metadata for one supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "es", "ca", "en")
    pub code: &'static str,

    /// English name of the language
    pub name: &'static str,

    /// Native name of the language
    pub native_name: &'static str,

    /// Whether this is the fallback/source language (exactly one is)
    pub is_fallback: bool,
}

/// Immutable registry of supported languages, initialized once on first
/// access.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    pub fn list(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// The fallback (source) language: site copy and free text are authored
    /// in it, and it is the source side of every remote translation.
    ///
    /// # Panics
    /// Panics if zero or several fallback languages are configured, which
    /// would be a configuration error.
    pub fn fallback(&self) -> &LanguageConfig {
        let fallbacks: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_fallback)
            .collect();
        match fallbacks.len() {
            1 => fallbacks[0],
            0 => panic!("no fallback language configured"),
            _ => panic!("multiple fallback languages configured"),
        }
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_fallback: true,
        },
        LanguageConfig {
            code: "ca",
            name: "Catalan",
            native_name: "Català",
            is_fallback: false,
        },
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_fallback: false,
        },
    ]
}
