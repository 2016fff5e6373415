//! Validated language value type.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};

/// A language validated against the registry. Construction guarantees the
/// code is supported, so lookups through `config()` cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    code: &'static str,
}

impl Language {
    pub const SPANISH: Language = Language { code: "es" };
    pub const CATALAN: Language = Language { code: "ca" };
    pub const ENGLISH: Language = Language { code: "en" };

    /// Strict constructor: errors on unsupported codes.
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) => Ok(Language { code: config.code }),
            None => bail!("unsupported language code: '{code}'"),
        }
    }

    /// Lenient constructor: unsupported codes resolve to the fallback
    /// language instead of failing.
    pub fn resolve(code: &str) -> Language {
        Language::from_code(code).unwrap_or_else(|_| Language::fallback())
    }

    /// The fallback (source) language.
    pub fn fallback() -> Language {
        let config = LanguageRegistry::get().fallback();
        Language { code: config.code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("validated language code is always in the registry")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn is_fallback(&self) -> bool {
        self.config().is_fallback
    }

    /// All supported languages, fallback first.
    pub fn all() -> Vec<Language> {
        LanguageRegistry::get()
            .list()
            .iter()
            .map(|config| Language { code: config.code })
            .collect()
    }
}
