//! Internationalization (i18n) module.
//!
//! Everything language-related lives here: the supported-language registry,
//! the structured site copy and flat dictionary, the translation overlay
//! applied to rendered trees, and the remote machine-translation client with
//! its two-tier cache.
//!
//! # Architecture
//!
//! - `registry`: single source of truth for supported languages
//! - `language`: validated `Language` value type
//! - `copy`: keyed translation sources (site copy + dictionary)
//! - `overlay`: per-render translation pass (keyed + free-text)
//! - `cache`: in-memory + durable translation cache with debounced flush
//! - `client`: concurrency-limited remote translation endpoint client

mod cache;
mod client;
mod copy;
mod language;
mod overlay;
mod registry;

pub use cache::{TranslationCache, TRANSLATION_CACHE_KEY};
pub use client::TranslationClient;
pub use copy::translate;
pub use language::Language;
pub use overlay::Translator;
pub use registry::{LanguageConfig, LanguageRegistry};
