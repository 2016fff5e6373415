//! Two-tier translation cache.
//!
//! The in-memory maps are authoritative; the durable snapshot under
//! [`TRANSLATION_CACHE_KEY`] lags behind by at most one debounce window.
//! Writes mark the touched language dirty and arm a single coalescing flush
//! timer, so bursts of insertions produce one storage write.

use crate::storage::Storage;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Storage key holding the durable cache snapshot.
pub const TRANSLATION_CACHE_KEY: &str = "avuntia-translation-cache";

const FLUSH_DELAY: Duration = Duration::from_millis(400);

/// Cache of remote translations, keyed by target language and then by the
/// source-language string.
pub struct TranslationCache {
    storage: Option<Arc<dyn Storage>>,
    languages: Mutex<HashMap<String, HashMap<String, String>>>,
    dirty: Mutex<HashSet<String>>,
    flush_armed: AtomicBool,
    flush_delay: Duration,
}

impl TranslationCache {
    /// Build a cache backed by `storage`, hydrating the in-memory maps from
    /// the durable snapshot. A corrupt snapshot is discarded with a warning
    /// rather than failing startup.
    pub fn new(storage: Arc<dyn Storage>) -> Arc<TranslationCache> {
        TranslationCache::with_flush_delay(storage, FLUSH_DELAY)
    }

    /// Same as [`TranslationCache::new`] with an explicit debounce window.
    pub fn with_flush_delay(
        storage: Arc<dyn Storage>,
        flush_delay: Duration,
    ) -> Arc<TranslationCache> {
        let languages = match storage.get(TRANSLATION_CACHE_KEY) {
            Some(raw) => match serde_json::from_str::<HashMap<String, HashMap<String, String>>>(&raw) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(error = %err, "discarding corrupt translation cache snapshot");
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };
        Arc::new(TranslationCache {
            storage: Some(storage),
            languages: Mutex::new(languages),
            dirty: Mutex::new(HashSet::new()),
            flush_armed: AtomicBool::new(false),
            flush_delay,
        })
    }

    /// Purely in-memory cache, for environments with no durable storage.
    pub fn in_memory() -> Arc<TranslationCache> {
        Arc::new(TranslationCache {
            storage: None,
            languages: Mutex::new(HashMap::new()),
            dirty: Mutex::new(HashSet::new()),
            flush_armed: AtomicBool::new(false),
            flush_delay: FLUSH_DELAY,
        })
    }

    /// Cached translation of `source` into `language`, if present.
    pub fn get(&self, language: &str, source: &str) -> Option<String> {
        self.languages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(language)
            .and_then(|entries| entries.get(source))
            .cloned()
    }

    /// Of `sources`, the ones with no cache entry for `language`. Order and
    /// duplicates of the input are preserved.
    pub fn missing<'a>(&self, language: &str, sources: &[&'a str]) -> Vec<&'a str> {
        let languages = self
            .languages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entries = languages.get(language);
        sources
            .iter()
            .filter(|source| entries.map_or(true, |map| !map.contains_key(**source)))
            .copied()
            .collect()
    }

    /// Insert translations for `language`. Empty translations are skipped so
    /// a failed fetch is retried on the next pass. Returns how many entries
    /// were stored; a flush is scheduled only when that count is nonzero.
    pub fn insert_many(
        self: &Arc<Self>,
        language: &str,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> usize {
        let mut stored = 0;
        {
            let mut languages = self
                .languages
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let entries = languages.entry(language.to_string()).or_default();
            for (source, translation) in pairs {
                if translation.is_empty() {
                    continue;
                }
                entries.insert(source, translation);
                stored += 1;
            }
        }
        if stored > 0 {
            self.dirty
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(language.to_string());
            self.schedule_flush();
        }
        stored
    }

    /// Arm the debounced flush. Repeated calls within the window coalesce
    /// into a single write that picks up whatever is dirty at fire time.
    fn schedule_flush(self: &Arc<Self>) {
        if self.storage.is_none() {
            return;
        }
        if self.flush_armed.swap(true, Ordering::SeqCst) {
            return;
        }
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(cache.flush_delay).await;
            cache.flush_armed.store(false, Ordering::SeqCst);
            if let Err(err) = cache.flush_now() {
                warn!(error = %err, "failed to persist translation cache");
            }
        });
    }

    /// Write the full snapshot to storage immediately and clear the dirty
    /// set. Safe to call with nothing dirty.
    pub fn flush_now(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let dirty: Vec<String> = {
            let mut dirty = self
                .dirty
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            dirty.drain().collect()
        };
        if dirty.is_empty() {
            return Ok(());
        }
        let snapshot = {
            let languages = self
                .languages
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut doc = Map::new();
            for (language, entries) in languages.iter() {
                let mut map = Map::new();
                for (source, translation) in entries {
                    map.insert(source.clone(), Value::String(translation.clone()));
                }
                doc.insert(language.clone(), Value::Object(map));
            }
            Value::Object(doc)
        };
        let raw = serde_json::to_string(&snapshot).context("serializing translation cache")?;
        storage.set(TRANSLATION_CACHE_KEY, &raw)?;
        debug!(languages = ?dirty, "translation cache flushed");
        Ok(())
    }
}
