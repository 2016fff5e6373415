//! Translation overlay applied to rendered node trees.
//!
//! Three passes run over a tree, in order:
//!
//! 1. keyed: elements carrying `data-i18n-key` get their content replaced
//!    with the resolved copy for the active language
//! 2. attributes: elements carrying `data-i18n-attr` get the listed
//!    attributes replaced with resolved copy
//! 3. free text: remaining human-readable text and translatable attributes
//!    are machine-translated through the cache and, on a miss, the remote
//!    client
//!
//! The free-text pass captures the first value it sees on every node as the
//! source-language original. Those originals are the cache keys, which keeps
//! them stable across repeated passes, and switching back to the fallback
//! language restores them verbatim with no network involved.

use crate::i18n::copy::{format_translation, resolve_translation};
use crate::i18n::{Language, TranslationCache, TranslationClient};
use crate::view::{Element, Node};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Tags whose text is never user-facing prose.
const SKIP_TAGS: [&str; 7] = ["script", "style", "code", "pre", "noscript", "title", "option"];

/// Attributes whose values read as prose and are worth translating.
const TRANSLATABLE_ATTRS: [&str; 3] = ["placeholder", "aria-label", "title"];

/// Applies the translation overlay to rendered trees and prefetches
/// translations for languages the visitor may switch to.
pub struct Translator {
    cache: Arc<TranslationCache>,
    client: Option<TranslationClient>,
    preloads: Arc<Mutex<HashMap<&'static str, Shared<BoxFuture<'static, ()>>>>>,
}

impl Translator {
    pub fn new(cache: Arc<TranslationCache>, client: Option<TranslationClient>) -> Translator {
        Translator {
            cache,
            client,
            preloads: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run all three passes over `root` for `language`. For the fallback
    /// language the free-text pass restores captured originals instead of
    /// translating, so no network traffic happens.
    pub async fn apply_translations(&self, root: &mut Node, language: Language) {
        apply_keyed_pass(root, language);
        apply_attr_pass(root, language);

        if language.is_fallback() {
            restore_originals(root);
            return;
        }

        let mut sources = Vec::new();
        collect_free_text(root, &mut sources);
        self.fetch_missing(language, &sources).await;
        substitute_free_text(root, &self.cache, language);
    }

    /// Fetch translations for whichever of `sources` the cache is missing.
    /// Without a client this is a no-op and the tree keeps its source text.
    async fn fetch_missing(&self, language: Language, sources: &[String]) {
        let Some(client) = &self.client else {
            return;
        };
        let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
        let missing = self.cache.missing(language.code(), &refs);
        if missing.is_empty() {
            return;
        }
        let translations = client
            .request_translations(Language::fallback().code(), language.code(), &missing)
            .await;
        let stored = self.cache.insert_many(
            language.code(),
            missing
                .iter()
                .map(|s| s.to_string())
                .zip(translations.into_iter()),
        );
        debug!(
            language = language.code(),
            requested = missing.len(),
            stored,
            "fetched missing translations"
        );
    }

    /// Warm the cache for `language` using the free text currently in `root`.
    /// Calls for a language with a fetch already in flight share that fetch
    /// instead of starting another.
    pub fn preload(&self, language: Language, root: &mut Node) -> Shared<BoxFuture<'static, ()>> {
        if language.is_fallback() || self.client.is_none() {
            return futures::future::ready(()).boxed().shared();
        }

        let mut preloads = self
            .preloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(in_flight) = preloads.get(language.code()) {
            return in_flight.clone();
        }

        let mut sources = Vec::new();
        collect_free_text(root, &mut sources);
        let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
        let missing: Vec<String> = self
            .cache
            .missing(language.code(), &refs)
            .into_iter()
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            return futures::future::ready(()).boxed().shared();
        }

        let cache = Arc::clone(&self.cache);
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return futures::future::ready(()).boxed().shared(),
        };
        let registry = Arc::clone(&self.preloads);
        let code = language.code();
        let fetch = async move {
            let refs: Vec<&str> = missing.iter().map(String::as_str).collect();
            let translations = client
                .request_translations(Language::fallback().code(), code, &refs)
                .await;
            let stored = cache.insert_many(
                code,
                missing.iter().cloned().zip(translations.into_iter()),
            );
            if stored < refs.len() {
                warn!(
                    language = code,
                    requested = refs.len(),
                    stored,
                    "preload completed with failures"
                );
            }
            registry
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(code);
        }
        .boxed()
        .shared();
        preloads.insert(code, fetch.clone());
        fetch
    }
}

/// Replace the content of every `data-i18n-key` element with resolved copy.
/// Unresolvable keys leave the element untouched.
fn apply_keyed_pass(node: &mut Node, language: Language) {
    let Node::Element(element) = node else {
        return;
    };
    if let Some(key) = element.attr("data-i18n-key").map(str::to_string) {
        if let Some(value) = resolve_translation(&key, language) {
            let params = parse_params(element);
            let formatted = format_translation(&value, &params);
            element.children = match element.attr("data-i18n-format") {
                Some("html") => vec![Node::raw(formatted)],
                _ => vec![crate::view::text(formatted)],
            };
        }
    }
    for child in &mut element.children {
        apply_keyed_pass(child, language);
    }
}

/// Apply `data-i18n-attr` directives of the form `"attr:key,attr:key"`.
fn apply_attr_pass(node: &mut Node, language: Language) {
    let Node::Element(element) = node else {
        return;
    };
    if let Some(directives) = element.attr("data-i18n-attr").map(str::to_string) {
        for directive in directives.split(',') {
            let Some((attr, key)) = directive.trim().split_once(':') else {
                continue;
            };
            if let Some(value) = resolve_translation(key.trim(), language) {
                element.set_attr(attr.trim(), value);
            }
        }
    }
    for child in &mut element.children {
        apply_attr_pass(child, language);
    }
}

fn parse_params(element: &Element) -> HashMap<String, String> {
    let Some(raw) = element.attr("data-i18n-params") else {
        return HashMap::new();
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(name, value)| {
                let rendered = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, rendered)
            })
            .collect(),
        _ => {
            debug!(raw, "ignoring malformed data-i18n-params");
            HashMap::new()
        }
    }
}

fn skip_subtree(element: &Element) -> bool {
    SKIP_TAGS.contains(&element.tag.to_ascii_lowercase().as_str())
        || element.has_attr("data-i18n-ignore")
        || element.has_attr("data-i18n-key")
}

/// Attributes owned by the keyed `data-i18n-attr` pass; the free-text pass
/// leaves them alone.
fn keyed_attr(element: &Element, attr: &str) -> bool {
    element
        .attr("data-i18n-attr")
        .map(|directives| {
            directives.split(',').any(|directive| {
                directive
                    .trim()
                    .split_once(':')
                    .is_some_and(|(name, _)| name.trim() == attr)
            })
        })
        .unwrap_or(false)
}

/// Prose detector: at least one basic Latin or Latin-1 letter.
fn has_letters(value: &str) -> bool {
    value
        .chars()
        .any(|c| c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c))
}

/// Capture originals and collect the unique source strings of the free-text
/// pass, in document order.
fn collect_free_text(node: &mut Node, sources: &mut Vec<String>) {
    match node {
        Node::Text(text) => {
            if has_letters(text.text.trim()) {
                text.capture_original();
                if let Some(original) = &text.original {
                    if !sources.iter().any(|s| s == original) {
                        sources.push(original.clone());
                    }
                }
            }
        }
        Node::Element(element) => {
            if skip_subtree(element) {
                return;
            }
            for attr in TRANSLATABLE_ATTRS {
                let worth = !keyed_attr(element, attr)
                    && element
                        .attr(attr)
                        .map(|value| has_letters(value.trim()))
                        .unwrap_or(false);
                if worth {
                    element.capture_original_attr(attr);
                    if let Some(original) = element.original_attr(attr) {
                        if !sources.iter().any(|s| s == original) {
                            sources.push(original.to_string());
                        }
                    }
                }
            }
            for child in &mut element.children {
                collect_free_text(child, sources);
            }
        }
        Node::Raw { .. } => {}
    }
}

/// Replace captured originals with cached translations. Misses (including
/// failed fetches, cached as nothing) keep the source text.
fn substitute_free_text(node: &mut Node, cache: &TranslationCache, language: Language) {
    match node {
        Node::Text(text) => {
            if let Some(original) = &text.original {
                if let Some(translation) = cache.get(language.code(), original) {
                    text.text = translation;
                }
            }
        }
        Node::Element(element) => {
            if skip_subtree(element) {
                return;
            }
            for attr in TRANSLATABLE_ATTRS {
                if keyed_attr(element, attr) {
                    continue;
                }
                if let Some(original) = element.original_attr(attr).map(str::to_string) {
                    if let Some(translation) = cache.get(language.code(), &original) {
                        element.set_attr(attr, translation);
                    }
                }
            }
            for child in &mut element.children {
                substitute_free_text(child, cache, language);
            }
        }
        Node::Raw { .. } => {}
    }
}

/// Put every captured original back, verbatim. Used when switching to the
/// fallback language.
fn restore_originals(node: &mut Node) {
    match node {
        Node::Text(text) => {
            if let Some(original) = &text.original {
                text.text = original.clone();
            }
        }
        Node::Element(element) => {
            let originals: Vec<(String, String)> = element
                .original_attrs
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            for (name, value) in originals {
                element.set_attr(name, value);
            }
            for child in &mut element.children {
                restore_originals(child);
            }
        }
        Node::Raw { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{el, text};

    fn translator_with_cache(entries: &[(&str, &str, &str)]) -> Translator {
        let cache = TranslationCache::in_memory();
        for (language, source, translation) in entries {
            cache.insert_many(
                language,
                [(source.to_string(), translation.to_string())],
            );
        }
        Translator::new(cache, None)
    }

    fn first_text(node: &Node) -> &str {
        match node {
            Node::Element(element) => first_text(&element.children[0]),
            Node::Text(t) => &t.text,
            Node::Raw { html } => html,
        }
    }

    #[tokio::test]
    async fn keyed_pass_replaces_content_from_site_copy() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("h1").attr("data-i18n-key", "home.title").text("x").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        assert_eq!(first_text(&tree), "Invest straight from your payroll");
    }

    #[tokio::test]
    async fn keyed_pass_formats_params() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("span")
            .attr("data-i18n-key", "footer.year")
            .attr("data-i18n-params", r#"{"year": 2026}"#)
            .text("x")
            .build();
        translator
            .apply_translations(&mut tree, Language::SPANISH)
            .await;
        assert_eq!(first_text(&tree), "© 2026 Avuntia");
    }

    #[tokio::test]
    async fn keyed_pass_html_format_inserts_raw_markup() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("div")
            .attr("data-i18n-key", "home.cta")
            .attr("data-i18n-format", "html")
            .build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        let Node::Element(element) = &tree else {
            panic!("expected element");
        };
        assert!(matches!(&element.children[0], Node::Raw { html } if html == "Start now"));
    }

    #[tokio::test]
    async fn unresolvable_key_leaves_element_untouched() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("h1").attr("data-i18n-key", "ghost.key").text("Hola").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        assert_eq!(first_text(&tree), "Hola");
    }

    #[tokio::test]
    async fn attr_pass_translates_listed_attributes() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("input")
            .attr("placeholder", "x")
            .attr("title", "y")
            .attr(
                "data-i18n-attr",
                "placeholder:empleado.searchPlaceholder, title:common.login",
            )
            .build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        let Node::Element(element) = &tree else {
            panic!("expected element");
        };
        assert_eq!(element.attr("placeholder"), Some("Search for a plan"));
        assert_eq!(element.attr("title"), Some("Log in"));
    }

    #[tokio::test]
    async fn free_text_uses_cached_translations() {
        let translator = translator_with_cache(&[("en", "Hola mundo", "Hello world")]);
        let mut tree = el("p").text("Hola mundo").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        assert_eq!(first_text(&tree), "Hello world");
    }

    #[tokio::test]
    async fn free_text_misses_keep_source_text_without_client() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("p").text("Hola mundo").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        assert_eq!(first_text(&tree), "Hola mundo");
    }

    #[tokio::test]
    async fn fallback_restores_originals_after_translation() {
        let translator = translator_with_cache(&[("en", "Hola mundo", "Hello world")]);
        let mut tree = el("p").text("Hola mundo").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        assert_eq!(first_text(&tree), "Hello world");

        translator
            .apply_translations(&mut tree, Language::SPANISH)
            .await;
        assert_eq!(first_text(&tree), "Hola mundo");
    }

    #[tokio::test]
    async fn originals_stay_stable_across_language_switches() {
        let translator = translator_with_cache(&[
            ("en", "Hola mundo", "Hello world"),
            ("ca", "Hola mundo", "Hola món"),
        ]);
        let mut tree = el("p").text("Hola mundo").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        translator
            .apply_translations(&mut tree, Language::CATALAN)
            .await;
        assert_eq!(first_text(&tree), "Hola món");
    }

    #[tokio::test]
    async fn ignore_scopes_and_code_tags_are_skipped() {
        let translator = translator_with_cache(&[("en", "Hola", "Hello")]);
        let mut tree = el("div")
            .child(el("code").text("Hola"))
            .child(el("p").attr("data-i18n-ignore", "").text("Hola"))
            .child(el("p").text("Hola"))
            .build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        let Node::Element(root) = &tree else {
            panic!("expected element");
        };
        assert_eq!(first_text(&root.children[0]), "Hola");
        assert_eq!(first_text(&root.children[1]), "Hola");
        assert_eq!(first_text(&root.children[2]), "Hello");
    }

    #[tokio::test]
    async fn keyed_scopes_are_not_free_text_translated() {
        let translator = translator_with_cache(&[("en", "Inicio", "WRONG")]);
        let mut tree = el("a").attr("data-i18n-key", "nav.home").text("Inicio").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        assert_eq!(first_text(&tree), "Home");
    }

    #[tokio::test]
    async fn numeric_only_text_is_not_collected() {
        let mut tree = el("td").text("1.234,56 €").build();
        let mut sources = Vec::new();
        collect_free_text(&mut tree, &mut sources);
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn translatable_attributes_are_collected_and_substituted() {
        let translator = translator_with_cache(&[("en", "Tu nombre", "Your name")]);
        let mut tree = el("input").attr("placeholder", "Tu nombre").build();
        translator
            .apply_translations(&mut tree, Language::ENGLISH)
            .await;
        let Node::Element(element) = &tree else {
            panic!("expected element");
        };
        assert_eq!(element.attr("placeholder"), Some("Your name"));
        assert_eq!(element.original_attr("placeholder"), Some("Tu nombre"));
    }

    #[tokio::test]
    async fn preload_is_single_flight_per_language() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"translation": "Hello"}))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = TranslationCache::in_memory();
        let client = TranslationClient::new(&server.uri()).unwrap();
        let translator = Translator::new(cache.clone(), Some(client));

        let mut tree = el("p").text("Hola").build();
        let first = translator.preload(Language::ENGLISH, &mut tree);
        let second = translator.preload(Language::ENGLISH, &mut tree);
        futures::future::join(first, second).await;
        assert_eq!(cache.get("en", "Hola").as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn preload_for_fallback_is_a_no_op() {
        let translator = translator_with_cache(&[]);
        let mut tree = el("p").text("Hola").build();
        translator.preload(Language::SPANISH, &mut tree).await;
    }
}
