//! Application wiring: store, router, translator and event bus assembled
//! into one object that drives navigation and language switches.

use crate::config::Config;
use crate::error::RouterError;
use crate::events::EventBus;
use crate::i18n::{Language, TranslationCache, TranslationClient, Translator};
use crate::router::Router;
use crate::state::Store;
use crate::storage::{FileStorage, MemoryStorage, Storage};
use crate::view::{Mount, Node};
use crate::views;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Modifier state of a link click, as reported by the host shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickModifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    pub default_prevented: bool,
}

impl ClickModifiers {
    fn any(&self) -> bool {
        self.ctrl || self.meta || self.shift || self.alt
    }
}

pub struct App {
    router: Router,
    store: Arc<Store>,
    translator: Translator,
    bus: Arc<EventBus>,
    translation_depth: usize,
}

impl App {
    /// Assemble every subsystem and run the initial navigation. Entry paths
    /// `/` and `/index.html` land on `/home` without leaving an extra
    /// history entry.
    pub async fn bootstrap(config: &Config, entry_path: &str) -> Result<App> {
        let bus = Arc::new(EventBus::new());
        let storage: Arc<dyn Storage> = Arc::new(
            FileStorage::new(&config.storage_dir)
                .with_context(|| format!("opening storage at {}", config.storage_dir.display()))?,
        );
        // Per-tab sessions never outlive the process.
        let session_storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = Store::init(Arc::clone(&storage), session_storage, Arc::clone(&bus));

        let cache = TranslationCache::with_flush_delay(storage, config.cache_flush_delay);
        let client = match &config.translation_endpoint {
            Some(endpoint) => Some(
                TranslationClient::new(endpoint)
                    .context("building translation client")?,
            ),
            None => {
                info!("no translation endpoint configured, auto-translation disabled");
                None
            }
        };
        let translator = Translator::new(cache, client);

        let mut router = Router::new(Arc::clone(&bus));
        router.set_base_path(&config.base_path);
        router.set_root(Mount::new());
        views::register_all_routes(&mut router, &store)?;

        let mut app = App {
            router,
            store,
            translator,
            bus,
            translation_depth: 0,
        };

        let target = match entry_path {
            "" | "/" | "/index.html" => "/home",
            other => other,
        };
        app.router.navigate(target, true)?;
        app.after_render().await;
        Ok(app)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Navigate to `path` and translate the freshly mounted view.
    pub async fn navigate(&mut self, path: &str) -> Result<(), RouterError> {
        self.router.navigate(path, false)?;
        self.after_render().await;
        Ok(())
    }

    /// A link click from the host shell. Returns `true` when routing handled
    /// it; modifier clicks, prevented clicks and external URLs fall through.
    pub async fn handle_link_click(
        &mut self,
        href: &str,
        modifiers: ClickModifiers,
    ) -> Result<bool, RouterError> {
        if modifiers.default_prevented || modifiers.any() {
            return Ok(false);
        }
        if href.contains("://") || href.starts_with("mailto:") || href.starts_with("tel:") {
            return Ok(false);
        }
        self.navigate(href).await?;
        Ok(true)
    }

    /// History moved one entry back, as on a browser popstate. Re-renders the
    /// restored entry without pushing anything.
    pub async fn handle_back(&mut self) -> Result<(), RouterError> {
        let restored = match self.router.history_mut().back() {
            Some(path) => path.to_string(),
            None => return Ok(()),
        };
        self.router.render(&restored)?;
        self.after_render().await;
        Ok(())
    }

    /// Counterpart of [`App::handle_back`] for forward navigation.
    pub async fn handle_forward(&mut self) -> Result<(), RouterError> {
        let restored = match self.router.history_mut().forward() {
            Some(path) => path.to_string(),
            None => return Ok(()),
        };
        self.router.render(&restored)?;
        self.after_render().await;
        Ok(())
    }

    /// Switch the interface language: persist the choice, re-render the
    /// current view, translate it and warm the cache for the languages the
    /// visitor has not picked yet.
    pub async fn set_language(&mut self, code: &str) -> Result<()> {
        let previous = self.store.language();
        let applied = self.store.set_language(code);
        if applied == previous {
            return Ok(());
        }
        let current = self.router.current_path().to_string();
        self.router.render(&current)?;
        self.after_render().await;
        self.preload_remaining_languages();
        Ok(())
    }

    /// Translate the mounted tree and refresh nav highlighting. The depth
    /// counter keeps the `translating` flag stable across nested calls.
    async fn after_render(&mut self) {
        let language = Language::resolve(&self.store.language());
        let current = self.router.current_path().to_string();
        let detached = self
            .router
            .mount_mut()
            .and_then(Mount::tree_mut)
            .map(|tree| std::mem::replace(tree, crate::view::text("")));
        let Some(mut tree) = detached else {
            return;
        };
        self.begin_translation();
        self.translator.apply_translations(&mut tree, language).await;
        self.end_translation();
        highlight_active_nav(&mut tree, &current);
        if let Some(slot) = self.router.mount_mut().and_then(Mount::tree_mut) {
            *slot = tree;
        }
    }

    /// Kick off background cache warming for every language other than the
    /// active one. Fire and forget; failures only cost a later fetch.
    pub fn preload_remaining_languages(&mut self) {
        let active = Language::resolve(&self.store.language());
        let preloads: Vec<_> = Language::all()
            .into_iter()
            .filter(|language| *language != active && !language.is_fallback())
            .filter_map(|language| {
                let tree = self.router.mount_mut().and_then(Mount::tree_mut)?;
                Some(self.translator.preload(language, tree))
            })
            .collect();
        for preload in preloads {
            tokio::spawn(preload);
        }
    }

    fn begin_translation(&mut self) {
        self.translation_depth += 1;
        if self.translation_depth == 1 {
            if let Some(mount) = self.router.mount_mut() {
                mount.set_translating(true);
            }
        }
    }

    fn end_translation(&mut self) {
        if self.translation_depth == 0 {
            warn!("translation depth underflow ignored");
            return;
        }
        self.translation_depth -= 1;
        if self.translation_depth == 0 {
            if let Some(mount) = self.router.mount_mut() {
                mount.set_translating(false);
            }
        }
    }
}

/// Whether a nav link pointing at `href` should be highlighted for
/// `current`. Prefix-aware; `/` and `/home` both count as the root link.
pub fn nav_link_is_active(href: &str, current: &str) -> bool {
    let root_link = href == "/" || href == "/home";
    let at_root = current == "/" || current == "/home";
    if root_link {
        return at_root;
    }
    current == href || current.starts_with(&format!("{href}/"))
}

/// Toggle the `active` class on every anchor in the tree according to the
/// current path.
fn highlight_active_nav(node: &mut Node, current: &str) {
    let Node::Element(element) = node else {
        return;
    };
    if element.tag == "a" {
        if let Some(href) = element.attr("href").map(str::to_string) {
            let classes = element.attr("class").unwrap_or_default();
            let mut classes: Vec<&str> =
                classes.split_whitespace().filter(|c| *c != "active").collect();
            if nav_link_is_active(&href, current) {
                classes.push("active");
            }
            let joined = classes.join(" ");
            if joined.is_empty() {
                element.attrs.remove("class");
            } else {
                element.set_attr("class", joined);
            }
        }
    }
    for child in &mut element.children {
        highlight_active_nav(child, current);
    }
}
