//! Path router: resolves logical paths to view handlers and drives the
//! render lifecycle.
//!
//! The router is an explicitly constructed instance. The route table is
//! populated once at startup and immutable afterwards; exact-match entries
//! always win over pattern entries, and pattern entries are tried in
//! registration order. Handlers receive a [`RouteContext`] and return a
//! [`Node`] tree that is swapped into the mount.

use crate::error::RouterError;
use crate::events::{AppEvent, EventBus};
use crate::view::{Mount, Node};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    pub params: HashMap<String, String>,
    pub pathname: String,
}

pub type Handler = Box<dyn Fn(&RouteContext) -> Node + Send + Sync>;

struct RouteEntry {
    path: String,
    handler: Handler,
}

/// In-process stand-in for the browser history stack: a list of physical
/// paths plus a cursor. `push` drops any forward entries, `replace` swaps
/// the current one, `back`/`forward` move the cursor.
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn push(&mut self, path: String) {
        self.entries.truncate(self.index + 1);
        self.entries.push(path);
        self.index = self.entries.len() - 1;
    }

    pub fn replace(&mut self, path: String) {
        self.entries[self.index] = path;
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Router {
    routes: Vec<RouteEntry>,
    exact: HashMap<String, usize>,
    not_found: Option<Handler>,
    current_path: String,
    base_path: String,
    history: History,
    mount: Option<Mount>,
    bus: Arc<EventBus>,
}

impl Router {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            routes: Vec::new(),
            exact: HashMap::new(),
            not_found: None,
            current_path: "/".into(),
            base_path: String::new(),
            history: History::new("/"),
            mount: None,
            bus,
        }
    }

    /// Declare the single mount rendered views are inserted into. Must be
    /// called before the first render.
    pub fn set_root(&mut self, mount: Mount) {
        self.mount = Some(mount);
    }

    pub fn mount(&self) -> Option<&Mount> {
        self.mount.as_ref()
    }

    pub fn mount_mut(&mut self) -> Option<&mut Mount> {
        self.mount.as_mut()
    }

    pub fn register_route(
        &mut self,
        path: impl Into<String>,
        handler: impl Fn(&RouteContext) -> Node + Send + Sync + 'static,
    ) -> Result<(), RouterError> {
        let path = path.into();
        if self.exact.contains_key(&path) {
            return Err(RouterError::DuplicateRoute { path });
        }
        self.exact.insert(path.clone(), self.routes.len());
        self.routes.push(RouteEntry {
            path,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn register_routes(
        &mut self,
        routes: Vec<(String, Handler)>,
    ) -> Result<(), RouterError> {
        for (path, handler) in routes {
            if self.exact.contains_key(&path) {
                return Err(RouterError::DuplicateRoute { path });
            }
            self.exact.insert(path.clone(), self.routes.len());
            self.routes.push(RouteEntry { path, handler });
        }
        Ok(())
    }

    pub fn register_not_found(
        &mut self,
        handler: impl Fn(&RouteContext) -> Node + Send + Sync + 'static,
    ) {
        self.not_found = Some(Box::new(handler));
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Deployment prefix. Stored without a trailing slash; `/` means none.
    pub fn set_base_path(&mut self, path: &str) {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            self.base_path = String::new();
        } else if trimmed.starts_with('/') {
            self.base_path = trimmed.to_string();
        } else {
            self.base_path = format!("/{trimmed}");
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Deterministic, idempotent path normalization: resolve to an absolute
    /// pathname, strip a literal `/index.html` suffix, strip trailing
    /// slashes, strip the base-path prefix, collapse to `/`.
    pub fn normalize_pathname(&self, path: &str) -> String {
        if path.is_empty() {
            return "/".into();
        }
        let mut normalized = path.to_string();
        if let Some(stripped) = normalized.strip_suffix("/index.html") {
            normalized = stripped.to_string();
        }
        normalized = normalized.trim_end_matches('/').to_string();
        if !self.base_path.is_empty() {
            if let Some(stripped) = normalized.strip_prefix(&self.base_path) {
                normalized = stripped.to_string();
            }
        }
        if normalized.is_empty() || normalized == "/" {
            return "/".into();
        }
        if normalized.starts_with('/') {
            normalized
        } else {
            format!("/{normalized}")
        }
    }

    /// Physical path shown in the address bar: the logical path mounted
    /// under the base-path prefix.
    pub fn to_physical(&self, logical: &str) -> String {
        if self.base_path.is_empty() {
            return logical.to_string();
        }
        if logical == "/" {
            self.base_path.clone()
        } else {
            format!("{}{logical}", self.base_path)
        }
    }

    /// Navigate to `path`. A navigation to the already-current path re-runs
    /// the render without touching history (refresh-current-view semantics);
    /// otherwise the physical path is pushed (or replaced) first.
    pub fn navigate(&mut self, path: &str, replace: bool) -> Result<(), RouterError> {
        let target = self.normalize_pathname(path);
        if target == self.current_path {
            return self.render(&target);
        }
        let physical = self.to_physical(&target);
        if replace {
            self.history.replace(physical);
        } else {
            self.history.push(physical);
        }
        self.render(&target)
    }

    /// Resolve `path`, invoke its handler and swap the result into the
    /// mount, then restore focus and publish the navigation event. Published
    /// strictly after the mount swap, so listeners always observe a
    /// consistent tree.
    pub fn render(&mut self, path: &str) -> Result<(), RouterError> {
        if self.mount.is_none() {
            return Err(RouterError::RootNotSet);
        }
        let normalized = self.normalize_pathname(path);
        self.current_path = normalized.clone();

        let tree = match self.match_route(&normalized) {
            Some((handler_idx, params)) => {
                let context = RouteContext {
                    params,
                    pathname: normalized.clone(),
                };
                (self.routes[handler_idx].handler)(&context)
            }
            None => {
                let Some(not_found) = &self.not_found else {
                    return Err(RouterError::NotFoundUnregistered { path: normalized });
                };
                let context = RouteContext {
                    params: HashMap::new(),
                    pathname: normalized.clone(),
                };
                not_found(&context)
            }
        };

        let mount = self.mount.as_mut().expect("checked above");
        mount.set_content(tree);
        mount.focus();
        self.bus.publish(AppEvent::NavigationCompleted {
            pathname: normalized,
        });
        Ok(())
    }

    fn match_route(&self, pathname: &str) -> Option<(usize, HashMap<String, String>)> {
        if let Some(&idx) = self.exact.get(pathname) {
            return Some((idx, HashMap::new()));
        }
        for (idx, entry) in self.routes.iter().enumerate() {
            if !entry.path.contains(':') {
                continue;
            }
            let (regex, keys) = compile_path(&entry.path);
            if let Some(captures) = regex.captures(pathname) {
                let mut params = HashMap::new();
                for (key, capture) in keys.iter().zip(captures.iter().skip(1)) {
                    let raw = capture.map(|m| m.as_str()).unwrap_or_default();
                    params.insert(key.clone(), decode_segment(raw));
                }
                return Some((idx, params));
            }
        }
        None
    }
}

/// Compile a `:name` pattern: parameter segments become one-segment
/// capturing groups, literal segments are regex-escaped.
fn compile_path(path: &str) -> (Regex, Vec<String>) {
    let mut keys = Vec::new();
    let pattern: Vec<String> = path
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                keys.push(name.to_string());
                "([^/]+)".to_string()
            } else {
                regex::escape(segment)
            }
        })
        .collect();
    let regex = Regex::new(&format!("^{}$", pattern.join("/")))
        .expect("escaped route pattern is always a valid regex");
    (regex, keys)
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::text;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn router() -> Router {
        let mut router = Router::new(Arc::new(EventBus::new()));
        router.set_root(Mount::new());
        router
    }

    fn stub(label: &'static str) -> impl Fn(&RouteContext) -> Node + Send + Sync {
        move |_| text(label)
    }

    #[test]
    fn normalization_cases() {
        let router = router();
        assert_eq!(router.normalize_pathname("/home/"), "/home");
        assert_eq!(router.normalize_pathname("/home/index.html"), "/home");
        assert_eq!(router.normalize_pathname("/home"), "/home");
        assert_eq!(router.normalize_pathname(""), "/");
        assert_eq!(router.normalize_pathname("/"), "/");
        assert_eq!(router.normalize_pathname("home"), "/home");
        assert_eq!(router.normalize_pathname("/index.html"), "/");
        assert_eq!(router.normalize_pathname("/a/b///"), "/a/b");
    }

    #[test]
    fn normalization_is_idempotent() {
        let router = router();
        for input in ["/home/", "/home/index.html", "", "/a/b///", "x/y", "/app"] {
            let once = router.normalize_pathname(input);
            let twice = router.normalize_pathname(&once);
            assert_eq!(once, twice, "input {input:?}");
        }
    }

    #[test]
    fn normalization_strips_base_path() {
        let mut router = router();
        router.set_base_path("/pilot/");
        assert_eq!(router.base_path(), "/pilot");
        assert_eq!(router.normalize_pathname("/pilot/home"), "/home");
        assert_eq!(router.normalize_pathname("/pilot"), "/");
        assert_eq!(router.normalize_pathname("/home"), "/home");
        assert_eq!(router.to_physical("/home"), "/pilot/home");
        assert_eq!(router.to_physical("/"), "/pilot");
    }

    #[test]
    fn exact_route_wins_over_pattern() {
        let mut router = router();
        router.register_route("/a/:id", stub("pattern")).unwrap();
        router.register_route("/a/b", stub("exact")).unwrap();

        router.render("/a/b").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "exact");

        router.render("/a/c").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "pattern");
    }

    #[test]
    fn pattern_routes_match_in_registration_order() {
        let mut router = router();
        router.register_route("/x/:first", stub("first")).unwrap();
        router.register_route("/x/:second", stub("second")).unwrap();
        router.render("/x/anything").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "first");
    }

    #[test]
    fn params_are_extracted_and_url_decoded() {
        let mut router = router();
        router
            .register_route("/empleado/kid/:isin", |ctx| {
                text(ctx.params.get("isin").cloned().unwrap_or_default())
            })
            .unwrap();

        router.render("/empleado/kid/KIDCONSDEMO").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "KIDCONSDEMO");

        router.render("/empleado/kid/two%20words").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "two words");
    }

    #[test]
    fn param_does_not_span_segments() {
        let mut router = router();
        router.register_route("/a/:id", stub("pattern")).unwrap();
        router.register_not_found(stub("missing"));
        router.render("/a/b/c").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "missing");
    }

    #[test]
    fn duplicate_route_is_a_configuration_error() {
        let mut router = router();
        router.register_route("/home", stub("one")).unwrap();
        let err = router.register_route("/home", stub("two")).unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));
    }

    #[test]
    fn render_without_root_fails() {
        let mut router = Router::new(Arc::new(EventBus::new()));
        router.register_route("/home", stub("home")).unwrap();
        let err = router.render("/home").unwrap_err();
        assert!(matches!(err, RouterError::RootNotSet));
    }

    #[test]
    fn unmatched_route_without_fallback_is_fatal() {
        let mut router = router();
        router.register_route("/home", stub("home")).unwrap();
        let err = router.render("/nope").unwrap_err();
        assert!(matches!(err, RouterError::NotFoundUnregistered { .. }));
    }

    #[test]
    fn not_found_handler_receives_pathname() {
        let mut router = router();
        router.register_not_found(|ctx| text(format!("missing {}", ctx.pathname)));
        router.render("/ghost/").unwrap();
        assert_eq!(router.mount().unwrap().to_html(), "missing /ghost");
    }

    #[test]
    fn navigate_same_path_rerenders_without_history_entry() {
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        let mut router = router();
        router
            .register_route("/home", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                text("home")
            })
            .unwrap();

        router.navigate("/home", false).unwrap();
        router.navigate("/home", false).unwrap();

        assert_eq!(renders.load(Ordering::SeqCst), 2);
        // initial entry plus exactly one pushed entry
        assert_eq!(router.history().len(), 2);
        assert_eq!(router.history().current(), "/home");
    }

    #[test]
    fn navigate_replace_does_not_grow_history() {
        let mut router = router();
        router.register_route("/home", stub("home")).unwrap();
        router.navigate("/home", true).unwrap();
        assert_eq!(router.history().len(), 1);
        assert_eq!(router.history().current(), "/home");
    }

    #[test]
    fn history_back_and_forward_move_the_cursor() {
        let mut router = router();
        router.register_route("/home", stub("home")).unwrap();
        router.register_route("/planes", stub("planes")).unwrap();

        router.navigate("/home", false).unwrap();
        router.navigate("/planes", false).unwrap();

        let back = router.history_mut().back().map(str::to_string);
        assert_eq!(back.as_deref(), Some("/home"));
        router.render("/home").unwrap();
        assert_eq!(router.current_path(), "/home");

        let forward = router.history_mut().forward().map(str::to_string);
        assert_eq!(forward.as_deref(), Some("/planes"));
    }

    #[test]
    fn history_push_truncates_forward_entries() {
        let mut history = History::new("/");
        history.push("/a".into());
        history.push("/b".into());
        history.back();
        history.push("/c".into());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), "/c");
        assert!(history.forward().is_none());
    }

    #[test]
    fn navigation_event_fires_after_mount_swap() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(move |event| {
            if let AppEvent::NavigationCompleted { pathname } = event {
                sink.lock().unwrap().push(pathname.clone());
            }
        });

        let mut router = Router::new(bus);
        router.set_root(Mount::new());
        router.register_route("/home", stub("home")).unwrap();
        router.navigate("/home/", false).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["/home".to_string()]);
        assert!(router.mount().unwrap().is_focused());
    }

    #[test]
    fn base_path_navigation_round_trip() {
        let mut router = router();
        router.set_base_path("/pilot");
        router.register_route("/home", stub("home")).unwrap();

        // Incoming physical path from the address bar
        router.navigate("/pilot/home", false).unwrap();
        assert_eq!(router.current_path(), "/home");
        assert_eq!(router.history().current(), "/pilot/home");
    }
}
