use std::sync::Mutex;

/// In-process application events. These are the only coupling between the
/// router/state core and the bootstrap layer: the router publishes
/// `NavigationCompleted` strictly after the new view is mounted, and the
/// store publishes `LanguageChanged` after the new language is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    NavigationCompleted { pathname: String },
    LanguageChanged { language: String },
}

type Subscriber = Box<dyn Fn(&AppEvent) + Send + Sync>;

/// Synchronous publish/subscribe seam.
///
/// Subscribers run inline on publish, in registration order, which preserves
/// the emit-after-mount ordering guarantee: by the time a subscriber observes
/// a navigation event the mounted tree is already consistent.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: impl Fn(&AppEvent) + Send + Sync + 'static) {
        self.subscribers.lock().unwrap().push(Box::new(subscriber));
    }

    pub fn publish(&self, event: AppEvent) {
        let subscribers = self.subscribers.lock().unwrap();
        for subscriber in subscribers.iter() {
            subscriber(&event);
        }
    }
}
