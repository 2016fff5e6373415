//! Headless core of the avuntia payroll-investment pilot: routing, state,
//! internationalization and view rendering with no browser attached.
//!
//! Views return serializable node trees, storage is pluggable, and every
//! subsystem is wired explicitly through [`app::App`], so the whole
//! application can run and be tested in-process.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod i18n;
pub mod router;
pub mod seed;
pub mod state;
pub mod storage;
pub mod view;
pub mod views;

pub use app::{App, ClickModifiers};
pub use config::Config;
pub use error::RouterError;
pub use events::{AppEvent, EventBus};
pub use router::{RouteContext, Router};
pub use state::Store;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use view::{el, text, Mount, Node};
