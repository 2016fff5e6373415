//! Route handlers grouped by surface: public marketing pages, the company
//! portal, the employee portal, the demo OAuth console and system pages.
//!
//! Each surface exposes a `routes(store)` table; `register_all_routes` merges
//! them into a router and wires the not-found fallback. Handlers return node
//! trees annotated with `data-i18n-*` markers for the translation overlay.

pub mod empleado;
pub mod empresa;
pub mod oauth;
pub mod public;
pub mod system;

use crate::error::RouterError;
use crate::router::Router;
use crate::state::Store;
use std::sync::Arc;

/// Register every surface's routes plus the maintenance page and the 404
/// fallback. Errors on a duplicate path across surfaces.
pub fn register_all_routes(router: &mut Router, store: &Arc<Store>) -> Result<(), RouterError> {
    router.register_routes(public::routes(store))?;
    router.register_routes(empresa::routes(store))?;
    router.register_routes(empleado::routes(store))?;
    router.register_routes(oauth::routes(store))?;
    router.register_route("/maintenance", |_ctx| system::maintenance())?;
    router.register_not_found(|ctx| system::not_found(&ctx.pathname));
    Ok(())
}
