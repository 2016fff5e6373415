//! System pages: the 404 fallback and the maintenance window notice.

use crate::view::{el, Node};

pub fn not_found(pathname: &str) -> Node {
    el("section")
        .attr("class", "card")
        .child(
            el("h1")
                .attr("data-i18n-key", "system.notFoundTitle")
                .text("404 · Página no encontrada"),
        )
        .child(
            el("p")
                .attr("data-i18n-key", "system.notFoundBody")
                .attr(
                    "data-i18n-params",
                    serde_json::json!({ "path": pathname }).to_string(),
                )
                .text(format!("No existe contenido en {pathname}.")),
        )
        .build()
}

pub fn maintenance() -> Node {
    el("section")
        .attr("class", "card")
        .child(
            el("h1")
                .attr("data-i18n-key", "system.maintenanceTitle")
                .text("Ventana de mantenimiento"),
        )
        .child(el("p").text(
            "La plataforma está en una ventana de mantenimiento planificada. Vuelve a intentarlo más tarde.",
        ))
        .build()
}
