//! Employee portal: plan overview, contribution management, documents.

use crate::router::Handler;
use crate::state::Store;
use crate::view::{el, ElementBuilder, Node};
use std::sync::Arc;

pub fn routes(store: &Arc<Store>) -> Vec<(String, Handler)> {
    let mut table: Vec<(String, Handler)> = Vec::new();
    {
        let store = Arc::clone(store);
        table.push(("/empleado".to_string(), Box::new(move |_ctx| home(&store))));
    }
    table.push(("/empleado/acceso".to_string(), Box::new(|_ctx| access())));
    {
        let store = Arc::clone(store);
        table.push((
            "/empleado/kid/:isin".to_string(),
            Box::new(move |ctx| {
                let isin = ctx.params.get("isin").map(String::as_str).unwrap_or_default();
                kid_viewer(&store, isin)
            }),
        ));
    }
    {
        let store = Arc::clone(store);
        table.push((
            "/empleado/aportacion".to_string(),
            Box::new(move |_ctx| contribution(&store)),
        ));
    }
    {
        let store = Arc::clone(store);
        table.push((
            "/empleado/historial".to_string(),
            Box::new(move |_ctx| history(&store)),
        ));
    }
    {
        let store = Arc::clone(store);
        table.push((
            "/empleado/documentos".to_string(),
            Box::new(move |_ctx| documents(&store)),
        ));
    }
    {
        let store = Arc::clone(store);
        table.push((
            "/empleado/perfil".to_string(),
            Box::new(move |_ctx| profile(&store)),
        ));
    }
    table
}

fn home(store: &Arc<Store>) -> Node {
    let portal = store.employee_portal();
    let total: f64 = portal.contributions.values().sum();
    card("Tu plan")
        .child(el("p").attr("data-i18n-ignore", "").text(format!(
            "Aportación mensual total: {total:.2} €"
        )))
        .child(el("p").text(if portal.paused {
            "Tus aportaciones están en pausa."
        } else {
            "Tus aportaciones están activas."
        }))
        .build()
}

fn access() -> Node {
    card("Acceso empleados")
        .child(
            el("form")
                .attr("id", "employee-access-form")
                .child(
                    el("input")
                        .attr("name", "email")
                        .attr("type", "email")
                        .attr("placeholder", "tu@empresa.com"),
                )
                .child(
                    el("button")
                        .attr("type", "submit")
                        .attr("data-i18n-key", "common.login")
                        .text("Acceder"),
                ),
        )
        .build()
}

fn kid_viewer(store: &Arc<Store>, isin: &str) -> Node {
    let plan = store.plans().into_iter().find(|p| p.isin == isin);
    match plan {
        Some(plan) => card(&plan.name)
            .child(
                el("h2")
                    .attr("data-i18n-key", "empleado.kidTitle")
                    .text("Documento de datos fundamentales"),
            )
            .child(
                el("dl")
                    .attr("data-i18n-ignore", "")
                    .child(el("dt").text("ISIN"))
                    .child(el("dd").text(&plan.isin))
                    .child(el("dt").text("SRRI"))
                    .child(el("dd").text(plan.srri.to_string()))
                    .child(el("dt").text("TER"))
                    .child(el("dd").text(format!("{:.2}%", plan.ter * 100.0))),
            )
            .build(),
        None => card("Documento no disponible")
            .child(el("p").text(format!("No hay ningún plan con ISIN {isin}.")))
            .build(),
    }
}

fn contribution(store: &Arc<Store>) -> Node {
    let portal = store.employee_portal();
    let mut list = el("ul").attr("data-i18n-ignore", "");
    for (plan_id, amount) in &portal.contributions {
        list = list.child(el("li").text(format!("{plan_id}: {amount:.2} €/mes")));
    }
    card("Tu aportación")
        .child(list)
        .child(
            el("input")
                .attr("type", "search")
                .attr("placeholder", "Busca un plan")
                .attr("data-i18n-attr", "placeholder:empleado.searchPlaceholder"),
        )
        .build()
}

fn history(store: &Arc<Store>) -> Node {
    let portal = store.employee_portal();
    let mut rows = el("tbody").attr("data-i18n-ignore", "");
    for movement in store
        .movements()
        .into_iter()
        .filter(|m| m.employee_id == portal.employee_id)
    {
        rows = rows.child(
            el("tr")
                .child(el("td").text(&movement.date))
                .child(el("td").text(format!("{:.2} €", movement.amount)))
                .child(el("td").text(&movement.plan_id))
                .child(el("td").text(&movement.status)),
        );
    }
    card("Historial")
        .child(el("table").attr("class", "movements").child(rows))
        .build()
}

fn documents(store: &Arc<Store>) -> Node {
    let portal = store.employee_portal();
    let mut list = el("ul").attr("data-i18n-ignore", "");
    for (name, status) in &portal.documents {
        list = list.child(el("li").text(format!("{name}: {status}")));
    }
    card("Documentos").child(list).build()
}

fn profile(store: &Arc<Store>) -> Node {
    let portal = store.employee_portal();
    card("Perfil")
        .child(el("p").attr("data-i18n-ignore", "").text(format!(
            "Email de contacto: {}",
            portal.contact_email
        )))
        .build()
}

fn card(title: &str) -> ElementBuilder {
    el("section")
        .attr("class", "card")
        .child(el("h1").text(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::storage::MemoryStorage;

    fn store() -> Arc<Store> {
        Store::init(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(EventBus::new()),
        )
    }

    #[test]
    fn kid_viewer_renders_known_and_unknown_isins() {
        let store = store();
        let known = kid_viewer(&store, "KIDCONSDEMO").to_html();
        assert!(known.contains("ISIN"));
        assert!(known.contains("KIDCONSDEMO"));
        let unknown = kid_viewer(&store, "XX0000000000").to_html();
        assert!(unknown.contains("XX0000000000"));
    }

    #[test]
    fn history_only_shows_the_portal_employees_movements() {
        let store = store();
        let portal = store.employee_portal();
        let html = history(&store).to_html();
        let total = store.movements().len();
        let own = store
            .movements()
            .iter()
            .filter(|m| m.employee_id == portal.employee_id)
            .count();
        assert!(own > 0 && own < total);
        assert_eq!(html.matches("<tr>").count(), own);
    }

    #[test]
    fn contribution_lists_every_seeded_plan() {
        let store = store();
        let html = contribution(&store).to_html();
        for plan in store.plans() {
            assert!(html.contains(&plan.id));
        }
    }
}
