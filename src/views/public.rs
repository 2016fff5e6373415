//! Public marketing surface: home, product explainers, plans, legal pages.

use crate::router::Handler;
use crate::seed;
use crate::state::{Plan, PlanType, Store};
use crate::view::{el, text, ElementBuilder, Node};
use std::sync::Arc;

pub fn routes(store: &Arc<Store>) -> Vec<(String, Handler)> {
    let mut table: Vec<(String, Handler)> = Vec::new();
    for path in ["/", "/home"] {
        let store = Arc::clone(store);
        table.push((
            path.to_string(),
            Box::new(move |_ctx| home(&store)),
        ));
    }
    table.push(("/como-funciona".to_string(), Box::new(|_ctx| how_it_works())));
    {
        let store = Arc::clone(store);
        table.push(("/planes".to_string(), Box::new(move |_ctx| plans(&store))));
    }
    table.push(("/seguridad".to_string(), Box::new(|_ctx| security())));
    table.push(("/faq".to_string(), Box::new(|_ctx| faq())));
    table.push(("/contacto".to_string(), Box::new(|_ctx| contact())));
    for (path, title, body) in [
        ("/legal/aviso", "Aviso legal", "Contenido de demostración. Este aviso legal es un texto de relleno para el piloto."),
        ("/legal/privacidad", "Política de privacidad", "Contenido de demostración. No se recogen datos personales reales."),
        ("/legal/cookies", "Política de cookies", "Contenido de demostración. El piloto no usa cookies de seguimiento."),
        ("/legal/terminos", "Términos y condiciones", "Contenido de demostración. Condiciones de uso del entorno piloto."),
    ] {
        table.push((path.to_string(), Box::new(move |_ctx| legal(title, body))));
    }
    table
}

fn home(store: &Arc<Store>) -> Node {
    let company = store.company();
    el("section")
        .attr("class", "hero")
        .child(
            el("h1")
                .attr("data-i18n-key", "home.title")
                .text("Invierte desde tu nómina"),
        )
        .child(
            el("p")
                .attr("data-i18n-key", "home.subtitle")
                .text("Aportaciones periódicas deducidas automáticamente, sin fricción."),
        )
        .child(
            el("a")
                .attr("href", "/planes")
                .attr("class", "cta")
                .attr("data-i18n-key", "home.cta")
                .text("Empieza ahora"),
        )
        .child(
            el("p")
                .attr("class", "pilot-note")
                .text(format!("Piloto activo con {}.", company.name)),
        )
        .build()
}

fn how_it_works() -> Node {
    card("Cómo funciona")
        .child(el("ol").child(step("La empresa activa el plan y define el día de corte.")).child(step("Cada empleado elige plan e importe mensual.")).child(step("La aportación se deduce de la nómina y se invierte automáticamente.")))
        .build()
}

fn plans(store: &Arc<Store>) -> Node {
    let types = seed::plan_types();
    let mut list = el("ul").attr("class", "plan-list");
    for plan in store.plans() {
        let plan_type = types.iter().find(|t| t.id == plan.type_id);
        list = list.child(plan_row(&plan, plan_type));
    }
    card("Planes disponibles").child(list).build()
}

fn plan_row(plan: &Plan, plan_type: Option<&PlanType>) -> ElementBuilder {
    let mut row = el("li")
        .attr("class", "pill")
        .attr("data-plan-id", &plan.id)
        // Product names and identifiers stay untranslated.
        .attr("data-i18n-ignore", "")
        .child(text(format!(
            "{} · SRRI {} · TER {:.2}% · {}",
            plan.name,
            plan.srri,
            plan.ter * 100.0,
            plan.isin
        )));
    if let Some(profile) = plan_type {
        row = row.child(
            el("p")
                .attr("class", "plan-profile")
                .text(format!(
                    "{} · Riesgo {} · {}",
                    profile.name, profile.risk_level, profile.asset_mix
                )),
        );
    }
    row
}

fn security() -> Node {
    card("Seguridad")
        .child(el("p").text("Los activos están custodiados por una entidad regulada y las aportaciones viajan por circuitos SEPA estándar."))
        .build()
}

fn faq() -> Node {
    card("Preguntas frecuentes")
        .child(faq_entry(
            "¿Puedo pausar mis aportaciones?",
            "Sí, desde el portal de empleado en cualquier momento antes del día de corte.",
        ))
        .child(faq_entry(
            "¿Qué pasa si dejo la empresa?",
            "El plan es tuyo. Puedes mantenerlo con aportaciones propias o traspasarlo.",
        ))
        .build()
}

fn faq_entry(question: &str, answer: &str) -> ElementBuilder {
    el("details")
        .attr("class", "faq-entry")
        .child(el("summary").text(question))
        .child(el("p").text(answer))
}

fn contact() -> Node {
    card("Contacto")
        .child(
            el("form")
                .attr("id", "contact-form")
                .child(
                    el("input")
                        .attr("name", "email")
                        .attr("type", "email")
                        .attr("placeholder", "Tu correo electrónico"),
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

fn legal(title: &str, body: &str) -> Node {
    card(title).child(el("p").text(body)).build()
}

fn card(title: &str) -> ElementBuilder {
    el("section")
        .attr("class", "card")
        .child(el("h1").text(title))
}

fn step(label: &str) -> ElementBuilder {
    el("li").text(label)
}
