//! Internal OAuth console: partner-company pipeline for the pilot team.
//!
//! The console is gated on the admin session. Logged out it renders the
//! passcode prompt; logged in it shows pipeline metrics, the registration
//! form and the company list, newest first.

use crate::router::{Handler, RouteContext};
use crate::state::{AdminCompany, Store};
use crate::view::{el, Node};
use std::sync::Arc;

pub fn routes(store: &Arc<Store>) -> Vec<(String, Handler)> {
    let store = Arc::clone(store);
    vec![(
        "/oauth".to_string(),
        Box::new(move |_ctx: &RouteContext| console(&store)) as Handler,
    )]
}

/// Pipeline totals derived from the registered companies. All zeros when the
/// pipeline is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineMetrics {
    pub total_companies: usize,
    pub total_headcount: u32,
    pub projected_monthly: f64,
    pub avg_adoption: f64,
}

pub fn pipeline_metrics(companies: &[AdminCompany]) -> PipelineMetrics {
    let total_companies = companies.len();
    let avg_adoption = if total_companies == 0 {
        0.0
    } else {
        (companies.iter().map(|c| c.adoption).sum::<f64>() / total_companies as f64).round()
    };
    PipelineMetrics {
        total_companies,
        total_headcount: companies.iter().map(|c| c.headcount).sum(),
        projected_monthly: companies.iter().map(|c| c.monthly_contribution).sum(),
        avg_adoption,
    }
}

fn console(store: &Arc<Store>) -> Node {
    let session = store.admin_session();
    if !session.is_logged {
        return login();
    }
    let companies = store.admin_companies();
    let metrics = pipeline_metrics(&companies);

    let mut list = el("ul").attr("class", "pipeline").attr("data-i18n-ignore", "");
    for company in &companies {
        list = list.child(
            el("li")
                .attr("data-company-id", &company.id)
                .text(format!(
                    "{} · {} · {} empleados · {:.0}% · {:.2} €/mes · {}",
                    company.name,
                    company.sector,
                    company.headcount,
                    company.adoption,
                    company.monthly_contribution,
                    company.stage
                )),
        );
    }

    el("div")
        .child(
            el("section").attr("class", "card").child(
                el("h1")
                    .attr("data-i18n-key", "oauth.title")
                    .text("Consola OAuth"),
            ),
        )
        .child(
            el("section")
                .attr("class", "card")
                .attr("data-i18n-ignore", "")
                .child(el("p").text(format!(
                    "{} empresas · {} empleados · {:.2} €/mes proyectados · adopción media {:.0}%",
                    metrics.total_companies,
                    metrics.total_headcount,
                    metrics.projected_monthly,
                    metrics.avg_adoption
                )))
                .child(list),
        )
        .build()
}

fn login() -> Node {
    el("section")
        .attr("class", "card")
        .child(el("h1").text("Iniciar sesión en la consola OAuth"))
        .child(el("p").text(
            "Introduce la contraseña compartida del piloto para desbloquear la gestión de compañías conectadas.",
        ))
        .child(
            el("form")
                .attr("id", "oauth-login-form")
                .child(
                    el("input")
                        .attr("id", "oauth-pass")
                        .attr("type", "password")
                        .attr("placeholder", "••••••••"),
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
