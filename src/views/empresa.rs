//! Company portal: login, dashboard, employee roster and back-office pages.

use crate::router::Handler;
use crate::state::{Employee, Store};
use crate::view::{el, ElementBuilder, Node};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn routes(store: &Arc<Store>) -> Vec<(String, Handler)> {
    let mut table: Vec<(String, Handler)> = Vec::new();
    table.push(("/login".to_string(), Box::new(|_ctx| login())));
    {
        let store = Arc::clone(store);
        table.push(("/empresa".to_string(), Box::new(move |_ctx| dashboard(&store))));
    }
    {
        let store = Arc::clone(store);
        table.push((
            "/empresa/empleados".to_string(),
            Box::new(move |_ctx| employees_list(&store)),
        ));
    }
    table.push((
        "/empresa/empleados/import".to_string(),
        Box::new(|_ctx| employees_import()),
    ));
    {
        let store = Arc::clone(store);
        table.push((
            "/empresa/empleados/:id".to_string(),
            Box::new(move |ctx| {
                let id = ctx.params.get("id").map(String::as_str).unwrap_or_default();
                employee_detail(&store, id)
            }),
        ));
    }
    for (path, title, body) in [
        ("/empresa/reglas", "Reglas de aportación", "Define topes, matching de empresa y reglas por colectivo."),
        ("/empresa/pagos/generar", "Generar remesa", "Genera el fichero de pagos SEPA de la próxima ventana."),
        ("/empresa/pagos/conciliacion", "Conciliación", "Cruza la remesa enviada con los movimientos liquidados."),
        ("/empresa/calendario", "Calendario", "Ventanas de corte y fechas de liquidación del piloto."),
        ("/empresa/informes", "Informes", "Descarga los informes mensuales de actividad."),
        ("/empresa/soporte", "Soporte", "Contacta con el equipo del piloto para incidencias."),
    ] {
        table.push((path.to_string(), Box::new(move |_ctx| back_office(title, body))));
    }
    {
        let store = Arc::clone(store);
        table.push((
            "/empresa/ajustes".to_string(),
            Box::new(move |_ctx| settings(&store)),
        ));
    }
    table
}

/// Share of active employees, as a percentage. Zero for an empty roster.
pub fn adoption_pct(employees: &[Employee]) -> f64 {
    if employees.is_empty() {
        return 0.0;
    }
    let active = employees.iter().filter(|e| e.status == "active").count();
    active as f64 / employees.len() as f64 * 100.0
}

/// Monthly contributions of active employees, grouped by plan id. Empty map
/// for an empty roster.
pub fn aggregate_by_plan(employees: &[Employee]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for employee in employees.iter().filter(|e| e.status == "active") {
        *totals.entry(employee.plan.clone()).or_insert(0.0) += employee.amount;
    }
    totals
}

fn login() -> Node {
    card("Acceso portal empresa")
        .child(el("p").text(
            "Introduce un email cualquiera para simular el acceso. No se realiza autenticación real.",
        ))
        .child(
            el("form")
                .attr("id", "login-form")
                .child(
                    el("input")
                        .attr("name", "email")
                        .attr("type", "email")
                        .attr("placeholder", "rrhh@empresa.com"),
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

fn dashboard(store: &Arc<Store>) -> Node {
    let employees = store.employees();
    let adoption = adoption_pct(&employees);
    let by_plan = aggregate_by_plan(&employees);
    let total: f64 = by_plan.values().sum();

    let mut plan_list = el("ul").attr("class", "plan-totals");
    for (plan_id, amount) in &by_plan {
        plan_list = plan_list.child(
            el("li")
                .attr("data-plan-id", plan_id)
                .text(format!("{plan_id}: {amount:.2} €/mes")),
        );
    }

    card("Panel de empresa")
        .child(
            el("div")
                .attr("class", "kpi")
                .child(
                    el("span")
                        .attr("data-i18n-key", "empresa.adoption")
                        .text("Adopción"),
                )
                .child(el("strong").attr("data-i18n-ignore", "").text(format!("{adoption:.0}%"))),
        )
        .child(
            el("div")
                .attr("class", "kpi")
                .child(el("strong").attr("data-i18n-ignore", "").text(format!("{total:.2} €/mes"))),
        )
        .child(plan_list)
        .build()
}

fn employees_list(store: &Arc<Store>) -> Node {
    let mut rows = el("tbody");
    for employee in store.employees() {
        rows = rows.child(
            el("tr")
                .attr("data-employee-id", &employee.id)
                .attr("data-i18n-ignore", "")
                .child(el("td").text(&employee.name))
                .child(el("td").text(&employee.email))
                .child(el("td").text(&employee.plan))
                .child(el("td").text(format!("{:.2} €", employee.amount)))
                .child(el("td").text(&employee.status)),
        );
    }
    card("Empleados")
        .child(el("table").attr("class", "roster").child(rows))
        .build()
}

fn employees_import() -> Node {
    card("Importar empleados")
        .child(el("p").text(
            "Sube un CSV con columnas nombre, email, plan e importe para dar de alta en bloque.",
        ))
        .build()
}

fn employee_detail(store: &Arc<Store>, id: &str) -> Node {
    match store.employee_by_id(id) {
        Some(employee) => card(&employee.name)
            .child(
                el("dl")
                    .attr("data-i18n-ignore", "")
                    .child(el("dt").text("Email"))
                    .child(el("dd").text(&employee.email))
                    .child(el("dt").text("Plan"))
                    .child(el("dd").text(&employee.plan))
                    .child(el("dt").text("Aportación"))
                    .child(el("dd").text(format!("{:.2} €/mes", employee.amount)))
                    .child(el("dt").text("KYC"))
                    .child(el("dd").text(&employee.kyc_status))
                    .child(el("dt").text("MiFID"))
                    .child(el("dd").text(&employee.mifid_status)),
            )
            .build(),
        None => card("Empleado no encontrado")
            .child(el("p").text(format!("No hay ningún empleado con id {id}.")))
            .build(),
    }
}

fn settings(store: &Arc<Store>) -> Node {
    let company = store.company();
    let settings = store.company_settings();
    card("Ajustes")
        .child(el("p").text(format!("Empresa: {}", company.name)))
        .child(el("p").text(format!(
            "Aportación mínima: {:.2} € · corte el día {} a las {}",
            settings.min_contribution, settings.cut_off_day, settings.cut_off_time
        )))
        .child(el("p").text(format!(
            "Avisos de pagos: {}",
            if settings.notifications.payments { "sí" } else { "no" }
        )))
        .build()
}

fn back_office(title: &str, body: &str) -> Node {
    card(title).child(el("p").text(body)).build()
}

fn card(title: &str) -> ElementBuilder {
    el("section")
        .attr("class", "card")
        .child(el("h1").text(title))
}
