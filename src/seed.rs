//! Pilot seed dataset: the hardcoded defaults the store falls back to when
//! no saved snapshot exists.

use crate::state::{
    AdminCompany, Company, CompanyStats, CutOff, Employee, Movement, Plan, PlanType,
};

pub struct SeedData {
    pub company: Company,
    pub cut_off: CutOff,
    pub plan_types: Vec<PlanType>,
    pub plans: Vec<Plan>,
    pub employees: Vec<Employee>,
    pub company_stats: CompanyStats,
    pub admin_companies: Vec<AdminCompany>,
    pub movements: Vec<Movement>,
}

/// Static risk-profile catalog the plans are grouped under. Reference data,
/// never patched at runtime.
pub fn plan_types() -> Vec<PlanType> {
    vec![
        PlanType {
            id: "CONSERVADOR".into(),
            name: "Perfil conservador".into(),
            description: "Enfoque defensivo con volatilidad acotada y preservación del capital."
                .into(),
            risk_level: "Bajo".into(),
            asset_mix: "70% renta fija global + 30% renta variable".into(),
        },
        PlanType {
            id: "EQUILIBRADO".into(),
            name: "Perfil equilibrado".into(),
            description: "Diversificación mixta para captar crecimiento manteniendo estabilidad."
                .into(),
            risk_level: "Medio".into(),
            asset_mix: "50% renta variable + 40% renta fija + 10% alternativos".into(),
        },
        PlanType {
            id: "DINAMICO".into(),
            name: "Perfil dinámico".into(),
            description: "Mayor exposición a renta variable para horizontes a largo plazo.".into(),
            risk_level: "Medio-alto".into(),
            asset_mix: "85% renta variable global + 15% renta fija flexible".into(),
        },
    ]
}

pub fn seed_data() -> SeedData {
    SeedData {
        company: Company {
            name: "Acme S.L.".into(),
            logo: "/assets/acme.svg".into(),
        },
        cut_off: CutOff {
            day: 25,
            time: "18:00".into(),
        },
        plan_types: plan_types(),
        plans: vec![
            Plan {
                id: "CONS".into(),
                name: "Plan Conservador".into(),
                type_id: "CONSERVADOR".into(),
                srri: 3,
                ter: 0.3,
                isin: "KIDCONSDEMO".into(),
            },
            Plan {
                id: "EQUL".into(),
                name: "Plan Equilibrado".into(),
                type_id: "EQUILIBRADO".into(),
                srri: 4,
                ter: 0.32,
                isin: "KIDEQULDEMO".into(),
            },
            Plan {
                id: "CREC".into(),
                name: "Plan Crecimiento".into(),
                type_id: "DINAMICO".into(),
                srri: 6,
                ter: 0.35,
                isin: "KIDCRECDEMO".into(),
            },
        ],
        employees: vec![
            employee("u1", "Ana López", "ana@acme.com", "CONS", 100.0, "active", "completed", "adequate"),
            employee("u2", "David Pérez", "david@acme.com", "CREC", 150.0, "paused", "pending", "pending"),
            employee("u3", "Laura García", "laura@acme.com", "CREC", 200.0, "active", "completed", "adequate"),
            employee("u4", "Jorge Martín", "jorge@acme.com", "CONS", 80.0, "active", "review", "adequate"),
            employee("u5", "Sofía Ramos", "sofia@acme.com", "EQUL", 120.0, "active", "completed", "adequate"),
        ],
        company_stats: CompanyStats {
            adoption_pct: 44.0,
            avg_contribution: 130.0,
            next_cutoff: "2025-11-25T18:00:00Z".into(),
            payment_issues: 1,
        },
        admin_companies: vec![
            AdminCompany {
                id: "cmp-atlas".into(),
                name: "Atlas Retail".into(),
                sector: "Retail".into(),
                country: "España".into(),
                headcount: 950,
                adoption: 38.0,
                avg_ticket: 85.0,
                monthly_contribution: 30685.0,
                payroll_system: "Meta4".into(),
                stage: "pilot".into(),
                contact: "sandra.cfo@atlasretail.com".into(),
                notes: "Integración SSO verificada. Pendiente de checklist de seguridad para mover a producción.".into(),
                created_at: "2025-01-12T09:15:00Z".into(),
            },
            AdminCompany {
                id: "cmp-nimbus".into(),
                name: "Nimbus Logistics".into(),
                sector: "Logística".into(),
                country: "España".into(),
                headcount: 420,
                adoption: 52.0,
                avg_ticket: 95.0,
                monthly_contribution: 20750.0,
                payroll_system: "SAP HCM".into(),
                stage: "due-diligence".into(),
                contact: "fernando.hr@nimbus.com".into(),
                notes: "Revisión legal y de DPA en curso. Solicitan sandbox con datos sintéticos.".into(),
                created_at: "2025-02-02T14:40:00Z".into(),
            },
            AdminCompany {
                id: "cmp-tandem".into(),
                name: "Tándem Digital".into(),
                sector: "Tecnología".into(),
                country: "Portugal".into(),
                headcount: 180,
                adoption: 65.0,
                avg_ticket: 110.0,
                monthly_contribution: 12870.0,
                payroll_system: "Factorial".into(),
                stage: "activo".into(),
                contact: "ines.ops@tandemdigital.pt".into(),
                notes: "Piloto completado. OAuth firmado con vida útil de 12 meses.".into(),
                created_at: "2024-12-05T08:00:00Z".into(),
            },
            AdminCompany {
                id: "cmp-zenith".into(),
                name: "Zenith Manufacturing".into(),
                sector: "Manufactura".into(),
                country: "España".into(),
                headcount: 750,
                adoption: 24.0,
                avg_ticket: 70.0,
                monthly_contribution: 12600.0,
                payroll_system: "Workday".into(),
                stage: "prospect".into(),
                contact: "alicia.finance@zenith.com".into(),
                notes: "Necesitan PoC de conciliación SEPA antes de escalar.".into(),
                created_at: "2025-02-10T11:10:00Z".into(),
            },
        ],
        movements: vec![
            movement("u1", "2025-06-01", 100.0, "ok", "CONS"),
            movement("u1", "2025-07-01", 100.0, "ok", "CONS"),
            movement("u1", "2025-08-01", 100.0, "ok", "CONS"),
            movement("u1", "2025-09-01", 100.0, "ok", "CONS"),
            movement("u1", "2025-10-01", 100.0, "ok", "CONS"),
            movement("u2", "2025-06-01", 150.0, "ok", "CREC"),
            movement("u2", "2025-07-01", 150.0, "ok", "CREC"),
            movement("u2", "2025-08-01", 150.0, "ok", "CREC"),
            movement("u2", "2025-09-01", 150.0, "failed", "CREC"),
            movement("u2", "2025-10-01", 0.0, "paused", "CREC"),
            movement("u3", "2025-07-01", 200.0, "ok", "CREC"),
            movement("u3", "2025-08-01", 200.0, "ok", "CREC"),
            movement("u3", "2025-09-01", 200.0, "ok", "CREC"),
            movement("u3", "2025-10-01", 200.0, "ok", "CREC"),
            movement("u4", "2025-08-01", 80.0, "ok", "CONS"),
            movement("u4", "2025-09-01", 80.0, "ok", "CONS"),
            movement("u4", "2025-10-01", 80.0, "ok", "CONS"),
            movement("u5", "2025-07-01", 120.0, "ok", "EQUL"),
            movement("u5", "2025-08-01", 120.0, "ok", "EQUL"),
            movement("u5", "2025-09-01", 120.0, "ok", "EQUL"),
            movement("u5", "2025-10-01", 120.0, "ok", "EQUL"),
        ],
    }
}

#[allow(clippy::too_many_arguments)]
fn employee(
    id: &str,
    name: &str,
    email: &str,
    plan: &str,
    amount: f64,
    status: &str,
    kyc_status: &str,
    mifid_status: &str,
) -> Employee {
    Employee {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        plan: plan.into(),
        amount,
        status: status.into(),
        kyc_status: kyc_status.into(),
        mifid_status: mifid_status.into(),
    }
}

fn movement(employee_id: &str, date: &str, amount: f64, status: &str, plan_id: &str) -> Movement {
    Movement {
        employee_id: employee_id.into(),
        date: date.into(),
        amount,
        status: status.into(),
        plan_id: plan_id.into(),
    }
}
