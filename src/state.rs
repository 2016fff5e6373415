//! Persistent state store: single source of truth for all mutable
//! application data.
//!
//! The store is an explicitly constructed instance over two [`Storage`]
//! handles (a long-lived one for the main snapshot, a session-scoped one for
//! the per-role sessions). Every getter returns an independent clone, every
//! setter patch-merges, persists synchronously and returns the resulting
//! clone, so views can never corrupt store internals and read-after-write
//! consistency holds within the process. Storage failures are logged and
//! swallowed: the in-memory copy stays authoritative and the app keeps
//! running in a degraded, non-persisted mode.

use crate::events::{AppEvent, EventBus};
use crate::i18n::Language;
use crate::seed;
use crate::storage::Storage;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

pub const STATE_KEY: &str = "avuntia-state";
pub const COMPANY_SESSION_KEY: &str = "avuntia-session";
pub const EMPLOYEE_SESSION_KEY: &str = "avuntia-employee-session";
pub const ADMIN_SESSION_KEY: &str = "avuntia-admin-session";

// ==================== Domain types ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutOff {
    pub day: u32,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub risk_level: String,
    pub asset_mix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub type_id: String,
    pub srri: u8,
    pub ter: f64,
    pub isin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub plan: String,
    pub amount: f64,
    pub status: String,
    pub kyc_status: String,
    pub mifid_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub adoption_pct: f64,
    pub avg_contribution: f64,
    pub next_cutoff: String,
    pub payment_issues: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub employee_id: String,
    pub date: String,
    pub amount: f64,
    pub status: String,
    pub plan_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCompany {
    pub id: String,
    pub name: String,
    pub sector: String,
    pub country: String,
    pub headcount: u32,
    pub adoption: f64,
    pub avg_ticket: f64,
    pub monthly_contribution: f64,
    pub payroll_system: String,
    pub stage: String,
    pub contact: String,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConsole {
    pub companies: Vec<AdminCompany>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifications {
    pub payments: bool,
    pub incidents: bool,
    pub digest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub min_contribution: f64,
    pub global_pause: bool,
    pub cut_off_day: u32,
    pub cut_off_time: String,
    pub notifications: Notifications,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySession {
    pub is_logged: bool,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeSession {
    pub is_logged: bool,
    pub last_login: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSession {
    pub is_logged: bool,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePortal {
    pub language: String,
    pub employee_id: String,
    pub contributions: BTreeMap<String, f64>,
    pub paused: bool,
    pub documents: BTreeMap<String, String>,
    pub contact_email: String,
}

/// Full in-memory snapshot. Owned exclusively by the [`Store`]; readers only
/// ever see clones of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub company: Company,
    pub cut_off: CutOff,
    pub plans: Vec<Plan>,
    pub employees: Vec<Employee>,
    pub company_stats: CompanyStats,
    pub movements: Vec<Movement>,
    pub admin_console: AdminConsole,
    pub company_settings: CompanySettings,
    pub company_session: CompanySession,
    pub employee_session: EmployeeSession,
    pub admin_session: AdminSession,
    pub employee_portal: EmployeePortal,
    pub language: String,
}

// ==================== Patch types ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub plan: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub kyc_status: Option<String>,
    pub mifid_status: Option<String>,
}

impl EmployeePatch {
    fn apply(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
        if let Some(plan) = &self.plan {
            employee.plan = plan.clone();
        }
        if let Some(amount) = self.amount {
            employee.amount = amount;
        }
        if let Some(status) = &self.status {
            employee.status = status.clone();
        }
        if let Some(kyc) = &self.kyc_status {
            employee.kyc_status = kyc.clone();
        }
        if let Some(mifid) = &self.mifid_status {
            employee.mifid_status = mifid.clone();
        }
    }
}

/// One row of a bulk upsert: an id plus the fields to change. Rows whose id
/// is unknown are appended as new employees, with the usual defaults filling
/// any field the row leaves out.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpsert {
    pub id: String,
    #[serde(flatten)]
    pub patch: EmployeePatch,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEmployee {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub plan: String,
    pub amount: f64,
    pub status: Option<String>,
    pub kyc_status: Option<String>,
    pub mifid_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminCompanyInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub country: Option<String>,
    pub headcount: Option<u32>,
    pub adoption: Option<f64>,
    pub avg_ticket: Option<f64>,
    pub monthly_contribution: Option<f64>,
    pub payroll_system: Option<String>,
    pub stage: Option<String>,
    pub contact: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationsPatch {
    pub payments: Option<bool>,
    pub incidents: Option<bool>,
    pub digest: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanySettingsPatch {
    pub min_contribution: Option<f64>,
    pub global_pause: Option<bool>,
    pub cut_off_day: Option<u32>,
    pub cut_off_time: Option<String>,
    pub notifications: Option<NotificationsPatch>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeePortalPatch {
    pub language: Option<String>,
    pub employee_id: Option<String>,
    pub contributions: Option<BTreeMap<String, f64>>,
    pub paused: Option<bool>,
    pub documents: Option<BTreeMap<String, String>>,
    pub contact_email: Option<String>,
}

// ==================== Persisted shapes ====================

/// Subset of the state written under [`STATE_KEY`]. Sessions live under
/// their own session-scoped keys. Field names keep the original camelCase
/// vocabulary so previously saved snapshots load unchanged.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState<'a> {
    company: &'a Company,
    cut_off: &'a CutOff,
    plans: &'a Vec<Plan>,
    employees: &'a Vec<Employee>,
    company_stats: &'a CompanyStats,
    movements: &'a Vec<Movement>,
    admin_console: &'a AdminConsole,
    company_settings: &'a CompanySettings,
    employee_portal: &'a EmployeePortal,
    language: &'a String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredState {
    company: Option<Company>,
    cut_off: Option<CutOff>,
    plans: Option<Vec<Plan>>,
    employees: Option<Vec<Employee>>,
    company_stats: Option<CompanyStats>,
    movements: Option<Vec<Movement>>,
    admin_console: Option<AdminConsole>,
    company_settings: Option<CompanySettings>,
    employee_portal: Option<StoredEmployeePortal>,
    language: Option<String>,
}

/// Saved employee-portal shape, including the legacy single-plan fields that
/// predate the contributions map.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredEmployeePortal {
    language: Option<String>,
    employee_id: Option<String>,
    contributions: Option<BTreeMap<String, f64>>,
    paused: Option<bool>,
    documents: Option<BTreeMap<String, String>>,
    contact_email: Option<String>,
    selected_plan: Option<String>,
    monthly_contribution: Option<f64>,
}

// ==================== Store ====================

pub struct Store {
    state: Mutex<AppState>,
    storage: Arc<dyn Storage>,
    session_storage: Arc<dyn Storage>,
    bus: Arc<EventBus>,
}

impl Store {
    /// Load any previously saved snapshot over the defaults, then layer the
    /// per-role sessions from the session-scoped storage on top.
    pub fn init(
        storage: Arc<dyn Storage>,
        session_storage: Arc<dyn Storage>,
        bus: Arc<EventBus>,
    ) -> Arc<Store> {
        let mut state = load_state(storage.as_ref());
        load_sessions(session_storage.as_ref(), &mut state);
        Arc::new(Store {
            state: Mutex::new(state),
            storage,
            session_storage,
            bus,
        })
    }

    // ==================== Readers ====================

    /// Debug accessor for the full current snapshot.
    pub fn state_snapshot(&self) -> AppState {
        self.state.lock().unwrap().clone()
    }

    pub fn company(&self) -> Company {
        self.state.lock().unwrap().company.clone()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.state.lock().unwrap().employees.clone()
    }

    pub fn employee_by_id(&self, id: &str) -> Option<Employee> {
        self.state
            .lock()
            .unwrap()
            .employees
            .iter()
            .find(|emp| emp.id == id)
            .cloned()
    }

    pub fn plans(&self) -> Vec<Plan> {
        self.state.lock().unwrap().plans.clone()
    }

    pub fn movements(&self) -> Vec<Movement> {
        self.state.lock().unwrap().movements.clone()
    }

    pub fn admin_companies(&self) -> Vec<AdminCompany> {
        self.state.lock().unwrap().admin_console.companies.clone()
    }

    pub fn company_settings(&self) -> CompanySettings {
        self.state.lock().unwrap().company_settings.clone()
    }

    pub fn company_session(&self) -> CompanySession {
        self.state.lock().unwrap().company_session.clone()
    }

    pub fn employee_session(&self) -> EmployeeSession {
        self.state.lock().unwrap().employee_session.clone()
    }

    pub fn admin_session(&self) -> AdminSession {
        self.state.lock().unwrap().admin_session.clone()
    }

    pub fn employee_portal(&self) -> EmployeePortal {
        self.state.lock().unwrap().employee_portal.clone()
    }

    pub fn language(&self) -> String {
        let state = self.state.lock().unwrap();
        Language::resolve(&state.language).code().to_string()
    }

    // ==================== Writers ====================

    /// Patch a single employee. Returns `None` when the id is unknown.
    pub fn update_employee(&self, id: &str, patch: &EmployeePatch) -> Option<Employee> {
        let mut state = self.state.lock().unwrap();
        let employee = state.employees.iter_mut().find(|emp| emp.id == id)?;
        patch.apply(employee);
        let updated = employee.clone();
        self.persist_state(&state);
        Some(updated)
    }

    /// Upsert by id: rows with a known id are patched in place, the rest are
    /// appended. Employees not mentioned are preserved untouched.
    pub fn update_employees_bulk(&self, updates: &[EmployeeUpsert]) -> Vec<Employee> {
        let mut state = self.state.lock().unwrap();
        for update in updates {
            match state.employees.iter_mut().find(|emp| emp.id == update.id) {
                Some(existing) => update.patch.apply(existing),
                None => {
                    let patch = &update.patch;
                    state.employees.push(Employee {
                        id: update.id.clone(),
                        name: patch.name.clone().unwrap_or_default(),
                        email: patch.email.clone().unwrap_or_default(),
                        plan: patch.plan.clone().unwrap_or_default(),
                        amount: patch.amount.unwrap_or(0.0),
                        status: patch.status.clone().unwrap_or_else(|| "active".into()),
                        kyc_status: patch.kyc_status.clone().unwrap_or_else(|| "pending".into()),
                        mifid_status: patch
                            .mifid_status
                            .clone()
                            .unwrap_or_else(|| "pending".into()),
                    });
                }
            }
        }
        self.persist_state(&state);
        state.employees.clone()
    }

    pub fn replace_employees(&self, list: Vec<Employee>) -> Vec<Employee> {
        let mut state = self.state.lock().unwrap();
        state.employees = list;
        self.persist_state(&state);
        state.employees.clone()
    }

    pub fn add_employee(&self, employee: NewEmployee) -> Employee {
        let mut state = self.state.lock().unwrap();
        let new_employee = Employee {
            id: employee.id.unwrap_or_else(|| generate_id("emp")),
            name: employee.name,
            email: employee.email,
            plan: employee.plan,
            amount: employee.amount,
            status: employee.status.unwrap_or_else(|| "active".into()),
            kyc_status: employee.kyc_status.unwrap_or_else(|| "pending".into()),
            mifid_status: employee.mifid_status.unwrap_or_else(|| "pending".into()),
        };
        state.employees.push(new_employee.clone());
        self.persist_state(&state);
        new_employee
    }

    /// Returns whether a row was actually removed.
    pub fn delete_employee(&self, id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let before = state.employees.len();
        state.employees.retain(|emp| emp.id != id);
        if state.employees.len() != before {
            self.persist_state(&state);
            true
        } else {
            false
        }
    }

    /// Register a prospect in the internal console. The monthly contribution
    /// is taken verbatim when supplied, otherwise derived from
    /// headcount × adoption% × average ticket; free-text fields fall back to
    /// sentinel values. Newest registrations go first.
    pub fn register_admin_company(&self, input: AdminCompanyInput) -> AdminCompany {
        let mut state = self.state.lock().unwrap();
        let headcount = input.headcount.unwrap_or(0);
        let adoption = input
            .adoption
            .filter(|a| a.is_finite())
            .map(|a| a.clamp(0.0, 100.0))
            .unwrap_or(0.0);
        let avg_ticket = input.avg_ticket.unwrap_or(0.0).max(0.0);
        let computed_monthly = (f64::from(headcount) * (adoption / 100.0) * avg_ticket).round();
        let monthly_contribution = input
            .monthly_contribution
            .map(|m| m.max(0.0))
            .unwrap_or(computed_monthly);

        let company = AdminCompany {
            id: input.id.unwrap_or_else(|| generate_id("cmp")),
            name: non_empty(input.name, "Nueva empresa"),
            sector: non_empty(input.sector, "General"),
            country: non_empty(input.country, "España"),
            headcount,
            adoption,
            avg_ticket,
            monthly_contribution,
            payroll_system: non_empty(input.payroll_system, "Sin especificar"),
            stage: non_empty(input.stage, "prospect"),
            contact: input.contact.map(|s| s.trim().to_string()).unwrap_or_default(),
            notes: input.notes.map(|s| s.trim().to_string()).unwrap_or_default(),
            created_at: input.created_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
        };
        state.admin_console.companies.insert(0, company.clone());
        self.persist_state(&state);
        company
    }

    /// Shallow-merge with a deep merge of the `notifications` sub-object.
    pub fn update_company_settings(&self, patch: &CompanySettingsPatch) -> CompanySettings {
        let mut state = self.state.lock().unwrap();
        let settings = &mut state.company_settings;
        if let Some(min) = patch.min_contribution {
            settings.min_contribution = min;
        }
        if let Some(pause) = patch.global_pause {
            settings.global_pause = pause;
        }
        if let Some(day) = patch.cut_off_day {
            settings.cut_off_day = day;
        }
        if let Some(time) = &patch.cut_off_time {
            settings.cut_off_time = time.clone();
        }
        if let Some(notifications) = &patch.notifications {
            if let Some(payments) = notifications.payments {
                settings.notifications.payments = payments;
            }
            if let Some(incidents) = notifications.incidents {
                settings.notifications.incidents = incidents;
            }
            if let Some(digest) = notifications.digest {
                settings.notifications.digest = digest;
            }
        }
        let updated = settings.clone();
        self.persist_state(&state);
        updated
    }

    pub fn update_company(&self, patch: &CompanyPatch) -> Company {
        let mut state = self.state.lock().unwrap();
        if let Some(name) = &patch.name {
            state.company.name = name.clone();
        }
        if let Some(logo) = &patch.logo {
            state.company.logo = logo.clone();
        }
        let updated = state.company.clone();
        self.persist_state(&state);
        updated
    }

    /// Shallow-merge with deep merges of `documents` and `contributions`.
    /// Contribution entries for unknown plan ids are dropped with a warning,
    /// keeping the contributions keys a subset of known plans.
    pub fn update_employee_portal(&self, patch: &EmployeePortalPatch) -> EmployeePortal {
        let mut state = self.state.lock().unwrap();
        let known_plans: Vec<String> = state.plans.iter().map(|p| p.id.clone()).collect();
        let portal = &mut state.employee_portal;
        if let Some(language) = &patch.language {
            portal.language = language.clone();
        }
        if let Some(employee_id) = &patch.employee_id {
            portal.employee_id = employee_id.clone();
        }
        if let Some(paused) = patch.paused {
            portal.paused = paused;
        }
        if let Some(contact_email) = &patch.contact_email {
            portal.contact_email = contact_email.clone();
        }
        if let Some(documents) = &patch.documents {
            for (key, value) in documents {
                portal.documents.insert(key.clone(), value.clone());
            }
        }
        if let Some(contributions) = &patch.contributions {
            for (plan_id, amount) in contributions {
                if known_plans.iter().any(|id| id == plan_id) {
                    portal.contributions.insert(plan_id.clone(), *amount);
                } else {
                    warn!(plan_id, "ignoring contribution for unknown plan");
                }
            }
        }
        let updated = portal.clone();
        self.persist_state(&state);
        updated
    }

    // ==================== Sessions ====================

    pub fn set_company_session_logged_in(&self) {
        let mut state = self.state.lock().unwrap();
        state.company_session.is_logged = true;
        state.company_session.last_login = Some(Utc::now().to_rfc3339());
        self.persist_session(COMPANY_SESSION_KEY, &state.company_session);
    }

    pub fn clear_company_session(&self) {
        let mut state = self.state.lock().unwrap();
        state.company_session = CompanySession::default();
        self.persist_session(COMPANY_SESSION_KEY, &state.company_session);
    }

    pub fn set_employee_session_logged_in(&self, email: &str) {
        let mut state = self.state.lock().unwrap();
        state.employee_session.is_logged = true;
        state.employee_session.last_login = Some(Utc::now().to_rfc3339());
        state.employee_session.email = email.to_string();
        self.persist_session(EMPLOYEE_SESSION_KEY, &state.employee_session);
    }

    pub fn clear_employee_session(&self) {
        let mut state = self.state.lock().unwrap();
        state.employee_session = EmployeeSession::default();
        self.persist_session(EMPLOYEE_SESSION_KEY, &state.employee_session);
    }

    pub fn set_admin_session_logged_in(&self) {
        let mut state = self.state.lock().unwrap();
        state.admin_session.is_logged = true;
        state.admin_session.last_login = Some(Utc::now().to_rfc3339());
        self.persist_session(ADMIN_SESSION_KEY, &state.admin_session);
    }

    pub fn clear_admin_session(&self) {
        let mut state = self.state.lock().unwrap();
        state.admin_session = AdminSession::default();
        self.persist_session(ADMIN_SESSION_KEY, &state.admin_session);
    }

    // ==================== Language ====================

    /// Validate against the supported language set (falling back to the
    /// default), persist and announce the change. No-ops when unchanged.
    pub fn set_language(&self, code: &str) -> String {
        let normalized = Language::resolve(code).code().to_string();
        {
            let mut state = self.state.lock().unwrap();
            if state.language == normalized {
                return normalized;
            }
            state.language = normalized.clone();
            self.persist_state(&state);
        }
        self.bus.publish(AppEvent::LanguageChanged {
            language: normalized.clone(),
        });
        normalized
    }

    /// Restore full defaults across the main store and all session stores.
    pub fn reset_pilot_state(&self) -> AppState {
        let mut state = self.state.lock().unwrap();
        *state = default_state();
        self.persist_state(&state);
        self.persist_session(COMPANY_SESSION_KEY, &state.company_session);
        self.persist_session(EMPLOYEE_SESSION_KEY, &state.employee_session);
        self.persist_session(ADMIN_SESSION_KEY, &state.admin_session);
        state.clone()
    }

    // ==================== Persistence ====================

    fn persist_state(&self, state: &AppState) {
        let persisted = PersistedState {
            company: &state.company,
            cut_off: &state.cut_off,
            plans: &state.plans,
            employees: &state.employees,
            company_stats: &state.company_stats,
            movements: &state.movements,
            admin_console: &state.admin_console,
            company_settings: &state.company_settings,
            employee_portal: &state.employee_portal,
            language: &state.language,
        };
        match serde_json::to_string(&persisted) {
            Ok(json) => {
                if let Err(e) = self.storage.set(STATE_KEY, &json) {
                    warn!("failed to persist state, continuing in memory: {e:#}");
                }
            }
            Err(e) => warn!("failed to serialize state: {e}"),
        }
    }

    fn persist_session<T: Serialize>(&self, key: &str, session: &T) {
        match serde_json::to_string(session) {
            Ok(json) => {
                if let Err(e) = self.session_storage.set(key, &json) {
                    warn!("failed to persist session {key}: {e:#}");
                }
            }
            Err(e) => warn!("failed to serialize session {key}: {e}"),
        }
    }
}

// ==================== Defaults and loading ====================

pub fn default_state() -> AppState {
    let data = seed::seed_data();
    AppState {
        company_settings: CompanySettings {
            min_contribution: 50.0,
            global_pause: false,
            cut_off_day: data.cut_off.day,
            cut_off_time: data.cut_off.time.clone(),
            notifications: Notifications {
                payments: true,
                incidents: true,
                digest: false,
            },
        },
        employee_portal: default_employee_portal(&data),
        company: data.company,
        cut_off: data.cut_off,
        plans: data.plans,
        employees: data.employees,
        company_stats: data.company_stats,
        movements: data.movements,
        admin_console: AdminConsole {
            companies: data.admin_companies,
        },
        company_session: CompanySession::default(),
        employee_session: EmployeeSession::default(),
        admin_session: AdminSession::default(),
        language: Language::fallback().code().to_string(),
    }
}

fn default_employee_portal(data: &seed::SeedData) -> EmployeePortal {
    let mut contributions: BTreeMap<String, f64> =
        data.plans.iter().map(|plan| (plan.id.clone(), 0.0)).collect();
    let primary = data
        .employees
        .iter()
        .find(|emp| emp.id == "u1")
        .or_else(|| data.employees.first());
    if let Some(employee) = primary {
        if let Some(amount) = contributions.get_mut(&employee.plan) {
            *amount = employee.amount;
        }
    }
    EmployeePortal {
        language: Language::fallback().code().to_string(),
        employee_id: primary.map(|emp| emp.id.clone()).unwrap_or_default(),
        contributions,
        paused: false,
        documents: BTreeMap::new(),
        contact_email: "empleado@avuntia.com".into(),
    }
}

fn load_state(storage: &dyn Storage) -> AppState {
    let defaults = default_state();
    let Some(raw) = storage.get(STATE_KEY) else {
        return defaults;
    };
    match serde_json::from_str::<StoredState>(&raw) {
        Ok(stored) => merge_stored_state(defaults, stored),
        Err(e) => {
            warn!("failed to load saved state, using defaults: {e}");
            defaults
        }
    }
}

/// Saved snapshot wins for keys it has; defaults win for absent keys. The
/// employee portal gets a nested merge instead of wholesale replacement.
fn merge_stored_state(mut state: AppState, stored: StoredState) -> AppState {
    if let Some(company) = stored.company {
        state.company = company;
    }
    if let Some(cut_off) = stored.cut_off {
        state.cut_off = cut_off;
    }
    if let Some(plans) = stored.plans {
        state.plans = plans;
    }
    if let Some(employees) = stored.employees {
        state.employees = employees;
    }
    if let Some(stats) = stored.company_stats {
        state.company_stats = stats;
    }
    if let Some(movements) = stored.movements {
        state.movements = movements;
    }
    if let Some(admin_console) = stored.admin_console {
        state.admin_console = admin_console;
    }
    if let Some(settings) = stored.company_settings {
        state.company_settings = settings;
    }
    if let Some(portal) = stored.employee_portal {
        state.employee_portal = merge_employee_portal(state.employee_portal, portal);
    }
    if let Some(language) = stored.language {
        state.language = language;
    }
    state
}

/// Deep-merge `documents` and `contributions` individually (defaults ∪
/// saved, saved wins on collisions) and migrate the legacy single-plan shape
/// into the contributions map.
fn merge_employee_portal(
    defaults: EmployeePortal,
    stored: StoredEmployeePortal,
) -> EmployeePortal {
    let legacy = extract_legacy_contributions(&stored, &defaults);
    let mut portal = defaults;
    if let Some(language) = stored.language {
        portal.language = language;
    }
    if let Some(employee_id) = stored.employee_id {
        portal.employee_id = employee_id;
    }
    if let Some(paused) = stored.paused {
        portal.paused = paused;
    }
    if let Some(contact_email) = stored.contact_email {
        portal.contact_email = contact_email;
    }
    if let Some(documents) = stored.documents {
        for (key, value) in documents {
            portal.documents.insert(key, value);
        }
    }
    let saved_contributions = stored.contributions.unwrap_or(legacy);
    for (plan_id, amount) in saved_contributions {
        portal.contributions.insert(plan_id, amount);
    }
    portal
}

fn extract_legacy_contributions(
    stored: &StoredEmployeePortal,
    defaults: &EmployeePortal,
) -> BTreeMap<String, f64> {
    let has_legacy = stored.contributions.is_none()
        && (stored.selected_plan.is_some() || stored.monthly_contribution.is_some());
    if !has_legacy {
        return BTreeMap::new();
    }
    let plan = stored
        .selected_plan
        .clone()
        .or_else(|| defaults.contributions.keys().next().cloned());
    let Some(plan) = plan else {
        return BTreeMap::new();
    };
    let amount = stored.monthly_contribution.unwrap_or(0.0);
    BTreeMap::from([(plan, amount)])
}

fn load_sessions(session_storage: &dyn Storage, state: &mut AppState) {
    if let Some(raw) = session_storage.get(COMPANY_SESSION_KEY) {
        match serde_json::from_str(&raw) {
            Ok(session) => state.company_session = session,
            Err(e) => warn!("failed to load company session: {e}"),
        }
    }
    if let Some(raw) = session_storage.get(EMPLOYEE_SESSION_KEY) {
        match serde_json::from_str(&raw) {
            Ok(session) => state.employee_session = session,
            Err(e) => warn!("failed to load employee session: {e}"),
        }
    }
    if let Some(raw) = session_storage.get(ADMIN_SESSION_KEY) {
        match serde_json::from_str(&raw) {
            Ok(session) => state.admin_session = session,
            Err(e) => warn!("failed to load admin session: {e}"),
        }
    }
}

fn non_empty(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                fallback.to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => fallback.to_string(),
    }
}

fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let salt: u16 = rand::thread_rng().gen();
    format!("{prefix}-{millis:x}-{salt:04x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn test_store() -> Arc<Store> {
        Store::init(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(EventBus::new()),
        )
    }

    fn store_with_saved(saved: &str) -> Arc<Store> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(STATE_KEY, saved).unwrap();
        Store::init(
            storage,
            Arc::new(MemoryStorage::new()),
            Arc::new(EventBus::new()),
        )
    }

    #[test]
    fn defaults_have_unique_employee_ids() {
        let state = default_state();
        let mut ids: Vec<_> = state.employees.iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), state.employees.len());
    }

    #[test]
    fn default_contributions_cover_known_plans_only() {
        let state = default_state();
        let plan_ids: Vec<_> = state.plans.iter().map(|p| p.id.as_str()).collect();
        for plan_id in state.employee_portal.contributions.keys() {
            assert!(plan_ids.contains(&plan_id.as_str()));
        }
        // The primary employee's contribution is seeded into their plan
        assert_eq!(state.employee_portal.contributions.get("CONS"), Some(&100.0));
    }

    #[test]
    fn update_employee_patches_and_round_trips() {
        let store = test_store();
        let updated = store
            .update_employee(
                "u1",
                &EmployeePatch {
                    amount: Some(200.0),
                    ..EmployeePatch::default()
                },
            )
            .expect("u1 exists");
        assert_eq!(updated.amount, 200.0);
        assert_eq!(updated.name, "Ana López");

        let mut fetched = store.employee_by_id("u1").unwrap();
        assert_eq!(fetched.amount, 200.0);

        // Mutating the returned copy must not affect the store
        fetched.amount = 1.0;
        assert_eq!(store.employee_by_id("u1").unwrap().amount, 200.0);
    }

    #[test]
    fn update_employee_unknown_id_is_noop() {
        let store = test_store();
        assert!(store
            .update_employee("nope", &EmployeePatch::default())
            .is_none());
    }

    #[test]
    fn bulk_upsert_updates_and_appends() {
        let store = test_store();
        let before = store.employees().len();

        let result = store.update_employees_bulk(&[
            EmployeeUpsert {
                id: "u1".into(),
                patch: EmployeePatch {
                    amount: Some(999.0),
                    ..EmployeePatch::default()
                },
            },
            EmployeeUpsert {
                id: "new1".into(),
                patch: EmployeePatch {
                    name: Some("X".into()),
                    email: Some("x@acme.com".into()),
                    plan: Some("EQUL".into()),
                    amount: Some(75.0),
                    ..EmployeePatch::default()
                },
            },
        ]);

        assert_eq!(result.len(), before + 1);
        let u1 = result.iter().find(|e| e.id == "u1").unwrap();
        assert_eq!(u1.amount, 999.0);
        assert_eq!(u1.name, "Ana López");
        let new1 = result.iter().find(|e| e.id == "new1").unwrap();
        assert_eq!(new1.name, "X");
        assert_eq!(new1.status, "active");
        // existing employees not mentioned survive untouched
        assert!(result.iter().any(|e| e.id == "u3"));
    }

    #[test]
    fn add_employee_assigns_id_and_defaults() {
        let store = test_store();
        let employee = store.add_employee(NewEmployee {
            name: "Nuevo".into(),
            email: "nuevo@acme.com".into(),
            plan: "CONS".into(),
            amount: 60.0,
            ..NewEmployee::default()
        });
        assert!(employee.id.starts_with("emp-"));
        assert_eq!(employee.status, "active");
        assert_eq!(employee.kyc_status, "pending");
        assert_eq!(employee.mifid_status, "pending");
        assert!(store.employee_by_id(&employee.id).is_some());
    }

    #[test]
    fn delete_employee_reports_removal() {
        let store = test_store();
        assert!(store.delete_employee("u2"));
        assert!(!store.delete_employee("u2"));
        assert!(store.employee_by_id("u2").is_none());
    }

    #[test]
    fn register_admin_company_derives_monthly_contribution() {
        let store = test_store();
        let company = store.register_admin_company(AdminCompanyInput {
            name: Some("Demo SA".into()),
            headcount: Some(200),
            adoption: Some(50.0),
            avg_ticket: Some(80.0),
            ..AdminCompanyInput::default()
        });
        assert_eq!(company.monthly_contribution, 8000.0);
        assert_eq!(company.sector, "General");
        assert_eq!(company.country, "España");
        assert_eq!(company.stage, "prospect");
        // Newest-first ordering
        assert_eq!(store.admin_companies()[0].id, company.id);
    }

    #[test]
    fn register_admin_company_clamps_adoption_and_keeps_explicit_monthly() {
        let store = test_store();
        let company = store.register_admin_company(AdminCompanyInput {
            name: Some("Clamped".into()),
            headcount: Some(10),
            adoption: Some(250.0),
            avg_ticket: Some(10.0),
            monthly_contribution: Some(1234.0),
            ..AdminCompanyInput::default()
        });
        assert_eq!(company.adoption, 100.0);
        assert_eq!(company.monthly_contribution, 1234.0);
    }

    #[test]
    fn settings_deep_merge_preserves_sibling_notifications() {
        let store = test_store();
        let updated = store.update_company_settings(&CompanySettingsPatch {
            notifications: Some(NotificationsPatch {
                digest: Some(true),
                ..NotificationsPatch::default()
            }),
            ..CompanySettingsPatch::default()
        });
        assert!(updated.notifications.digest);
        assert!(updated.notifications.payments);
        assert!(updated.notifications.incidents);
    }

    #[test]
    fn employee_portal_deep_merges_documents_and_contributions() {
        let store = test_store();
        store.update_employee_portal(&EmployeePortalPatch {
            documents: Some(BTreeMap::from([("kyc".to_string(), "signed".to_string())])),
            ..EmployeePortalPatch::default()
        });
        let updated = store.update_employee_portal(&EmployeePortalPatch {
            contributions: Some(BTreeMap::from([("EQUL".to_string(), 40.0)])),
            ..EmployeePortalPatch::default()
        });
        assert_eq!(updated.documents.get("kyc").map(String::as_str), Some("signed"));
        assert_eq!(updated.contributions.get("EQUL"), Some(&40.0));
        // Entries from the defaults survive the merge
        assert!(updated.contributions.contains_key("CONS"));
    }

    #[test]
    fn employee_portal_drops_unknown_plan_contributions() {
        let store = test_store();
        let updated = store.update_employee_portal(&EmployeePortalPatch {
            contributions: Some(BTreeMap::from([("GHOST".to_string(), 99.0)])),
            ..EmployeePortalPatch::default()
        });
        assert!(!updated.contributions.contains_key("GHOST"));
    }

    #[test]
    fn sessions_are_independent_per_role() {
        let store = test_store();
        store.set_company_session_logged_in();
        assert!(store.company_session().is_logged);
        assert!(!store.employee_session().is_logged);
        assert!(!store.admin_session().is_logged);

        store.set_employee_session_logged_in("ana@acme.com");
        store.clear_company_session();
        let employee = store.employee_session();
        assert!(employee.is_logged);
        assert_eq!(employee.email, "ana@acme.com");
        assert!(!store.company_session().is_logged);
        assert!(store.employee_session().last_login.is_some());
    }

    #[test]
    fn set_language_validates_and_falls_back() {
        let store = test_store();
        assert_eq!(store.set_language("en"), "en");
        assert_eq!(store.language(), "en");
        // Unsupported codes fall back to the default instead of crashing
        assert_eq!(store.set_language("xx"), "es");
        assert_eq!(store.language(), "es");
    }

    #[test]
    fn set_language_publishes_change_event_once() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(move |event| {
            if let AppEvent::LanguageChanged { language } = event {
                sink.lock().unwrap().push(language.clone());
            }
        });
        let store = Store::init(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            bus,
        );
        store.set_language("ca");
        store.set_language("ca"); // unchanged, no event
        assert_eq!(*seen.lock().unwrap(), vec!["ca".to_string()]);
    }

    #[test]
    fn saved_snapshot_wins_over_defaults() {
        let store = store_with_saved(r#"{"language":"en","employees":[]}"#);
        assert_eq!(store.language(), "en");
        assert!(store.employees().is_empty());
        // Keys absent from the snapshot come from the defaults
        assert_eq!(store.company().name, "Acme S.L.");
    }

    #[test]
    fn legacy_portal_shape_migrates_into_contributions_map() {
        let store = store_with_saved(
            r#"{"employeePortal":{"selectedPlan":"CONS","monthlyContribution":80}}"#,
        );
        let portal = store.employee_portal();
        assert_eq!(portal.contributions.get("CONS"), Some(&80.0));
        // The other default plans remain present
        assert!(portal.contributions.contains_key("EQUL"));
    }

    #[test]
    fn corrupt_snapshot_degrades_to_defaults() {
        let store = store_with_saved("{not json");
        assert_eq!(store.company().name, "Acme S.L.");
    }

    #[test]
    fn mutations_persist_synchronously() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::init(
            storage.clone(),
            Arc::new(MemoryStorage::new()),
            Arc::new(EventBus::new()),
        );
        store.update_employee(
            "u1",
            &EmployeePatch {
                amount: Some(321.0),
                ..EmployeePatch::default()
            },
        );
        let raw = storage.get(STATE_KEY).expect("snapshot persisted");
        assert!(raw.contains("321"));
    }

    #[test]
    fn failing_storage_keeps_memory_authoritative() {
        struct FailingStorage;
        impl Storage for FailingStorage {
            fn get(&self, _key: &str) -> Option<String> {
                None
            }
            fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
                anyhow::bail!("quota exceeded")
            }
            fn remove(&self, _key: &str) -> anyhow::Result<()> {
                anyhow::bail!("storage unavailable")
            }
        }
        let store = Store::init(
            Arc::new(FailingStorage),
            Arc::new(FailingStorage),
            Arc::new(EventBus::new()),
        );
        store.update_employee(
            "u1",
            &EmployeePatch {
                amount: Some(55.0),
                ..EmployeePatch::default()
            },
        );
        assert_eq!(store.employee_by_id("u1").unwrap().amount, 55.0);
    }

    #[test]
    fn reset_pilot_state_restores_defaults_everywhere() {
        let store = test_store();
        store.set_company_session_logged_in();
        store.delete_employee("u1");
        store.set_language("en");

        let state = store.reset_pilot_state();
        assert!(!state.company_session.is_logged);
        assert!(state.employees.iter().any(|e| e.id == "u1"));
        assert_eq!(state.language, "es");
    }
}
