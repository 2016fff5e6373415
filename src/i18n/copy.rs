//! Keyed translation sources: structured site copy and the flat dictionary.
//!
//! Lookup order for a key is (1) the nested site-copy structure for the
//! active language, (2) the flat dictionary entry for the active language
//! falling back to the fallback language. A key found in neither source
//! leaves the element untouched; that case is logged at debug level so a
//! missing entry can be told apart from copy that intentionally needs no
//! translation.

use crate::i18n::Language;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Structured site copy for one language.
fn site_copy(language: Language) -> &'static Value {
    static COPY: OnceLock<HashMap<&'static str, Value>> = OnceLock::new();
    let copy = COPY.get_or_init(|| {
        HashMap::from([
            (
                "es",
                json!({
                    "nav": {
                        "home": "Inicio",
                        "howItWorks": "Cómo funciona",
                        "plans": "Planes",
                        "security": "Seguridad",
                        "faq": "FAQ",
                        "contact": "Contacto",
                        "company": "Portal empresa",
                        "employee": "Portal empleado"
                    },
                    "home": {
                        "title": "Invierte desde tu nómina",
                        "subtitle": "Aportaciones periódicas deducidas automáticamente, sin fricción.",
                        "cta": "Empieza ahora"
                    },
                    "footer": {
                        "legal": "Aviso legal",
                        "year": "© {year} Avuntia"
                    },
                    "system": {
                        "notFoundTitle": "Página no encontrada",
                        "notFoundBody": "No existe contenido en {path}.",
                        "maintenanceTitle": "En mantenimiento"
                    }
                }),
            ),
            (
                "ca",
                json!({
                    "nav": {
                        "home": "Inici",
                        "howItWorks": "Com funciona",
                        "plans": "Plans",
                        "security": "Seguretat",
                        "faq": "FAQ",
                        "contact": "Contacte",
                        "company": "Portal empresa",
                        "employee": "Portal empleat"
                    },
                    "home": {
                        "title": "Inverteix des de la teva nòmina",
                        "subtitle": "Aportacions periòdiques deduïdes automàticament, sense fricció.",
                        "cta": "Comença ara"
                    },
                    "footer": {
                        "legal": "Avís legal",
                        "year": "© {year} Avuntia"
                    },
                    "system": {
                        "notFoundTitle": "Pàgina no trobada",
                        "notFoundBody": "No hi ha contingut a {path}.",
                        "maintenanceTitle": "En manteniment"
                    }
                }),
            ),
            (
                "en",
                json!({
                    "nav": {
                        "home": "Home",
                        "howItWorks": "How it works",
                        "plans": "Plans",
                        "security": "Security",
                        "faq": "FAQ",
                        "contact": "Contact",
                        "company": "Company portal",
                        "employee": "Employee portal"
                    },
                    "home": {
                        "title": "Invest straight from your payroll",
                        "subtitle": "Recurring contributions deducted automatically, no friction.",
                        "cta": "Start now"
                    },
                    "footer": {
                        "legal": "Legal notice",
                        "year": "© {year} Avuntia"
                    },
                    "system": {
                        "notFoundTitle": "Page not found",
                        "notFoundBody": "There is no content at {path}.",
                        "maintenanceTitle": "Under maintenance"
                    }
                }),
            ),
        ])
    });
    copy.get(language.code())
        .unwrap_or_else(|| copy.get(Language::fallback().code()).expect("fallback copy exists"))
}

/// Flat key→per-language dictionary for strings shared across views.
fn dictionary_value(key: &str, language: Language) -> Option<&'static str> {
    static DICTIONARY: OnceLock<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
        OnceLock::new();
    let dictionary = DICTIONARY.get_or_init(|| {
        HashMap::from([
            (
                "common.backHome",
                HashMap::from([("es", "Volver al inicio"), ("ca", "Torna a l'inici"), ("en", "Back to home")]),
            ),
            (
                "common.login",
                HashMap::from([("es", "Acceder"), ("ca", "Accedir"), ("en", "Log in")]),
            ),
            (
                "common.logout",
                HashMap::from([("es", "Cerrar sesión"), ("ca", "Tanca la sessió"), ("en", "Log out")]),
            ),
            (
                "oauth.title",
                HashMap::from([("es", "Consola OAuth"), ("ca", "Consola OAuth"), ("en", "OAuth console")]),
            ),
            (
                "empresa.dashboardTitle",
                HashMap::from([("es", "Panel de empresa"), ("ca", "Tauler d'empresa"), ("en", "Company dashboard")]),
            ),
            (
                "empresa.adoption",
                HashMap::from([("es", "Adopción"), ("ca", "Adopció"), ("en", "Adoption")]),
            ),
            (
                "empleado.kidTitle",
                HashMap::from([("es", "Documento de datos fundamentales"), ("ca", "Document de dades fonamentals"), ("en", "Key information document")]),
            ),
            (
                "empleado.searchPlaceholder",
                HashMap::from([("es", "Busca un plan"), ("ca", "Cerca un pla"), ("en", "Search for a plan")]),
            ),
        ])
    });
    let entry = dictionary.get(key)?;
    entry
        .get(language.code())
        .or_else(|| entry.get(Language::fallback().code()))
        .copied()
}

fn nested_value<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(object, |current, segment| current.get(segment))
}

/// Resolve a translation key: nested site copy first, then the dictionary.
pub(crate) fn resolve_translation(key: &str, language: Language) -> Option<String> {
    let site = site_copy(language);
    if let Some(value) = nested_value(site, key).and_then(Value::as_str) {
        return Some(value.to_string());
    }
    if let Some(value) = dictionary_value(key, language) {
        return Some(value.to_string());
    }
    debug!(key, language = language.code(), "translation key missing from copy and dictionary");
    None
}

/// Substitute `{name}` placeholders; absent parameters become empty strings.
pub(crate) fn format_translation(value: &str, params: &HashMap<String, String>) -> String {
    if params.is_empty() {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let rest = &value[start + 1..];
        match rest.find('}') {
            Some(end) if rest[..end].chars().all(|p| p.is_ascii_alphanumeric() || p == '_') && end > 0 => {
                let name = &rest[..end];
                if let Some(replacement) = params.get(name) {
                    out.push_str(replacement);
                }
                for _ in 0..=end {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Programmatic lookup used by view code: resolve and format a key, empty
/// string when the key is unknown.
pub fn translate(key: &str, params: &HashMap<String, String>, language: Language) -> String {
    match resolve_translation(key, language) {
        Some(value) => format_translation(&value, params),
        None => String::new(),
    }
}
