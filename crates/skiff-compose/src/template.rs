//! Scoping of template value references
//!
//! Imported components reference their package values as `.Values.<path>`.
//! Once imported, those values live under the importing component's name,
//! so references inside template actions are rewritten to point there.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A template action, `{{ ... }}`, possibly spanning lines
static ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("valid regex"));

/// A `.Values` reference not preceded by an identifier or another selector
static VALUES_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w.\]\)])\.Values\b").expect("valid regex"));

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Scope every `.Values` reference inside template actions under `key`
///
/// `{{ .Values.replicas }}` becomes `{{ .Values.podinfo.replicas }}`. Keys that
/// are not valid field names (e.g. containing `-`) use an `index` lookup:
/// `{{ (index .Values "my-app").replicas }}`. Text outside of `{{ }}` is left
/// untouched.
pub fn insert_scope_key(content: &str, key: &str) -> String {
    let scoped = if IDENTIFIER.is_match(key) {
        format!(".Values.{}", key)
    } else {
        format!("(index .Values {:?})", key)
    };

    ACTION
        .replace_all(content, |action: &Captures<'_>| {
            VALUES_REF
                .replace_all(&action[0], |r: &Captures<'_>| format!("{}{}", &r[1], scoped))
                .into_owned()
        })
        .into_owned()
}
