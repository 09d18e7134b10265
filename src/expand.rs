//! Property table and `${token}` expansion.
//!
//! Properties are declared with `property(name: 'x', value: '1')` or loaded
//! from a properties file, and referenced either as `${x}` inside strings or
//! as a bare identifier in attribute position.
//!
//! ```text
//! property(name: 'schema', value: 'app')
//! property(name: 'table', value: '${schema}.users')
//! dropTable(tableName: '${table}')        // tableName == "app.users"
//! ```

use crate::config::Environment;
use crate::model::changeset::same_path;
use crate::model::{ContextExpression, LabelExpression, Labels};
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// Innermost `${name}` token: the name holds no `$`, `{` or `}`.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^${}]+)\}").expect("token pattern compiles"));

const DEFAULT_MAX_PASSES: usize = 10;

/// Where a property applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyScope {
    pub contexts: Option<ContextExpression>,
    pub labels: Option<Labels>,
    pub dbms: Vec<String>,
    /// Global properties are visible to every changelog of the build,
    /// local ones only to the changelog that declared them.
    pub global: bool,
}

impl Default for PropertyScope {
    fn default() -> Self {
        Self {
            contexts: None,
            labels: None,
            dbms: Vec::new(),
            global: true,
        }
    }
}

/// One registered property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub value: String,
    /// Physical path of the declaring changelog.
    pub changelog: String,
    pub scope: PropertyScope,
}

impl Property {
    fn applies(&self, env: &Environment) -> bool {
        let dbms_ok = match &env.dbms {
            Some(db) if !self.scope.dbms.is_empty() => self
                .scope
                .dbms
                .iter()
                .any(|d| d.eq_ignore_ascii_case(db) || d.eq_ignore_ascii_case("all")),
            _ => true,
        };
        let contexts_ok = self
            .scope
            .contexts
            .as_ref()
            .is_none_or(|expr| expr.matches(&env.contexts));
        let labels_ok = match (&self.scope.labels, &env.labels) {
            (Some(labels), Some(expr)) => LabelExpression::new(expr.as_str()).matches(labels),
            _ => true,
        };
        dbms_ok && contexts_ok && labels_ok
    }
}

/// Append-only property store shared by every changelog of one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyTable {
    entries: Vec<Property>,
    #[serde(skip)]
    environment: Environment,
    #[serde(skip)]
    max_passes: usize,
}

impl PropertyTable {
    pub fn new(environment: Environment, max_passes: usize) -> Self {
        Self {
            entries: Vec::new(),
            environment,
            max_passes,
        }
    }

    pub fn set(&mut self, property: Property) {
        tracing::debug!(
            name = %property.name,
            global = property.scope.global,
            "registered property"
        );
        self.entries.push(property);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    /// Current value of `name` as seen from `changelog`.
    ///
    /// A local entry of that changelog shadows globals; among entries of the
    /// same kind the latest registration wins. Entries whose scope does not
    /// match the build environment are invisible.
    pub fn resolve(&self, name: &str, changelog: &str) -> Option<&str> {
        let candidates = || {
            self.entries
                .iter()
                .rev()
                .filter(move |p| p.name == name && p.applies(&self.environment))
        };
        candidates()
            .find(|p| !p.scope.global && same_path(&p.changelog, changelog))
            .or_else(|| candidates().find(|p| p.scope.global))
            .map(|p| p.value.as_str())
    }

    /// Substitute `${name}` tokens until nothing changes or the pass cap is hit.
    ///
    /// Unknown tokens are left in place; see [`has_unresolved`].
    pub fn expand(&self, raw: &str, changelog: &str) -> String {
        if !raw.contains("${") {
            return raw.to_string();
        }
        let passes = if self.max_passes == 0 {
            DEFAULT_MAX_PASSES
        } else {
            self.max_passes
        };

        let mut current = raw.to_string();
        for _ in 0..passes {
            let next = TOKEN
                .replace_all(&current, |caps: &Captures| {
                    match self.resolve(caps[1].trim(), changelog) {
                        Some(value) => value.to_string(),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// True if `s` still holds a `${...}` token.
pub fn has_unresolved(s: &str) -> bool {
    TOKEN.is_match(s)
}

/// Parse Java-style `.properties` text into ordered key/value pairs.
///
/// Supports `key=value`, `key: value`, `key value`, `#` and `!` comments and
/// trailing-backslash continuations.
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut logical = String::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if logical.is_empty() && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }
        let continued = trimmed.ends_with('\\') && !trimmed.ends_with("\\\\");
        logical.push_str(trimmed.strip_suffix('\\').filter(|_| continued).unwrap_or(trimmed));
        if continued {
            continue;
        }

        let line = std::mem::take(&mut logical);
        let split = line.find(['=', ':', ' ', '\t']);
        let (key, value) = match split {
            Some(pos) => {
                let rest = line[pos..].trim_start_matches([' ', '\t']);
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .unwrap_or(rest)
                    .trim_start();
                (line[..pos].trim_end(), rest)
            }
            None => (line.as_str(), ""),
        };
        pairs.push((key.to_string(), value.trim_end().to_string()));
    }
    pairs
}
