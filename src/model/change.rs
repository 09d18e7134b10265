//! A single typed change operation.

use super::column::Column;
use super::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// One change inside a changeset (`createTable`, `sql`, `customChange`, ...).
///
/// Which `params` keys may appear is fixed by the kind's schema in the
/// [`ChangeRegistry`](crate::registry::ChangeRegistry); the builder rejects
/// anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub kind: String,
    pub params: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub where_params: Vec<Column>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_params: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Change {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
            columns: Vec::new(),
            where_clause: None,
            where_params: Vec::new(),
            args: Vec::new(),
            custom_params: Vec::new(),
            comment: None,
        }
    }

    /// Raw SQL change, the shape rollback SQL strings are stored in.
    pub fn raw_sql(sql: impl Into<String>) -> Self {
        let mut change = Self::new("sql");
        change.set("sql", Value::Text(sql.into()));
        change
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }
}
