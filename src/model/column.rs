//! Column descriptors nested under table-oriented changes.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// A value (or default value) assigned to a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ColumnValue {
    Text(String),
    /// Kept as written so precision survives.
    Numeric(String),
    Boolean(bool),
    Date(DateValue),
    /// A database function or expression, passed through verbatim.
    Computed(String),
    SequenceNext(String),
    SequenceCurrent(String),
    BlobFile(String),
    ClobFile(String),
}

/// A parsed `valueDate` / `defaultValueDate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DateValue {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl ColumnValue {
    /// Numeric input that does not parse as a number is treated as computed.
    pub fn numeric(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.parse::<i64>().is_ok() || trimmed.parse::<f64>().is_ok() {
            ColumnValue::Numeric(trimmed.to_string())
        } else {
            ColumnValue::Computed(raw.to_string())
        }
    }

    /// Boolean input accepts `true`/`false` (any case) and `1`/`0`.
    pub fn boolean(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => ColumnValue::Boolean(true),
            "false" | "0" => ColumnValue::Boolean(false),
            _ => ColumnValue::Computed(raw.to_string()),
        }
    }

    /// Dates that match none of the ISO layouts are treated as computed
    /// (`now()`, `CURRENT_TIMESTAMP`, ...).
    pub fn date(raw: &str) -> Self {
        match parse_date(raw.trim()) {
            Some(date) => ColumnValue::Date(date),
            None => ColumnValue::Computed(raw.to_string()),
        }
    }
}

fn parse_date(raw: &str) -> Option<DateValue> {
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(DateValue::Date(date));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateValue::DateTime(dt));
        }
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .ok()
        .map(DateValue::Time)
}

/// Inline constraints declared on a column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub nullable: Option<bool>,
    pub not_null_constraint_name: Option<String>,
    pub primary_key: Option<bool>,
    pub primary_key_name: Option<String>,
    pub primary_key_tablespace: Option<String>,
    pub unique: Option<bool>,
    pub unique_constraint_name: Option<String>,
    pub references: Option<String>,
    pub referenced_table_catalog_name: Option<String>,
    pub referenced_table_schema_name: Option<String>,
    pub referenced_table_name: Option<String>,
    pub referenced_column_names: Option<String>,
    pub foreign_key_name: Option<String>,
    pub delete_cascade: Option<bool>,
    pub deferrable: Option<bool>,
    pub initially_deferred: Option<bool>,
    pub check_constraint: Option<String>,
    pub validate_nullable: Option<bool>,
    pub validate_unique: Option<bool>,
    pub validate_primary_key: Option<bool>,
    pub validate_foreign_key: Option<bool>,
}

/// A column descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: Option<String>,
    pub computed: Option<bool>,
    pub column_type: Option<String>,
    pub value: Option<ColumnValue>,
    pub default_value: Option<ColumnValue>,
    pub default_value_constraint_name: Option<String>,
    pub auto_increment: Option<bool>,
    pub start_with: Option<i64>,
    pub increment_by: Option<i64>,
    pub generation_type: Option<String>,
    pub default_on_null: Option<bool>,
    pub remarks: Option<String>,
    pub descending: Option<bool>,
    pub encoding: Option<String>,
    // addColumn positioning
    pub before_column: Option<String>,
    pub after_column: Option<String>,
    pub position: Option<i64>,
    // loadData mapping
    pub header: Option<String>,
    pub index: Option<i64>,
    pub constraints: Option<Constraints>,
}

impl Column {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}
