//! Leaf precondition schemas.

use super::{ParamSpec, find_param};
use std::collections::BTreeMap;

/// Schema of one leaf precondition.
#[derive(Debug, Clone)]
pub struct PreconditionKind {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    /// Bare strings in the block become the check's SQL.
    pub sql_body: bool,
    /// `param(name, value)` children are collected as custom parameters.
    pub custom_params: bool,
}

impl PreconditionKind {
    pub fn new(name: &'static str, params: &'static [ParamSpec]) -> Self {
        Self {
            name,
            params,
            sql_body: false,
            custom_params: false,
        }
    }

    pub fn with_sql_body(mut self) -> Self {
        self.sql_body = true;
        self
    }

    pub fn with_custom_params(mut self) -> Self {
        self.custom_params = true;
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        find_param(self.params, name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreconditionRegistry {
    kinds: BTreeMap<&'static str, PreconditionKind>,
}

impl PreconditionRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for kind in builtin_kinds() {
            registry.kinds.insert(kind.name, kind);
        }
        registry
    }

    pub fn register(&mut self, kind: PreconditionKind) {
        if self.kinds.contains_key(kind.name) {
            tracing::debug!(kind = kind.name, "replacing registered precondition");
        }
        self.kinds.insert(kind.name, kind);
    }

    pub fn get(&self, name: &str) -> Option<&PreconditionKind> {
        self.kinds.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

const CATALOG: ParamSpec = ParamSpec::text("catalogName");
const SCHEMA: ParamSpec = ParamSpec::text("schemaName");
const TABLE: ParamSpec = ParamSpec::text("tableName").required();

const DBMS: &[ParamSpec] = &[ParamSpec::text("type").required()];
const RUNNING_AS: &[ParamSpec] = &[ParamSpec::text("username").required()];
const CHANGE_SET_EXECUTED: &[ParamSpec] = &[
    ParamSpec::text("id").required(),
    ParamSpec::text("author").required(),
    ParamSpec::text("changeLogFile").required(),
];
const COLUMN_EXISTS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
];
const TABLE_ONLY: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE];
const VIEW_EXISTS: &[ParamSpec] = &[CATALOG, SCHEMA, ParamSpec::text("viewName").required()];
const FOREIGN_KEY_EXISTS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("foreignKeyTableName"),
    ParamSpec::text("foreignKeyName").required(),
];
const INDEX_EXISTS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("tableName"),
    ParamSpec::text("columnNames"),
    ParamSpec::text("indexName"),
];
const SEQUENCE_EXISTS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("sequenceName").required(),
];
const PRIMARY_KEY_EXISTS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("tableName"),
    ParamSpec::text("primaryKeyName"),
];
const UNIQUE_EXISTS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnNames"),
    ParamSpec::text("constraintName"),
];
const SQL_CHECK: &[ParamSpec] = &[
    ParamSpec::text("expectedResult").required(),
    ParamSpec::text("sql"),
];
const PROPERTY_DEFINED: &[ParamSpec] = &[
    ParamSpec::text("property").required(),
    ParamSpec::text("value"),
];
const CUSTOM: &[ParamSpec] = &[ParamSpec::text("className").required()];
const ROW_COUNT: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::integer("expectedRows").required(),
];
const QUOTING: &[ParamSpec] = &[ParamSpec::text("strategy").required()];

fn builtin_kinds() -> Vec<PreconditionKind> {
    vec![
        PreconditionKind::new("dbms", DBMS),
        PreconditionKind::new("runningAs", RUNNING_AS),
        PreconditionKind::new("changeSetExecuted", CHANGE_SET_EXECUTED),
        PreconditionKind::new("columnExists", COLUMN_EXISTS),
        PreconditionKind::new("tableExists", TABLE_ONLY),
        PreconditionKind::new("viewExists", VIEW_EXISTS),
        PreconditionKind::new("foreignKeyConstraintExists", FOREIGN_KEY_EXISTS),
        PreconditionKind::new("indexExists", INDEX_EXISTS),
        PreconditionKind::new("sequenceExists", SEQUENCE_EXISTS),
        PreconditionKind::new("primaryKeyExists", PRIMARY_KEY_EXISTS),
        PreconditionKind::new("uniqueConstraintExists", UNIQUE_EXISTS),
        PreconditionKind::new("sqlCheck", SQL_CHECK).with_sql_body(),
        PreconditionKind::new("changeLogPropertyDefined", PROPERTY_DEFINED),
        PreconditionKind::new("customPrecondition", CUSTOM).with_custom_params(),
        PreconditionKind::new("tableIsEmpty", TABLE_ONLY),
        PreconditionKind::new("rowCount", ROW_COUNT),
        PreconditionKind::new("expectedQuotingStrategy", QUOTING),
    ]
}
