//! Change-kind schemas.

use super::{ParamSpec, find_param};
use crate::error::{ChangelogError, ChangelogResult, Warning};
use crate::model::{Change, Value};
use std::collections::BTreeMap;

/// Post-build hook for kinds whose rules a flat schema cannot express.
pub type FinishHook = fn(&mut Change, &mut FinishContext<'_>) -> ChangelogResult<()>;

/// What a finish hook can see besides the change itself.
pub struct FinishContext<'a> {
    pub change_set: &'a str,
    pub warnings: &'a mut Vec<Warning>,
}

impl FinishContext<'_> {
    /// Record a non-fatal diagnostic.
    pub fn warn(&mut self, message: impl Into<String>) {
        let warning = Warning {
            change_set: Some(self.change_set.to_string()),
            message: message.into(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Which column attributes a kind's `column` children accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFlavor {
    Standard,
    /// Adds `beforeColumn`, `afterColumn` and `position`.
    AddColumn,
    /// Adds `header` and `index`.
    LoadData,
}

/// Schema and nested-block capabilities of one change kind.
#[derive(Debug, Clone)]
pub struct ChangeKind {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    /// Parameter set by the bare form `kind 'text'`.
    pub text_param: Option<&'static str>,
    pub columns: Option<ColumnFlavor>,
    pub where_clause: bool,
    /// Parameter that bare strings in the block are appended to.
    pub body: Option<&'static str>,
    pub args: bool,
    pub custom_params: bool,
    pub comment: bool,
    pub finish: Option<FinishHook>,
}

impl ChangeKind {
    pub fn new(name: &'static str, params: &'static [ParamSpec]) -> Self {
        Self {
            name,
            params,
            text_param: None,
            columns: None,
            where_clause: false,
            body: None,
            args: false,
            custom_params: false,
            comment: false,
            finish: None,
        }
    }

    pub fn text_form(mut self, param: &'static str) -> Self {
        self.text_param = Some(param);
        self
    }

    pub fn with_columns(mut self, flavor: ColumnFlavor) -> Self {
        self.columns = Some(flavor);
        self
    }

    pub fn with_where(mut self) -> Self {
        self.where_clause = true;
        self
    }

    pub fn with_body(mut self, param: &'static str) -> Self {
        self.body = Some(param);
        self
    }

    pub fn with_args(mut self) -> Self {
        self.args = true;
        self
    }

    pub fn with_custom_params(mut self) -> Self {
        self.custom_params = true;
        self
    }

    pub fn with_comment(mut self) -> Self {
        self.comment = true;
        self
    }

    pub fn finish(mut self, hook: FinishHook) -> Self {
        self.finish = Some(hook);
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        find_param(self.params, name)
    }
}

/// Name -> kind dispatch table.
#[derive(Debug, Clone, Default)]
pub struct ChangeRegistry {
    kinds: BTreeMap<&'static str, ChangeKind>,
}

impl ChangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in kind.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in builtin_kinds() {
            registry.kinds.insert(kind.name, kind);
        }
        registry
    }

    /// Add a kind, replacing any earlier one with the same name.
    pub fn register(&mut self, kind: ChangeKind) {
        if self.kinds.contains_key(kind.name) {
            tracing::debug!(kind = kind.name, "replacing registered change kind");
        }
        self.kinds.insert(kind.name, kind);
    }

    pub fn get(&self, name: &str) -> Option<&ChangeKind> {
        self.kinds.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
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

const ADD_AUTO_INCREMENT: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("columnDataType"),
    ParamSpec::integer("startWith"),
    ParamSpec::integer("incrementBy"),
    ParamSpec::bool("defaultOnNull"),
    ParamSpec::text("generationType"),
];

const ADD_COLUMN: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE];

const ADD_DEFAULT_VALUE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("columnDataType"),
    ParamSpec::text("defaultValue"),
    ParamSpec::number("defaultValueNumeric"),
    ParamSpec::bool("defaultValueBoolean"),
    ParamSpec::text("defaultValueDate"),
    ParamSpec::text("defaultValueComputed"),
    ParamSpec::text("defaultValueSequenceNext"),
    ParamSpec::text("defaultValueConstraintName"),
];

const ADD_FOREIGN_KEY: &[ParamSpec] = &[
    ParamSpec::text("baseTableCatalogName"),
    ParamSpec::text("baseTableSchemaName"),
    ParamSpec::text("baseTableName").required(),
    ParamSpec::text("baseColumnNames").required(),
    ParamSpec::text("constraintName").required(),
    ParamSpec::text("referencedTableCatalogName"),
    ParamSpec::text("referencedTableSchemaName"),
    ParamSpec::text("referencedTableName").required(),
    ParamSpec::text("referencedColumnNames").required(),
    ParamSpec::bool("deferrable"),
    ParamSpec::bool("initiallyDeferred"),
    ParamSpec::text("onDelete"),
    ParamSpec::text("onUpdate"),
    ParamSpec::bool("deleteCascade"),
    ParamSpec::bool("referencesUniqueColumn"),
    ParamSpec::bool("validate"),
];

const ADD_LOOKUP_TABLE: &[ParamSpec] = &[
    ParamSpec::text("existingTableCatalogName"),
    ParamSpec::text("existingTableSchemaName"),
    ParamSpec::text("existingTableName").required(),
    ParamSpec::text("existingColumnName").required(),
    ParamSpec::text("newTableCatalogName"),
    ParamSpec::text("newTableSchemaName"),
    ParamSpec::text("newTableName").required(),
    ParamSpec::text("newColumnName").required(),
    ParamSpec::text("newColumnDataType"),
    ParamSpec::text("constraintName"),
];

const ADD_NOT_NULL: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("defaultNullValue"),
    ParamSpec::text("columnDataType"),
    ParamSpec::text("constraintName"),
    ParamSpec::bool("validate"),
];

const ADD_PRIMARY_KEY: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnNames").required(),
    ParamSpec::text("constraintName"),
    ParamSpec::text("tablespace"),
    ParamSpec::bool("clustered"),
    ParamSpec::text("forIndexCatalogName"),
    ParamSpec::text("forIndexSchemaName"),
    ParamSpec::text("forIndexName"),
    ParamSpec::bool("validate"),
];

const ADD_UNIQUE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnNames").required(),
    ParamSpec::text("constraintName"),
    ParamSpec::text("tablespace"),
    ParamSpec::bool("deferrable"),
    ParamSpec::bool("initiallyDeferred"),
    ParamSpec::bool("disabled"),
    ParamSpec::bool("clustered"),
    ParamSpec::text("forIndexCatalogName"),
    ParamSpec::text("forIndexSchemaName"),
    ParamSpec::text("forIndexName"),
    ParamSpec::bool("validate"),
];

const ALTER_SEQUENCE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("sequenceName").required(),
    ParamSpec::number("incrementBy"),
    ParamSpec::number("maxValue"),
    ParamSpec::number("minValue"),
    ParamSpec::bool("ordered"),
    ParamSpec::number("cacheSize"),
    ParamSpec::bool("cycle"),
    ParamSpec::text("dataType"),
];

const CREATE_INDEX: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("indexName"),
    ParamSpec::bool("unique"),
    ParamSpec::text("tablespace"),
    ParamSpec::bool("clustered"),
    ParamSpec::text("associatedWith"),
];

const CREATE_PROCEDURE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("procedureName"),
    ParamSpec::text("procedureText"),
    ParamSpec::text("path"),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("encoding"),
    ParamSpec::text("dbms"),
    ParamSpec::text("comments"),
    ParamSpec::bool("replaceIfExists"),
];

const CREATE_SEQUENCE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("sequenceName").required(),
    ParamSpec::number("startValue"),
    ParamSpec::number("incrementBy"),
    ParamSpec::number("maxValue"),
    ParamSpec::number("minValue"),
    ParamSpec::bool("ordered"),
    ParamSpec::bool("cycle"),
    ParamSpec::number("cacheSize"),
    ParamSpec::text("dataType"),
];

const CREATE_TABLE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("tablespace"),
    ParamSpec::text("remarks"),
    ParamSpec::bool("ifNotExists"),
];

const CREATE_VIEW: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("viewName").required(),
    ParamSpec::text("selectQuery"),
    ParamSpec::bool("replaceIfExists"),
    ParamSpec::bool("fullDefinition"),
    ParamSpec::text("path"),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("encoding"),
    ParamSpec::text("remarks"),
];

const CUSTOM_CHANGE: &[ParamSpec] = &[ParamSpec::text("class")];

const DELETE: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE];

const DROP_ALL_FOREIGN_KEYS: &[ParamSpec] = &[
    ParamSpec::text("baseTableCatalogName"),
    ParamSpec::text("baseTableSchemaName"),
    ParamSpec::text("baseTableName").required(),
];

const DROP_COLUMN: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE, ParamSpec::text("columnName")];

const DROP_DEFAULT_VALUE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("columnDataType"),
];

const DROP_FOREIGN_KEY: &[ParamSpec] = &[
    ParamSpec::text("baseTableCatalogName"),
    ParamSpec::text("baseTableSchemaName"),
    ParamSpec::text("baseTableName").required(),
    ParamSpec::text("constraintName").required(),
];

const DROP_INDEX: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("tableName"),
    ParamSpec::text("indexName").required(),
    ParamSpec::text("associatedWith"),
];

const DROP_NOT_NULL: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("columnDataType"),
    ParamSpec::text("constraintName"),
];

const DROP_PRIMARY_KEY: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("constraintName"),
    ParamSpec::bool("dropIndex"),
];

const DROP_PROCEDURE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("procedureName").required(),
];

const DROP_SEQUENCE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("sequenceName").required(),
];

const DROP_TABLE: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE, ParamSpec::bool("cascadeConstraints")];

const DROP_UNIQUE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("constraintName"),
    ParamSpec::text("uniqueColumns"),
];

const DROP_VIEW: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("viewName").required(),
    ParamSpec::bool("ifExists"),
];

const EXECUTE_COMMAND: &[ParamSpec] = &[
    ParamSpec::text("executable").required(),
    ParamSpec::text("os"),
    ParamSpec::text("timeout"),
];

const INSERT: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE, ParamSpec::text("dbms")];

const LOAD_DATA: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("file").required(),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("encoding"),
    ParamSpec::text("separator"),
    ParamSpec::text("quotchar"),
    ParamSpec::text("commentLineStartsWith"),
    ParamSpec::bool("usePreparedStatements"),
];

const LOAD_UPDATE_DATA: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("file").required(),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("encoding"),
    ParamSpec::text("separator"),
    ParamSpec::text("quotchar"),
    ParamSpec::text("commentLineStartsWith"),
    ParamSpec::bool("usePreparedStatements"),
    ParamSpec::text("primaryKey").required(),
    ParamSpec::bool("onlyUpdate"),
];

const MERGE_COLUMNS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("column1Name").required(),
    ParamSpec::text("joinString"),
    ParamSpec::text("column2Name").required(),
    ParamSpec::text("finalColumnName").required(),
    ParamSpec::text("finalColumnType").required(),
];

const MODIFY_DATA_TYPE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("newDataType").required(),
];

const OUTPUT: &[ParamSpec] = &[ParamSpec::text("message"), ParamSpec::text("target")];

const RENAME_COLUMN: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("oldColumnName").required(),
    ParamSpec::text("newColumnName").required(),
    ParamSpec::text("columnDataType"),
    ParamSpec::text("remarks"),
];

const RENAME_SEQUENCE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("oldSequenceName").required(),
    ParamSpec::text("newSequenceName").required(),
];

const RENAME_TABLE: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("oldTableName").required(),
    ParamSpec::text("newTableName").required(),
];

const RENAME_VIEW: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    ParamSpec::text("oldViewName").required(),
    ParamSpec::text("newViewName").required(),
];

const SET_COLUMN_REMARKS: &[ParamSpec] = &[
    CATALOG,
    SCHEMA,
    TABLE,
    ParamSpec::text("columnName").required(),
    ParamSpec::text("remarks"),
    ParamSpec::text("columnDataType"),
    ParamSpec::text("columnParentType"),
];

const SET_TABLE_REMARKS: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE, ParamSpec::text("remarks")];

const SQL: &[ParamSpec] = &[
    ParamSpec::text("sql").required(),
    ParamSpec::text("dbms"),
    ParamSpec::text("endDelimiter"),
    ParamSpec::bool("splitStatements"),
    ParamSpec::bool("stripComments"),
];

const SQL_FILE: &[ParamSpec] = &[
    ParamSpec::text("path").required(),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("encoding"),
    ParamSpec::text("dbms"),
    ParamSpec::text("endDelimiter"),
    ParamSpec::bool("splitStatements"),
    ParamSpec::bool("stripComments"),
];

const STOP: &[ParamSpec] = &[ParamSpec::text("message")];

const TAG_DATABASE: &[ParamSpec] = &[ParamSpec::text("tag").required()];

const UPDATE: &[ParamSpec] = &[CATALOG, SCHEMA, TABLE];

fn builtin_kinds() -> Vec<ChangeKind> {
    use ColumnFlavor::*;

    vec![
        ChangeKind::new("addAutoIncrement", ADD_AUTO_INCREMENT),
        ChangeKind::new("addColumn", ADD_COLUMN).with_columns(AddColumn),
        ChangeKind::new("addDefaultValue", ADD_DEFAULT_VALUE),
        ChangeKind::new("addForeignKeyConstraint", ADD_FOREIGN_KEY).finish(finish_foreign_key),
        ChangeKind::new("addLookupTable", ADD_LOOKUP_TABLE),
        ChangeKind::new("addNotNullConstraint", ADD_NOT_NULL),
        ChangeKind::new("addPrimaryKey", ADD_PRIMARY_KEY),
        ChangeKind::new("addUniqueConstraint", ADD_UNIQUE),
        ChangeKind::new("alterSequence", ALTER_SEQUENCE),
        ChangeKind::new("createIndex", CREATE_INDEX).with_columns(Standard),
        ChangeKind::new("createProcedure", CREATE_PROCEDURE)
            .text_form("procedureText")
            .with_body("procedureText")
            .with_comment()
            .finish(finish_procedure),
        ChangeKind::new("createSequence", CREATE_SEQUENCE),
        ChangeKind::new("createTable", CREATE_TABLE).with_columns(Standard),
        ChangeKind::new("createView", CREATE_VIEW)
            .with_body("selectQuery")
            .finish(finish_view),
        ChangeKind::new("customChange", CUSTOM_CHANGE)
            .with_custom_params()
            .finish(finish_custom_change),
        ChangeKind::new("delete", DELETE).with_where(),
        ChangeKind::new("dropAllForeignKeyConstraints", DROP_ALL_FOREIGN_KEYS),
        ChangeKind::new("dropColumn", DROP_COLUMN).with_columns(Standard),
        ChangeKind::new("dropDefaultValue", DROP_DEFAULT_VALUE),
        ChangeKind::new("dropForeignKeyConstraint", DROP_FOREIGN_KEY),
        ChangeKind::new("dropIndex", DROP_INDEX),
        ChangeKind::new("dropNotNullConstraint", DROP_NOT_NULL),
        ChangeKind::new("dropPrimaryKey", DROP_PRIMARY_KEY),
        ChangeKind::new("dropProcedure", DROP_PROCEDURE),
        ChangeKind::new("dropSequence", DROP_SEQUENCE),
        ChangeKind::new("dropTable", DROP_TABLE),
        ChangeKind::new("dropUniqueConstraint", DROP_UNIQUE),
        ChangeKind::new("dropView", DROP_VIEW),
        ChangeKind::new("empty", &[]),
        ChangeKind::new("executeCommand", EXECUTE_COMMAND).with_args(),
        ChangeKind::new("insert", INSERT).with_columns(Standard),
        ChangeKind::new("loadData", LOAD_DATA).with_columns(LoadData),
        ChangeKind::new("loadUpdateData", LOAD_UPDATE_DATA).with_columns(LoadData),
        ChangeKind::new("mergeColumns", MERGE_COLUMNS),
        ChangeKind::new("modifyDataType", MODIFY_DATA_TYPE),
        ChangeKind::new("output", OUTPUT)
            .text_form("message")
            .finish(finish_output),
        ChangeKind::new("renameColumn", RENAME_COLUMN),
        ChangeKind::new("renameSequence", RENAME_SEQUENCE),
        ChangeKind::new("renameTable", RENAME_TABLE),
        ChangeKind::new("renameView", RENAME_VIEW),
        ChangeKind::new("setColumnRemarks", SET_COLUMN_REMARKS),
        ChangeKind::new("setTableRemarks", SET_TABLE_REMARKS),
        ChangeKind::new("sql", SQL)
            .text_form("sql")
            .with_body("sql")
            .with_comment(),
        ChangeKind::new("sqlFile", SQL_FILE).with_comment(),
        ChangeKind::new("stop", STOP).text_form("message"),
        ChangeKind::new("tagDatabase", TAG_DATABASE).text_form("tag"),
        ChangeKind::new("update", UPDATE)
            .with_columns(Standard)
            .with_where(),
    ]
}

fn finish_output(change: &mut Change, _: &mut FinishContext<'_>) -> ChangelogResult<()> {
    if !change.has("target") {
        change.set("target", Value::from("STDERR"));
    }
    Ok(())
}

fn finish_foreign_key(change: &mut Change, cx: &mut FinishContext<'_>) -> ChangelogResult<()> {
    if change.has("referencesUniqueColumn") {
        cx.warn(
            "addForeignKeyConstraint's referencesUniqueColumn parameter has been deprecated, \
             and may be removed in a future release. Consider removing it, as the host ignores it anyway.",
        );
    }
    if change.flag("deleteCascade") == Some(true) && !change.has("onDelete") {
        change.set("onDelete", Value::from("CASCADE"));
    }
    Ok(())
}

fn reject_inline_with_path(change: &Change, inline: &str, cx: &FinishContext<'_>) -> ChangelogResult<()> {
    if change.has("path") && change.has(inline) {
        return Err(ChangelogError::Validation(format!(
            "ChangeSet '{}': {} cannot have both a 'path' and a '{}'",
            cx.change_set, change.kind, inline
        )));
    }
    Ok(())
}

fn finish_procedure(change: &mut Change, cx: &mut FinishContext<'_>) -> ChangelogResult<()> {
    reject_inline_with_path(change, "procedureText", cx)
}

fn finish_view(change: &mut Change, cx: &mut FinishContext<'_>) -> ChangelogResult<()> {
    reject_inline_with_path(change, "selectQuery", cx)
}

fn finish_custom_change(change: &mut Change, cx: &mut FinishContext<'_>) -> ChangelogResult<()> {
    if !change.has("class") {
        return Err(ChangelogError::missing_attribute(
            "customChange",
            "class",
            Some(cx.change_set),
        ));
    }
    Ok(())
}
