//! `column`, `param` and `constraints` children of table-oriented changes.

use super::Session;
use super::params::{Params, prefix};
use crate::error::{ChangelogError, ChangelogResult};
use crate::model::{Column, ColumnValue, Constraints};
use crate::registry::{ColumnFlavor, ParamSpec};
use crate::script::{Item, Node};

const COLUMN: &[ParamSpec] = &[
    ParamSpec::text("name"),
    ParamSpec::bool("computed"),
    ParamSpec::text("type"),
    ParamSpec::text("value"),
    ParamSpec::text("valueNumeric"),
    ParamSpec::text("valueBoolean"),
    ParamSpec::text("valueDate"),
    ParamSpec::text("valueComputed"),
    ParamSpec::text("valueSequenceNext"),
    ParamSpec::text("valueSequenceCurrent"),
    ParamSpec::text("valueBlobFile"),
    ParamSpec::text("valueClobFile"),
    ParamSpec::text("defaultValue"),
    ParamSpec::text("defaultValueNumeric"),
    ParamSpec::text("defaultValueBoolean"),
    ParamSpec::text("defaultValueDate"),
    ParamSpec::text("defaultValueComputed"),
    ParamSpec::text("defaultValueSequenceNext"),
    ParamSpec::text("defaultValueConstraintName"),
    ParamSpec::bool("autoIncrement"),
    ParamSpec::integer("startWith"),
    ParamSpec::integer("incrementBy"),
    ParamSpec::text("generationType"),
    ParamSpec::bool("defaultOnNull"),
    ParamSpec::text("remarks"),
    ParamSpec::bool("descending"),
    ParamSpec::text("encoding"),
];

const ADD_COLUMN_EXTRA: &[ParamSpec] = &[
    ParamSpec::text("beforeColumn"),
    ParamSpec::text("afterColumn"),
    ParamSpec::integer("position"),
];

const LOAD_DATA_EXTRA: &[ParamSpec] = &[ParamSpec::text("header"), ParamSpec::integer("index")];

const CONSTRAINTS: &[ParamSpec] = &[
    ParamSpec::bool("nullable"),
    ParamSpec::text("notNullConstraintName"),
    ParamSpec::bool("primaryKey"),
    ParamSpec::text("primaryKeyName"),
    ParamSpec::text("primaryKeyTablespace"),
    ParamSpec::bool("unique"),
    ParamSpec::text("uniqueConstraintName"),
    ParamSpec::text("references"),
    ParamSpec::text("referencedTableCatalogName"),
    ParamSpec::text("referencedTableSchemaName"),
    ParamSpec::text("referencedTableName"),
    ParamSpec::text("referencedColumnNames"),
    ParamSpec::text("foreignKeyName"),
    ParamSpec::bool("deleteCascade"),
    ParamSpec::bool("deferrable"),
    ParamSpec::bool("initiallyDeferred"),
    ParamSpec::text("checkConstraint"),
    ParamSpec::bool("validateNullable"),
    ParamSpec::bool("validateUnique"),
    ParamSpec::bool("validatePrimaryKey"),
    ParamSpec::bool("validateForeignKey"),
];

fn column_schema(flavor: ColumnFlavor) -> Vec<ParamSpec> {
    let extra = match flavor {
        ColumnFlavor::Standard => &[] as &[ParamSpec],
        ColumnFlavor::AddColumn => ADD_COLUMN_EXTRA,
        ColumnFlavor::LoadData => LOAD_DATA_EXTRA,
    };
    COLUMN.iter().chain(extra).copied().collect()
}

impl Session<'_> {
    /// Build one column descriptor. `column 'id'` is shorthand for `column(name: 'id')`.
    pub(crate) fn build_column(
        &self,
        path: &str,
        change_set: &str,
        flavor: ColumnFlavor,
        node: &Node,
    ) -> ChangelogResult<Column> {
        let schema = column_schema(flavor);
        let params = self.schema_params(&schema, node, path, Some(change_set), Some("name"))?;
        let mut column = column_from(&params);

        for item in node.items() {
            match item {
                Item::Node(child) if child.name == "constraints" => {
                    let params = self.schema_params(CONSTRAINTS, child, path, Some(change_set), None)?;
                    column.constraints = Some(constraints_from(&params));
                }
                Item::Node(child) => {
                    return Err(ChangelogError::unknown_element(&child.name, &node.name));
                }
                Item::Text(_) => {
                    return Err(ChangelogError::Validation(format!(
                        "{}'{}' does not take text content",
                        prefix(Some(change_set)),
                        node.name
                    )));
                }
            }
        }
        Ok(column)
    }
}

fn owned(params: &Params, name: &str) -> Option<String> {
    params.text(name).map(str::to_string)
}

fn column_from(params: &Params) -> Column {
    let mut column = Column {
        name: owned(params, "name"),
        computed: params.flag("computed"),
        column_type: owned(params, "type"),
        default_value_constraint_name: owned(params, "defaultValueConstraintName"),
        auto_increment: params.flag("autoIncrement"),
        start_with: params.int("startWith"),
        increment_by: params.int("incrementBy"),
        generation_type: owned(params, "generationType"),
        default_on_null: params.flag("defaultOnNull"),
        remarks: owned(params, "remarks"),
        descending: params.flag("descending"),
        encoding: owned(params, "encoding"),
        before_column: owned(params, "beforeColumn"),
        after_column: owned(params, "afterColumn"),
        position: params.int("position"),
        header: owned(params, "header"),
        index: params.int("index"),
        ..Default::default()
    };

    let values: [(&str, fn(&str) -> ColumnValue); 9] = [
        ("value", |s| ColumnValue::Text(s.to_string())),
        ("valueNumeric", ColumnValue::numeric),
        ("valueBoolean", ColumnValue::boolean),
        ("valueDate", ColumnValue::date),
        ("valueComputed", |s| ColumnValue::Computed(s.to_string())),
        ("valueSequenceNext", |s| ColumnValue::SequenceNext(s.to_string())),
        ("valueSequenceCurrent", |s| ColumnValue::SequenceCurrent(s.to_string())),
        ("valueBlobFile", |s| ColumnValue::BlobFile(s.to_string())),
        ("valueClobFile", |s| ColumnValue::ClobFile(s.to_string())),
    ];
    for (name, make) in values {
        if let Some(raw) = params.text(name) {
            column.value = Some(make(raw));
        }
    }

    let defaults: [(&str, fn(&str) -> ColumnValue); 6] = [
        ("defaultValue", |s| ColumnValue::Text(s.to_string())),
        ("defaultValueNumeric", ColumnValue::numeric),
        ("defaultValueBoolean", ColumnValue::boolean),
        ("defaultValueDate", ColumnValue::date),
        ("defaultValueComputed", |s| ColumnValue::Computed(s.to_string())),
        ("defaultValueSequenceNext", |s| ColumnValue::SequenceNext(s.to_string())),
    ];
    for (name, make) in defaults {
        if let Some(raw) = params.text(name) {
            column.default_value = Some(make(raw));
        }
    }
    column
}

fn constraints_from(params: &Params) -> Constraints {
    Constraints {
        nullable: params.flag("nullable"),
        not_null_constraint_name: owned(params, "notNullConstraintName"),
        primary_key: params.flag("primaryKey"),
        primary_key_name: owned(params, "primaryKeyName"),
        primary_key_tablespace: owned(params, "primaryKeyTablespace"),
        unique: params.flag("unique"),
        unique_constraint_name: owned(params, "uniqueConstraintName"),
        references: owned(params, "references"),
        referenced_table_catalog_name: owned(params, "referencedTableCatalogName"),
        referenced_table_schema_name: owned(params, "referencedTableSchemaName"),
        referenced_table_name: owned(params, "referencedTableName"),
        referenced_column_names: owned(params, "referencedColumnNames"),
        foreign_key_name: owned(params, "foreignKeyName"),
        delete_cascade: params.flag("deleteCascade"),
        deferrable: params.flag("deferrable"),
        initially_deferred: params.flag("initiallyDeferred"),
        check_constraint: owned(params, "checkConstraint"),
        validate_nullable: params.flag("validateNullable"),
        validate_unique: params.flag("validateUnique"),
        validate_primary_key: params.flag("validatePrimaryKey"),
        validate_foreign_key: params.flag("validateForeignKey"),
    }
}
