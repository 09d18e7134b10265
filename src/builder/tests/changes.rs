use super::*;
use crate::error::ChangelogError;
use crate::model::{ColumnValue, Value};
use pretty_assertions::assert_eq;

// ========================================================================
// Change kinds and schemas
// ========================================================================

#[test]
fn test_drop_table_scenario() {
    let log = build(&changelog(
        "changeSet(id: 's1', author: 'a') {\n  dropTable(tableName: 'monkey')\n}",
    ))
    .unwrap();

    assert_eq!(log.change_sets.len(), 1);
    let cs = &log.change_sets[0];
    assert_eq!(cs.id, "s1");
    assert_eq!(cs.author, "a");
    assert_eq!(cs.file_path, MAIN);
    assert_eq!(cs.changes.len(), 1);
    assert_eq!(cs.changes[0].kind, "dropTable");
    assert_eq!(cs.changes[0].text("tableName"), Some("monkey"));
    assert!(cs.rollback.is_empty());
    assert!(!cs.ignore);
    assert!(cs.run_in_transaction);
}

#[test]
fn test_unknown_attribute_names_the_key() {
    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(tableName: 't', bogus: 'x') }",
    ))
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "ChangeSet '1': 'bogus' is not a valid dropTable attribute"
    );
}

#[test]
fn test_unknown_change_kind() {
    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { frobnicate(tableName: 't') }",
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        ChangelogError::UnknownChange { ref kind, ref change_set } if kind == "frobnicate" && change_set == "1"
    ));
}

#[test]
fn test_partial_parameters_left_to_host() {
    let cs = single_change_set(
        "dropTable(cascadeConstraints: true)\nrenameColumn(tableName: 't', oldColumnName: 'a')\ndropTable()",
    );
    assert_eq!(cs.changes.len(), 3);
    assert_eq!(cs.changes[0].flag("cascadeConstraints"), Some(true));
    assert_eq!(cs.changes[0].text("tableName"), None);
    assert_eq!(cs.changes[1].text("oldColumnName"), Some("a"));
    assert!(!cs.changes[1].has("newColumnName"));
    assert!(cs.changes[2].params.is_empty());
}

#[test]
fn test_strict_parameters_reject_missing_required() {
    let err = build_strict(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(cascadeConstraints: true) }",
    ))
    .unwrap_err();
    assert_eq!(err.to_string(), "ChangeSet '1': dropTable requires 'tableName'");

    let err = build_strict(&changelog(
        "changeSet(id: '1', author: 'amy') { renameColumn(tableName: 't', oldColumnName: 'a') }",
    ))
    .unwrap_err();
    assert_eq!(err.to_string(), "ChangeSet '1': renameColumn requires 'newColumnName'");
}

#[test]
fn test_bool_parameter_coercion() {
    let cs = single_change_set("dropTable(tableName: 't', cascadeConstraints: 'TRUE')");
    assert_eq!(cs.changes[0].flag("cascadeConstraints"), Some(true));

    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(tableName: 't', cascadeConstraints: 'maybe') }",
    ))
    .unwrap_err();
    assert!(matches!(err, ChangelogError::InvalidValue { ref attribute, .. } if attribute == "cascadeConstraints"));
}

#[test]
fn test_create_table_columns() {
    let cs = single_change_set(
        r#"
        createTable(tableName: 'person') {
            column(name: 'id', type: 'int', autoIncrement: true) {
                constraints(primaryKey: true, nullable: false)
            }
            column 'name'
            column(name: 'joined', type: 'date', defaultValueDate: '2024-01-31')
        }
        "#,
    );
    let change = &cs.changes[0];
    assert_eq!(change.columns.len(), 3);

    let id = &change.columns[0];
    assert_eq!(id.name.as_deref(), Some("id"));
    assert_eq!(id.column_type.as_deref(), Some("int"));
    assert_eq!(id.auto_increment, Some(true));
    let constraints = id.constraints.as_ref().unwrap();
    assert_eq!(constraints.primary_key, Some(true));
    assert_eq!(constraints.nullable, Some(false));

    assert_eq!(change.columns[1].name.as_deref(), Some("name"));
    assert!(matches!(change.columns[2].default_value, Some(ColumnValue::Date(_))));
}

#[test]
fn test_column_value_fallbacks() {
    let cs = single_change_set(
        "insert(tableName: 't') {\n  column(name: 'n', valueNumeric: 'nextval()')\n  column(name: 'b', valueBoolean: 1)\n}",
    );
    let columns = &cs.changes[0].columns;
    assert_eq!(columns[0].value, Some(ColumnValue::Computed("nextval()".into())));
    assert_eq!(columns[1].value, Some(ColumnValue::Boolean(true)));
}

#[test]
fn test_add_column_position_hints() {
    let cs = single_change_set(
        "addColumn(tableName: 't') { column(name: 'c', type: 'int', afterColumn: 'b') }",
    );
    assert_eq!(cs.changes[0].columns[0].after_column.as_deref(), Some("b"));

    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { createTable(tableName: 't') { column(name: 'c', afterColumn: 'b') } }",
    ))
    .unwrap_err();
    assert!(matches!(err, ChangelogError::InvalidAttribute { ref attribute, .. } if attribute == "afterColumn"));
}

#[test]
fn test_columns_not_allowed() {
    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(tableName: 't') { column 'x' } }",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("columns are not allowed in 'dropTable' changes"));
}

#[test]
fn test_where_clause_support() {
    let cs = single_change_set(
        r#"
        update(tableName: 'person') {
            column(name: 'active', valueBoolean: false)
            where "id = :value"
            whereParams { param(name: 'id', valueNumeric: 5) }
        }
        "#,
    );
    let change = &cs.changes[0];
    assert_eq!(change.where_clause.as_deref(), Some("id = :value"));
    assert_eq!(change.where_params.len(), 1);
    assert_eq!(change.where_params[0].value, Some(ColumnValue::Numeric("5".into())));

    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { createTable(tableName: 't') { where 'x = 1' } }",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("a where clause is invalid for 'createTable' changes"));
}

#[test]
fn test_sql_forms() {
    let cs = single_change_set(
        r#"
        sql 'select 1'
        sql(splitStatements: 'false') {
            comment 'two statements'
            "insert into t values (1)"
            "insert into t values (2)"
        }
        "#,
    );
    assert_eq!(cs.changes[0].text("sql"), Some("select 1"));

    let block = &cs.changes[1];
    assert_eq!(
        block.text("sql"),
        Some("insert into t values (1)\ninsert into t values (2)")
    );
    assert_eq!(block.flag("splitStatements"), Some(false));
    assert_eq!(block.comment.as_deref(), Some("two statements"));
}

#[test]
fn test_text_body_rejected_without_target() {
    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(tableName: 't') { 'drop it' } }",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("'dropTable' does not take a SQL body"));
}

#[test]
fn test_bare_value_needs_text_form() {
    let err = build(&changelog("changeSet(id: '1', author: 'amy') { dropTable 'monkey' }"))
        .unwrap_err();
    assert!(err.to_string().contains("does not accept a bare value"));
}

#[test]
fn test_output_defaults_target() {
    let cs = single_change_set("output 'hello'\noutput(message: 'bye', target: 'STDOUT')");
    assert_eq!(cs.changes[0].text("message"), Some("hello"));
    assert_eq!(cs.changes[0].text("target"), Some("STDERR"));
    assert_eq!(cs.changes[1].text("target"), Some("STDOUT"));
}

#[test]
fn test_foreign_key_deprecation_warning() {
    let source = changelog(
        r#"
        changeSet(id: 'fk', author: 'amy') {
            addForeignKeyConstraint(
                baseTableName: 'orders', baseColumnNames: 'person_id',
                constraintName: 'fk_orders_person',
                referencedTableName: 'person', referencedColumnNames: 'id',
                referencesUniqueColumn: true, deleteCascade: true,
            )
        }
        "#,
    );
    let log = build(&source).unwrap();
    let change = &log.change_sets[0].changes[0];
    assert_eq!(change.text("onDelete"), Some("CASCADE"));
    assert_eq!(log.warnings.len(), 1);
    assert_eq!(log.warnings[0].change_set.as_deref(), Some("fk"));
    assert!(log.warnings[0].message.contains("referencesUniqueColumn"));
}

#[test]
fn test_custom_change_params() {
    let cs = single_change_set(
        "customChange(class: 'com.example.Fixup') {\n  param(name: 'table', value: 'person')\n  param('mode', 'fast')\n}",
    );
    let change = &cs.changes[0];
    assert_eq!(change.text("class"), Some("com.example.Fixup"));
    assert_eq!(
        change.custom_params,
        vec![
            ("table".to_string(), "person".to_string()),
            ("mode".to_string(), "fast".to_string()),
        ]
    );

    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { customChange { param('a', 'b') } }",
    ))
    .unwrap_err();
    assert_eq!(err.to_string(), "ChangeSet '1': customChange requires 'class'");
}

#[test]
fn test_execute_command_args() {
    let cs = single_change_set("executeCommand(executable: 'ls') {\n  arg '-l'\n  arg(value: '/tmp')\n}");
    assert_eq!(cs.changes[0].args, vec!["-l".to_string(), "/tmp".to_string()]);
}

#[test]
fn test_view_rejects_path_and_query() {
    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { createView(viewName: 'v', path: 'v.sql') { 'select 1' } }",
    ))
    .unwrap_err();
    assert!(matches!(err, ChangelogError::Validation(ref m) if m.contains("both a 'path' and a 'selectQuery'")));
}

#[test]
fn test_integer_fallback_from_text() {
    let cs = single_change_set("createSequence(sequenceName: 's', startValue: '100')");
    assert_eq!(cs.changes[0].get("startValue"), Some(&Value::Int(100)));
}

#[test]
fn test_whole_float_outside_integer_range() {
    let cs = single_change_set("addAutoIncrement(tableName: 't', columnName: 'id', startWith: 10.0)");
    assert_eq!(cs.changes[0].int("startWith"), Some(10));

    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { addAutoIncrement(tableName: 't', columnName: 'id', startWith: 100000000000000000000.0) }",
    ))
    .unwrap_err();
    assert!(matches!(err, ChangelogError::InvalidValue { ref attribute, .. } if attribute == "startWith"));
}
