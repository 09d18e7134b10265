use super::*;
use crate::config::{Environment, ParserConfig};
use crate::error::ChangelogError;
use pretty_assertions::assert_eq;

// ========================================================================
// Properties and ${...} expansion
// ========================================================================

fn table_names(log: &ChangeLog) -> Vec<&str> {
    log.change_sets
        .iter()
        .flat_map(|cs| cs.changes.iter())
        .filter_map(|c| c.text("tableName"))
        .collect()
}

#[test]
fn test_property_expansion() {
    let log = build(&changelog(
        r#"
        property(name: 'x', value: '1')
        changeSet(id: 'p${x}', author: 'amy') { dropTable(tableName: 't${x}') }
        "#,
    ))
    .unwrap();
    assert_eq!(log.change_sets[0].id, "p1");
    assert_eq!(table_names(&log), vec!["t1"]);
    assert_eq!(log.property("x"), Some("1"));
    assert_eq!(log.properties.len(), 1);
}

#[test]
fn test_unresolved_token_stays_literal() {
    let log = build(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(tableName: '${nope}') }",
    ))
    .unwrap();
    assert_eq!(table_names(&log), vec!["${nope}"]);
}

#[test]
fn test_expansion_is_repeated() {
    let log = build(&changelog(
        r#"
        property(name: 'qualified', value: '${schema}.person')
        property(name: 'schema', value: 'app')
        changeSet(id: '1', author: 'amy') { dropTable(tableName: '${qualified}') }
        "#,
    ))
    .unwrap();
    assert_eq!(table_names(&log), vec!["app.person"]);
}

#[test]
fn test_bare_identifier_reference() {
    let log = build(&changelog(
        r#"
        property(name: 'people', value: 'person')
        changeSet(id: '1', author: 'amy') { dropTable(tableName: people) }
        "#,
    ))
    .unwrap();
    assert_eq!(table_names(&log), vec!["person"]);

    let err = build(&changelog(
        "changeSet(id: '1', author: 'amy') { dropTable(tableName: people) }",
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        ChangelogError::MissingProperty { ref name, ref path } if name == "people" && path == MAIN
    ));
}

#[test]
fn test_properties_file() {
    let accessor = MemoryAccessor::new()
        .with_file(
            MAIN,
            changelog(
                r#"
                property(file: 'db/app.properties')
                changeSet(id: '1', author: 'amy') { dropTable(tableName: '${schema}.${table}') }
                "#,
            ),
        )
        .with_file(
            "db/app.properties",
            "# connection-independent settings\nschema=app\n! legacy comment\ntable: audit_\\\n    log\n",
        );
    let log = build_with(accessor).unwrap();
    assert_eq!(table_names(&log), vec!["app.audit_log"]);
    assert_eq!(log.property("schema"), Some("app"));
}

#[test]
fn test_properties_file_missing() {
    let err = build(&changelog("property(file: 'db/missing.properties')")).unwrap_err();
    assert!(err.is_resource());
    assert!(err.to_string().contains("db/missing.properties"));
}

#[test]
fn test_property_declaration_shapes() {
    let err = build(&changelog("property(file: 'a.properties', name: 'x', value: '1')")).unwrap_err();
    assert!(matches!(err, ChangelogError::Validation(ref m) if m.contains("not both")));

    let err = build(&changelog("property(name: 'x')")).unwrap_err();
    assert_eq!(err.to_string(), "property requires 'value'");

    let err = build(&changelog("property(global: false)")).unwrap_err();
    assert!(matches!(err, ChangelogError::Validation(_)));

    let err = build(&changelog("property(name: 'x', value: '1', scope: 'all')")).unwrap_err();
    assert!(matches!(err, ChangelogError::InvalidAttribute { ref attribute, .. } if attribute == "scope"));
}

#[test]
fn test_local_property_shadows_global() {
    let accessor = MemoryAccessor::new()
        .with_file(
            MAIN,
            changelog(
                r#"
                property(name: 'table', value: 'global_t')
                include 'db/child.qcl'
                changeSet(id: 'root', author: 'amy') { dropTable(tableName: '${table}') }
                "#,
            ),
        )
        .with_file(
            "db/child.qcl",
            changelog(
                r#"
                property(name: 'table', value: 'local_t', global: false)
                changeSet(id: 'child', author: 'amy') { dropTable(tableName: '${table}') }
                "#,
            ),
        );
    let log = build_with(accessor).unwrap();
    assert_eq!(ids(&log), vec!["child", "root"]);
    assert_eq!(table_names(&log), vec!["local_t", "global_t"]);
}

#[test]
fn test_later_global_wins() {
    let log = build(&changelog(
        r#"
        property(name: 'v', value: 'first')
        property(name: 'v', value: 'second')
        changeSet(id: '1', author: 'amy') { dropTable(tableName: '${v}') }
        "#,
    ))
    .unwrap();
    assert_eq!(table_names(&log), vec!["second"]);
}

#[test]
fn test_properties_scoped_to_environment() {
    let source = changelog(
        r#"
        property(name: 'type', value: 'bytea', dbms: 'postgresql')
        property(name: 'type', value: 'blob', dbms: 'h2, oracle')
        changeSet(id: '1', author: 'amy') {
            addColumn(tableName: 't') { column(name: 'data', type: '${type}') }
        }
        "#,
    );
    let config = ParserConfig {
        environment: Environment {
            dbms: Some("postgresql".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let log = ChangelogParser::new(MemoryAccessor::new().with_file(MAIN, source))
        .with_config(config)
        .parse(MAIN)
        .unwrap();
    let column = &log.change_sets[0].changes[0].columns[0];
    assert_eq!(column.column_type.as_deref(), Some("bytea"));
}
