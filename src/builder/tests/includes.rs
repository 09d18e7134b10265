use super::*;
use crate::error::ChangelogError;
use crate::model::{ContextExpression, Labels, Precondition};
use crate::registry::Plugin;
use crate::resource::{FileSystemAccessor, IncludeFilter};
use pretty_assertions::assert_eq;
use std::fs;

fn change_set(id: &str) -> String {
    changelog(&format!("changeSet(id: '{}', author: 'amy') {{ empty() }}", id))
}

// ========================================================================
// include
// ========================================================================

#[test]
fn test_include_splices_in_place() {
    let accessor = MemoryAccessor::new()
        .with_file(
            MAIN,
            changelog(
                r#"
                changeSet(id: 'root1', author: 'amy') { empty() }
                include(file: 'db/child.qcl')
                changeSet(id: 'root2', author: 'amy') { empty() }
                "#,
            ),
        )
        .with_file("db/child.qcl", change_set("c1"));
    let log = build_with(accessor).unwrap();

    assert_eq!(ids(&log), vec!["root1", "c1", "root2"]);
    let child = &log.change_sets[1];
    assert_eq!(child.file_path, "db/child.qcl");
    assert_eq!(child.changelog_path, "db/child.qcl");
}

#[test]
fn test_include_relative_and_command_form() {
    let accessor = MemoryAccessor::new()
        .with_file(
            MAIN,
            changelog("include(file: 'parts/a.qcl', relativeToChangelogFile: true)\ninclude 'db/parts/b.qcl'"),
        )
        .with_file("db/parts/a.qcl", change_set("a"))
        .with_file("db/parts/b.qcl", change_set("b"));
    let log = build_with(accessor).unwrap();
    assert_eq!(ids(&log), vec!["a", "b"]);
}

#[test]
fn test_include_passes_filters_down() {
    let accessor = MemoryAccessor::new()
        .with_file(
            MAIN,
            changelog("include(file: 'db/a.qcl', context: 'outer', labels: 'l1', ignore: true)"),
        )
        .with_file(
            "db/a.qcl",
            r#"
            databaseChangeLog(context: 'a-level') {
                changeSet(id: 'a1', author: 'amy') { empty() }
                include(file: 'db/b.qcl', context: 'inner')
            }
            "#,
        )
        .with_file("db/b.qcl", change_set("b1"));
    let log = build_with(accessor).unwrap();
    assert_eq!(ids(&log), vec!["a1", "b1"]);

    let a1 = &log.change_sets[0];
    assert_eq!(
        a1.inherited_contexts,
        vec![ContextExpression::new("outer"), ContextExpression::new("a-level")]
    );
    assert_eq!(a1.inherited_labels, vec![Labels::parse("l1")]);
    assert!(a1.ignore);

    let b1 = &log.change_sets[1];
    assert_eq!(
        b1.inherited_contexts,
        vec![
            ContextExpression::new("outer"),
            ContextExpression::new("a-level"),
            ContextExpression::new("inner"),
        ]
    );
    assert!(b1.ignore);
}

#[test]
fn test_include_cycle_detected() {
    let accessor = MemoryAccessor::new()
        .with_file(MAIN, changelog("include(file: 'db/b.qcl')"))
        .with_file("db/b.qcl", changelog("include(file: 'db/changelog.qcl')"));
    let err = build_with(accessor).unwrap_err();
    match err {
        ChangelogError::CircularInclude { path, chain } => {
            assert_eq!(path, MAIN);
            assert_eq!(chain, "db/changelog.qcl -> db/b.qcl -> db/changelog.qcl");
        }
        other => panic!("expected CircularInclude, got {:?}", other),
    }
}

#[test]
fn test_include_same_file_twice_is_not_a_cycle() {
    let accessor = MemoryAccessor::new()
        .with_file(MAIN, changelog("include 'db/a.qcl'\ninclude 'db/a.qcl'"))
        .with_file("db/a.qcl", change_set("a"));
    let log = build_with(accessor).unwrap();
    assert_eq!(ids(&log), vec!["a", "a"]);
}

#[test]
fn test_include_resource_errors() {
    let accessor = MemoryAccessor::new().with_file(MAIN, changelog("include 'db/missing.qcl'"));
    assert!(build_with(accessor).unwrap_err().is_resource());

    let accessor = MemoryAccessor::new()
        .with_file(MAIN, changelog("include 'db/legacy.xml'"))
        .with_file("db/legacy.xml", "<databaseChangeLog/>");
    let err = build_with(accessor).unwrap_err();
    assert!(err.is_resource());
    assert!(err.to_string().contains(".qcl"));
}

#[test]
fn test_include_labels_depend_on_host() {
    let source = changelog("include(file: 'db/a.qcl', labels: 'x')");
    let accessor = MemoryAccessor::new()
        .with_file(MAIN, source)
        .with_file("db/a.qcl", change_set("a"));
    let config = crate::config::ParserConfig {
        host_include_labels: false,
        ..Default::default()
    };
    let err = ChangelogParser::new(accessor)
        .with_config(config)
        .parse(MAIN)
        .unwrap_err();
    assert!(matches!(err, ChangelogError::InvalidAttribute { ref attribute, .. } if attribute == "labels"));
}

#[test]
fn test_included_preconditions_fold_into_parent() {
    let accessor = MemoryAccessor::new()
        .with_file(
            MAIN,
            changelog("preConditions { dbms(type: 'h2') }\ninclude 'db/a.qcl'"),
        )
        .with_file(
            "db/a.qcl",
            changelog("preConditions(onFail: 'WARN') { tableExists(tableName: 'x') }"),
        );
    let log = build_with(accessor).unwrap();
    let root = log.preconditions.unwrap();
    assert_eq!(root.nested.len(), 2);
    assert_eq!(root.nested[0].name(), "dbms");
    match &root.nested[1] {
        Precondition::Container(child) => {
            assert_eq!(child.nested[0].name(), "tableExists");
        }
        other => panic!("expected a folded container, got {:?}", other),
    }
}

// ========================================================================
// includeAll
// ========================================================================

fn directory_accessor(main: &str) -> MemoryAccessor {
    MemoryAccessor::new()
        .with_file(MAIN, changelog(main))
        .with_file("db/changes/b.qcl", change_set("b"))
        .with_file("db/changes/a.qcl", change_set("a"))
        .with_file("db/changes/notes.txt", "not a changelog")
        .with_file("db/changes/sub/c.qcl", change_set("c"))
}

#[test]
fn test_include_all_default_order() {
    let log = build_with(directory_accessor("includeAll(path: 'db/changes')")).unwrap();
    assert_eq!(ids(&log), vec!["a", "b", "c"]);
    assert_eq!(log.change_sets[2].file_path, "db/changes/sub/c.qcl");
}

#[test]
fn test_include_all_reverse_comparator() {
    let log = build_with(directory_accessor(
        "includeAll(path: 'db/changes', resourceComparator: 'reverse')",
    ))
    .unwrap();
    assert_eq!(ids(&log), vec!["c", "b", "a"]);
}

#[test]
fn test_include_all_relative_with_filters() {
    let log = build_with(directory_accessor(
        "includeAll(path: 'changes/', relativeToChangelogFile: true, context: 'dir', ignore: true)",
    ))
    .unwrap();
    assert_eq!(ids(&log), vec!["a", "b", "c"]);
    assert!(log.change_sets.iter().all(|cs| cs.ignore));
    assert!(
        log.change_sets
            .iter()
            .all(|cs| cs.inherited_contexts == vec![ContextExpression::new("dir")])
    );
}

#[test]
fn test_include_all_missing_directory() {
    let log = build(&changelog(
        "includeAll(path: 'db/nowhere', errorIfMissingOrEmpty: false)",
    ))
    .unwrap();
    assert!(log.change_sets.is_empty());

    let err = build(&changelog("includeAll(path: 'db/nowhere')")).unwrap_err();
    assert!(err.is_resource());
}

#[test]
fn test_include_all_unresolved_path() {
    let err = build(&changelog("includeAll(path: '${migrations}/sql')")).unwrap_err();
    assert!(matches!(err, ChangelogError::UnresolvedPath { ref path } if path == "${migrations}/sql"));
}

#[test]
fn test_include_all_resource_filter_rejected() {
    let err = build(&changelog(
        "includeAll(path: 'db/changes', resourceFilter: 'x')",
    ))
    .unwrap_err();
    assert!(matches!(err, ChangelogError::Validation(ref m) if m.contains("use 'filter'")));
}

#[test]
fn test_include_all_plugin_lookup() {
    let err = build_with(directory_accessor(
        "includeAll(path: 'db/changes', filter: 'missing')",
    ))
    .unwrap_err();
    assert!(matches!(err, ChangelogError::UnknownPlugin { ref name, .. } if name == "missing"));

    let err = build_with(directory_accessor(
        "includeAll(path: 'db/changes', filter: 'reverse')",
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        ChangelogError::PluginCapability { ref name, ref expected } if name == "reverse" && expected == "IncludeFilter"
    ));
}

struct SkipB;

impl IncludeFilter for SkipB {
    fn include(&self, path: &str) -> bool {
        !path.ends_with("/b.qcl")
    }
}

#[test]
fn test_include_all_custom_filter() {
    let log = ChangelogParser::new(directory_accessor(
        "includeAll(path: 'db/changes', filter: 'skipB')",
    ))
    .with_plugin("skipB", Plugin::filter(SkipB))
    .parse(MAIN)
    .unwrap();
    assert_eq!(ids(&log), vec!["a", "c"]);
}

#[test]
fn test_include_all_from_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    fs::create_dir_all(root.join("changes")).unwrap();
    fs::write(root.join("main.qcl"), changelog("includeAll(path: 'changes')")).unwrap();
    fs::write(root.join("changes/002.qcl"), change_set("second")).unwrap();
    fs::write(root.join("changes/001.qcl"), change_set("first")).unwrap();
    fs::write(root.join("changes/readme.md"), "# notes").unwrap();

    let log = ChangelogParser::new(FileSystemAccessor::new(&root))
        .parse("main.qcl")
        .unwrap();
    assert_eq!(ids(&log), vec!["first", "second"]);
    assert_eq!(log.change_sets[0].file_path, "changes/001.qcl");
}
