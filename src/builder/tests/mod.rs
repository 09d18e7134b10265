//! Scenario tests: whole scripts built through [`ChangelogParser`].

mod changes;
mod includes;
mod properties;

use super::ChangelogParser;
use crate::error::ChangelogResult;
use crate::model::{ChangeLog, ChangeSet};
use crate::resource::MemoryAccessor;

/// Physical path of the root changelog in every scenario.
const MAIN: &str = "db/changelog.qcl";

/// Build `source` as the root changelog.
fn build(source: &str) -> ChangelogResult<ChangeLog> {
    build_with(MemoryAccessor::new().with_file(MAIN, source))
}

fn build_with(accessor: MemoryAccessor) -> ChangelogResult<ChangeLog> {
    ChangelogParser::new(accessor).parse(MAIN)
}

/// Build `source` with required-parameter checks switched on.
fn build_strict(source: &str) -> ChangelogResult<ChangeLog> {
    let config = crate::config::ParserConfig {
        strict_parameters: true,
        ..Default::default()
    };
    ChangelogParser::new(MemoryAccessor::new().with_file(MAIN, source))
        .with_config(config)
        .parse(MAIN)
}

/// `databaseChangeLog { <body> }`
fn changelog(body: &str) -> String {
    format!("databaseChangeLog {{\n{}\n}}", body)
}

/// Build a changelog holding one changeset `1` by `amy` with `body` inside.
fn single_change_set(body: &str) -> ChangeSet {
    let source = changelog(&format!("changeSet(id: '1', author: 'amy') {{\n{}\n}}", body));
    let mut log = build(&source).unwrap();
    assert_eq!(log.change_sets.len(), 1);
    log.change_sets.remove(0)
}

fn ids(log: &ChangeLog) -> Vec<&str> {
    log.change_sets.iter().map(|cs| cs.id.as_str()).collect()
}
