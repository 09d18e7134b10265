//! The root changelog container.

use super::changeset::{ChangeSet, ObjectQuotingStrategy};
use super::filter::{ContextExpression, Labels};
use super::precondition::PreconditionContainer;
use crate::error::Warning;
use crate::expand::PropertyTable;
use serde::Serialize;

/// The build product: an ordered changeset graph plus its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLog {
    pub physical_path: String,
    pub logical_path: Option<String>,
    pub contexts: Option<ContextExpression>,
    pub object_quoting_strategy: Option<ObjectQuotingStrategy>,
    pub change_sets: Vec<ChangeSet>,
    pub preconditions: Option<PreconditionContainer>,
    pub properties: PropertyTable,
    pub include_contexts: Option<ContextExpression>,
    pub include_labels: Option<Labels>,
    pub include_ignore: bool,
    pub warnings: Vec<Warning>,
}

impl ChangeLog {
    pub fn new(physical_path: impl Into<String>) -> Self {
        Self {
            physical_path: physical_path.into(),
            ..Default::default()
        }
    }

    /// The path changesets are identified by: logical when set, else physical.
    pub fn file_path(&self) -> &str {
        self.logical_path.as_deref().unwrap_or(&self.physical_path)
    }

    /// Look a changeset up by its identity triple.
    pub fn change_set(&self, path: &str, author: &str, id: &str) -> Option<&ChangeSet> {
        self.change_sets.iter().find(|cs| cs.is(path, author, id))
    }

    /// Resolve a property the way an expansion in this changelog would.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.resolve(name, &self.physical_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_prefers_logical() {
        let mut log = ChangeLog::new("db/changelog.qcl");
        assert_eq!(log.file_path(), "db/changelog.qcl");
        log.logical_path = Some("main".into());
        assert_eq!(log.file_path(), "main");
    }

    #[test]
    fn test_change_set_lookup() {
        let mut log = ChangeLog::new("db/changelog.qcl");
        log.change_sets
            .push(ChangeSet::new("1", "amy", "db/changelog.qcl", "db/changelog.qcl"));
        assert!(log.change_set("db/changelog.qcl", "amy", "1").is_some());
        assert!(log.change_set("db/changelog.qcl", "amy", "2").is_none());
    }
}
