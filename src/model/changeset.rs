//! Changesets: the identified unit of change.

use super::change::Change;
use super::filter::{ContextExpression, Labels};
use super::precondition::PreconditionContainer;
use serde::Serialize;
use std::str::FromStr;

/// How the host quotes object names when it renders SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectQuotingStrategy {
    #[default]
    Legacy,
    QuoteAllObjects,
    QuoteOnlyReservedWords,
}

impl ObjectQuotingStrategy {
    pub const NAMES: &'static [&'static str] =
        &["LEGACY", "QUOTE_ALL_OBJECTS", "QUOTE_ONLY_RESERVED_WORDS"];
}

impl FromStr for ObjectQuotingStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEGACY" => Ok(Self::Legacy),
            "QUOTE_ALL_OBJECTS" => Ok(Self::QuoteAllObjects),
            "QUOTE_ONLY_RESERVED_WORDS" => Ok(Self::QuoteOnlyReservedWords),
            _ => Err(()),
        }
    }
}

/// What the host does when a changeset fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationFailOption {
    #[default]
    Halt,
    MarkRan,
}

impl ValidationFailOption {
    pub const NAMES: &'static [&'static str] = &["HALT", "MARK_RAN"];
}

impl FromStr for ValidationFailOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HALT" => Ok(Self::Halt),
            "MARK_RAN" => Ok(Self::MarkRan),
            _ => Err(()),
        }
    }
}

/// A `modifySql` rule applied to the SQL the host generates for a changeset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlVisitor {
    pub action: SqlVisitorAction,
    pub dbms: Vec<String>,
    pub contexts: Option<ContextExpression>,
    pub labels: Option<Labels>,
    pub apply_to_rollback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SqlVisitorAction {
    Append(String),
    Prepend(String),
    Replace { replace: String, with: String },
    RegExpReplace { replace: String, with: String },
}

/// A changeset, identified by `(file_path, author, id)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub id: String,
    pub author: String,
    pub file_path: String,
    pub always_run: bool,
    pub run_on_change: bool,
    pub run_in_transaction: bool,
    pub contexts: Option<ContextExpression>,
    pub labels: Option<Labels>,
    pub dbms: Vec<String>,
    pub fail_on_error: Option<bool>,
    pub on_validation_fail: ValidationFailOption,
    pub object_quoting_strategy: ObjectQuotingStrategy,
    pub created: Option<String>,
    pub run_order: Option<String>,
    pub ignore: bool,
    pub comments: Option<String>,
    pub changes: Vec<Change>,
    pub rollback: Vec<Change>,
    pub preconditions: Option<PreconditionContainer>,
    pub valid_checksums: Vec<String>,
    pub sql_visitors: Vec<SqlVisitor>,
    /// Physical path of the changelog that declared this changeset.
    pub changelog_path: String,
    pub inherited_contexts: Vec<ContextExpression>,
    pub inherited_labels: Vec<Labels>,
}

impl ChangeSet {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
        changelog_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            file_path: file_path.into(),
            always_run: false,
            run_on_change: false,
            run_in_transaction: true,
            contexts: None,
            labels: None,
            dbms: Vec::new(),
            fail_on_error: None,
            on_validation_fail: ValidationFailOption::Halt,
            object_quoting_strategy: ObjectQuotingStrategy::Legacy,
            created: None,
            run_order: None,
            ignore: false,
            comments: None,
            changes: Vec::new(),
            rollback: Vec::new(),
            preconditions: None,
            valid_checksums: Vec::new(),
            sql_visitors: Vec::new(),
            changelog_path: changelog_path.into(),
            inherited_contexts: Vec::new(),
            inherited_labels: Vec::new(),
        }
    }

    /// Append raw rollback SQL, stored as a rollback `sql` change.
    pub fn add_rollback_sql(&mut self, sql: impl Into<String>) {
        self.rollback.push(Change::raw_sql(sql));
    }

    /// Texts of the raw SQL rollback entries, in order.
    pub fn rollback_sql(&self) -> Vec<&str> {
        self.rollback
            .iter()
            .filter(|c| c.kind == "sql")
            .filter_map(|c| c.text("sql"))
            .collect()
    }

    /// True when this changeset carries the given identity.
    pub fn is(&self, path: &str, author: &str, id: &str) -> bool {
        self.id == id && self.author == author && same_path(&self.file_path, path)
    }
}

/// Compare two changelog paths ignoring separator style.
pub(crate) fn same_path(a: &str, b: &str) -> bool {
    a.replace('\\', "/") == b.replace('\\', "/")
}
