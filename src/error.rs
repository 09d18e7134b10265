//! Error types for changelog builds.

use serde::Serialize;
use thiserror::Error;

/// The main error type for changelog builds.
///
/// Every variant is terminal: a build that produces one of these never hands
/// back a partial [`ChangeLog`](crate::model::ChangeLog).
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// The script text does not follow the changelog grammar.
    #[error("Syntax error in {path} at line {line}: {message}")]
    Syntax {
        path: String,
        line: usize,
        message: String,
    },

    /// An element name that is not valid where it appears.
    #[error("'{element}' is not a valid element of {parent}")]
    UnknownElement { element: String, parent: String },

    /// A change kind that no registry entry knows about.
    #[error("ChangeSet '{change_set}': '{kind}' is not a valid change type")]
    UnknownChange { change_set: String, kind: String },

    /// A precondition kind that no registry entry knows about.
    #[error("'{kind}' is not a valid precondition")]
    UnknownPrecondition { kind: String },

    /// An attribute that the element's schema does not declare.
    #[error("{}'{attribute}' is not a valid {element} attribute", change_set_prefix(.change_set))]
    InvalidAttribute {
        element: String,
        attribute: String,
        change_set: Option<String>,
    },

    /// An attribute value that cannot be coerced to the declared type.
    #[error("'{value}' is not a valid value for '{attribute}': expected {expected}")]
    InvalidValue {
        attribute: String,
        value: String,
        expected: String,
    },

    /// A required attribute is absent.
    #[error("{}{element} requires '{attribute}'", change_set_prefix(.change_set))]
    MissingAttribute {
        element: String,
        attribute: String,
        change_set: Option<String>,
    },

    /// Any other structural rule violation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A bare identifier with no registered property behind it.
    #[error("Unknown property '{name}' referenced in {path}")]
    MissingProperty { name: String, path: String },

    /// Missing or unreadable include file, directory or property file.
    #[error("Resource error for '{path}': {message}")]
    Resource { path: String, message: String },

    /// A directory path that still holds `${...}` tokens after expansion.
    #[error("Unresolved property in includeAll path '{path}'")]
    UnresolvedPath { path: String },

    /// A file that includes itself, directly or transitively.
    #[error("Circular include of '{path}' (include chain: {chain})")]
    CircularInclude { path: String, chain: String },

    /// A filter or comparator name with no registration.
    #[error("No {capability} named '{name}' is registered")]
    UnknownPlugin { name: String, capability: String },

    /// A filter or comparator name registered with the wrong capability.
    #[error("'{name}' is registered but does not implement {expected}")]
    PluginCapability { name: String, expected: String },

    /// A map-form rollback without `changeSetId`.
    #[error("No changeSetId given for rollback in '{change_set}'")]
    RollbackMissingId { change_set: String },

    /// A map-form rollback whose target changeset does not exist.
    #[error("Could not find changeSet to use for rollback: {path}:{author}:{id}")]
    RollbackImpossible {
        path: String,
        author: String,
        id: String,
    },

    /// Invalid parser configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn change_set_prefix(change_set: &Option<String>) -> String {
    match change_set {
        Some(id) => format!("ChangeSet '{}': ", id),
        None => String::new(),
    }
}

impl ChangelogError {
    /// Create an invalid-attribute error.
    pub fn invalid_attribute(
        element: impl Into<String>,
        attribute: impl Into<String>,
        change_set: Option<&str>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            change_set: change_set.map(str::to_string),
        }
    }

    /// Create a missing-attribute error.
    pub fn missing_attribute(
        element: impl Into<String>,
        attribute: impl Into<String>,
        change_set: Option<&str>,
    ) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
            change_set: change_set.map(str::to_string),
        }
    }

    /// Create an invalid-value error.
    pub fn invalid_value(
        attribute: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            attribute: attribute.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create an unknown-element error.
    pub fn unknown_element(element: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
            parent: parent.into(),
        }
    }

    /// Create a resource error.
    pub fn resource(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for the rollback-impossible family (missing id or missing target).
    pub fn is_rollback_impossible(&self) -> bool {
        matches!(
            self,
            Self::RollbackImpossible { .. } | Self::RollbackMissingId { .. }
        )
    }

    /// True for errors caused by files and directories rather than content.
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource { .. } | Self::Io(_))
    }
}

/// Result type alias for changelog operations.
pub type ChangelogResult<T> = Result<T, ChangelogError>;

/// A non-fatal diagnostic raised for deprecated but accepted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub change_set: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.change_set {
            Some(id) => write!(f, "ChangeSet '{}': {}", id, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
