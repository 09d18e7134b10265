//! Dispatch tables for change kinds, precondition kinds and plugins.
//!
//! Each kind carries an explicit parameter schema. Builders look names up
//! here instead of hardcoding them, so an [`Extension`] can add kinds that the
//! script can use straight away.

pub mod changes;
pub mod plugins;
pub mod preconditions;

pub use changes::{ChangeKind, ChangeRegistry, ColumnFlavor, FinishContext, FinishHook};
pub use plugins::{Plugin, PluginRegistry};
pub use preconditions::{PreconditionKind, PreconditionRegistry};

/// Target type of a schema parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Text,
    Bool,
    Integer,
    Number,
}

impl ParamType {
    pub fn describe(&self) -> &'static str {
        match self {
            ParamType::Text => "a string",
            ParamType::Bool => "a boolean",
            ParamType::Integer => "an integer",
            ParamType::Number => "a number",
        }
    }
}

/// One named, typed parameter of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
}

impl ParamSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::Text,
            required: false,
        }
    }

    pub const fn bool(name: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::Bool,
            required: false,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::Integer,
            required: false,
        }
    }

    pub const fn number(name: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::Number,
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Find `name` in a schema.
pub fn find_param<'a>(schema: &'a [ParamSpec], name: &str) -> Option<&'a ParamSpec> {
    schema.iter().find(|p| p.name == name)
}

/// A bundle of registrations contributed by a host or third party.
///
/// ```ignore
/// struct Audit;
///
/// impl Extension for Audit {
///     fn change_kinds(&self) -> Vec<ChangeKind> {
///         vec![ChangeKind::new("auditTable", AUDIT_PARAMS)]
///     }
/// }
/// ```
pub trait Extension {
    fn change_kinds(&self) -> Vec<ChangeKind> {
        Vec::new()
    }

    fn precondition_kinds(&self) -> Vec<PreconditionKind> {
        Vec::new()
    }

    fn plugins(&self) -> Vec<(String, Plugin)> {
        Vec::new()
    }
}
