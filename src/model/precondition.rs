//! Precondition trees.

use super::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What the host does when a precondition fails (or errors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailOption {
    #[default]
    Halt,
    Continue,
    MarkRan,
    Warn,
}

/// How preconditions behave when the host only renders SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputOption {
    #[default]
    Ignore,
    Test,
    Fail,
}

impl FailOption {
    pub const NAMES: &'static [&'static str] = &["HALT", "CONTINUE", "MARK_RAN", "WARN"];
}

impl OutputOption {
    pub const NAMES: &'static [&'static str] = &["IGNORE", "TEST", "FAIL"];
}

impl FromStr for FailOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HALT" => Ok(Self::Halt),
            "CONTINUE" => Ok(Self::Continue),
            "MARK_RAN" => Ok(Self::MarkRan),
            "WARN" => Ok(Self::Warn),
            _ => Err(()),
        }
    }
}

impl FromStr for OutputOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IGNORE" => Ok(Self::Ignore),
            "TEST" => Ok(Self::Test),
            "FAIL" => Ok(Self::Fail),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FailOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Halt => "HALT",
            Self::Continue => "CONTINUE",
            Self::MarkRan => "MARK_RAN",
            Self::Warn => "WARN",
        };
        write!(f, "{}", name)
    }
}

/// Root of a precondition tree, with the failure policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionContainer {
    pub on_fail: FailOption,
    pub on_error: FailOption,
    pub on_sql_output: OutputOption,
    pub on_fail_message: Option<String>,
    pub on_error_message: Option<String>,
    pub nested: Vec<Precondition>,
}

/// A node in a precondition tree. Children keep declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Precondition {
    And(Vec<Precondition>),
    Or(Vec<Precondition>),
    Not(Vec<Precondition>),
    Check(PreconditionCheck),
    /// Preconditions of an included changelog, folded into the includer's.
    Container(Box<PreconditionContainer>),
}

/// A leaf check such as `tableExists` or `sqlCheck`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionCheck {
    pub kind: String,
    pub params: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_params: Vec<(String, String)>,
}

impl PreconditionCheck {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
            sql: None,
            custom_params: Vec::new(),
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }
}

impl Precondition {
    /// Kind name as written in a script.
    pub fn name(&self) -> &str {
        match self {
            Precondition::And(_) => "and",
            Precondition::Or(_) => "or",
            Precondition::Not(_) => "not",
            Precondition::Check(check) => &check.kind,
            Precondition::Container(_) => "preConditions",
        }
    }

    pub fn children(&self) -> &[Precondition] {
        match self {
            Precondition::And(c) | Precondition::Or(c) | Precondition::Not(c) => c,
            Precondition::Container(container) => &container.nested,
            Precondition::Check(_) => &[],
        }
    }
}
