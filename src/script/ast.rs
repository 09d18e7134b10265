//! Syntax tree of a changelog script.

/// A literal as written in the script, before property resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Bare identifier: a property reference.
    Ident(String),
    List(Vec<Literal>),
}

/// One argument of a call: `key: value` or a positional value.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: Option<String>,
    pub value: Literal,
}

/// An element invocation such as `changeSet(id: '1', author: 'me') { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub args: Vec<Arg>,
    /// `None` when no block was written, `Some(vec![])` for `{}`.
    pub body: Option<Vec<Item>>,
    /// 1-based line of the element name.
    pub line: usize,
}

/// A statement inside a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    /// A bare string statement (SQL body, rollback SQL, comment text).
    Text(String),
}

/// A parsed script: the top-level elements in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn items(&self) -> &[Item] {
        self.body.as_deref().unwrap_or(&[])
    }

    pub fn has_positional(&self) -> bool {
        self.args.iter().any(|a| a.key.is_none())
    }

    pub fn has_named(&self) -> bool {
        self.args.iter().any(|a| a.key.is_some())
    }
}
