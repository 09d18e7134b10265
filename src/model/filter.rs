//! Context and label expressions.
//!
//! ```text
//! test, staging            either one
//! test and !prod           both conditions
//! not (prod or staging)    negated group
//! ```

use serde::Serialize;

/// A boolean expression over context names, e.g. `test and !prod`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContextExpression(String);

/// A boolean expression over label names, matched against a changeset's [`Labels`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelExpression(String);

/// A comma separated set of labels attached to a changeset or property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Labels(Vec<String>);

impl ContextExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the expression holds for the active contexts.
    ///
    /// An empty expression, or no active contexts at all, matches everything.
    pub fn matches(&self, active: &[String]) -> bool {
        if self.is_empty() || active.is_empty() {
            return true;
        }
        evaluate(&self.0, |name| active.iter().any(|a| a.eq_ignore_ascii_case(name)))
    }
}

impl LabelExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        if self.0.is_empty() {
            return true;
        }
        evaluate(&self.0, |name| labels.contains(name))
    }
}

impl Labels {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Name(&'a str),
    Or,
    And,
    Not,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = expr;
    while let Some(c) = rest.chars().next() {
        match c {
            c if c.is_whitespace() => rest = &rest[c.len_utf8()..],
            ',' => {
                tokens.push(Token::Or);
                rest = &rest[1..];
            }
            '!' => {
                tokens.push(Token::Not);
                rest = &rest[1..];
            }
            '(' => {
                tokens.push(Token::Open);
                rest = &rest[1..];
            }
            ')' => {
                tokens.push(Token::Close);
                rest = &rest[1..];
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, ',' | '!' | '(' | ')'))
                    .unwrap_or(rest.len());
                let word = &rest[..end];
                tokens.push(match word.to_ascii_lowercase().as_str() {
                    "or" => Token::Or,
                    "and" => Token::And,
                    "not" => Token::Not,
                    _ => Token::Name(word),
                });
                rest = &rest[end..];
            }
        }
    }
    tokens
}

/// Recursive descent: `or := and ((','|or) and)*`, `and := unary (and unary)*`.
struct Evaluator<'t, 'a, F> {
    tokens: &'t [Token<'a>],
    pos: usize,
    lookup: F,
}

impl<'t, 'a, F: Fn(&str) -> bool> Evaluator<'t, 'a, F> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> bool {
        let mut result = self.and();
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and();
            result = result || rhs;
        }
        result
    }

    fn and(&mut self) -> bool {
        let mut result = self.unary();
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.unary();
            result = result && rhs;
        }
        result
    }

    fn unary(&mut self) -> bool {
        match self.peek().cloned() {
            Some(Token::Not) => {
                self.pos += 1;
                !self.unary()
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.or();
                if self.peek() == Some(&Token::Close) {
                    self.pos += 1;
                }
                inner
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                (self.lookup)(name)
            }
            // Dangling operators are treated as matching.
            _ => {
                self.pos += 1;
                true
            }
        }
    }
}

fn evaluate(expr: &str, lookup: impl Fn(&str) -> bool) -> bool {
    let tokens = tokenize(expr);
    if tokens.is_empty() {
        return true;
    }
    let mut evaluator = Evaluator {
        tokens: &tokens,
        pos: 0,
        lookup,
    };
    evaluator.or()
}
