//! Argument resolution, schema checking and type coercion.

use super::Session;
use crate::error::{ChangelogError, ChangelogResult};
use crate::model::Value;
use crate::registry::{ParamSpec, ParamType, find_param};
use crate::script::{Item, Literal, Node};
use crate::truth::parse_truth;
use std::collections::BTreeMap;
use std::str::FromStr;

/// How a node was called, with every literal resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CallForm {
    Empty,
    Positional(Vec<Value>),
    /// Named arguments in declaration order.
    Named(Vec<(String, Value)>),
}

/// Schema-checked, coerced parameters of one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name).filter(|v| !v.is_null())
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl Session<'_> {
    /// Resolve a literal: strings are expanded, bare identifiers looked up.
    pub(crate) fn resolve(&self, literal: &Literal, path: &str) -> ChangelogResult<Value> {
        Ok(match literal {
            Literal::Str(s) => Value::Text(self.expand(s, path)),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(f) => Value::Float(*f),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
            Literal::Ident(name) => match self.properties.resolve(name, path) {
                Some(value) => Value::Text(self.expand(value, path)),
                None => {
                    return Err(ChangelogError::MissingProperty {
                        name: name.clone(),
                        path: path.to_string(),
                    });
                }
            },
            Literal::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.resolve(item, path))
                    .collect::<ChangelogResult<_>>()?,
            ),
        })
    }

    pub(crate) fn expand(&self, raw: &str, path: &str) -> String {
        self.properties.expand(raw, path)
    }

    pub(crate) fn call_form(&self, node: &Node, path: &str) -> ChangelogResult<CallForm> {
        if node.args.is_empty() {
            return Ok(CallForm::Empty);
        }
        if node.has_positional() && node.has_named() {
            return Err(ChangelogError::Validation(format!(
                "'{}' at line {} mixes named and positional arguments",
                node.name, node.line
            )));
        }

        if node.has_named() {
            let mut named: Vec<(String, Value)> = Vec::with_capacity(node.args.len());
            for arg in &node.args {
                let Some(key) = &arg.key else { continue };
                if named.iter().any(|(k, _)| k == key) {
                    return Err(ChangelogError::Validation(format!(
                        "'{}' at line {} sets '{}' more than once",
                        node.name, node.line, key
                    )));
                }
                named.push((key.clone(), self.resolve(&arg.value, path)?));
            }
            Ok(CallForm::Named(named))
        } else {
            let values = node
                .args
                .iter()
                .map(|arg| self.resolve(&arg.value, path))
                .collect::<ChangelogResult<_>>()?;
            Ok(CallForm::Positional(values))
        }
    }

    /// Named arguments only; a positional value is an error.
    pub(crate) fn named_args(
        &self,
        node: &Node,
        path: &str,
    ) -> ChangelogResult<Vec<(String, Value)>> {
        match self.call_form(node, path)? {
            CallForm::Empty => Ok(Vec::new()),
            CallForm::Named(args) => Ok(args),
            CallForm::Positional(_) => Err(positional_not_allowed(&node.name, None)),
        }
    }

    /// Check a node's arguments against `schema`.
    ///
    /// A single positional value is accepted when `text_param` names the
    /// parameter it stands for.
    pub(crate) fn schema_params(
        &self,
        schema: &[ParamSpec],
        node: &Node,
        path: &str,
        change_set: Option<&str>,
        text_param: Option<&str>,
    ) -> ChangelogResult<Params> {
        match self.call_form(node, path)? {
            CallForm::Empty => Ok(Params::default()),
            CallForm::Named(args) => apply_schema(&node.name, schema, args, change_set),
            CallForm::Positional(mut values) => match text_param {
                Some(name) if values.len() == 1 => apply_schema(
                    &node.name,
                    schema,
                    vec![(name.to_string(), values.remove(0))],
                    change_set,
                ),
                _ => Err(positional_not_allowed(&node.name, change_set)),
            },
        }
    }

    /// Text carried by `comment 'x'`, `where("a = 1")` or `comment { 'x' }`.
    pub(crate) fn text_content(
        &self,
        node: &Node,
        path: &str,
        change_set: Option<&str>,
    ) -> ChangelogResult<String> {
        match self.call_form(node, path)? {
            CallForm::Positional(values) if values.len() == 1 => {
                if let Some(text) = values[0].to_text() {
                    return Ok(text);
                }
            }
            CallForm::Named(args) => {
                return Err(ChangelogError::invalid_attribute(
                    &node.name,
                    &args[0].0,
                    change_set,
                ));
            }
            CallForm::Positional(_) => return Err(positional_not_allowed(&node.name, change_set)),
            CallForm::Empty => {}
        }

        let mut texts = Vec::new();
        for item in node.items() {
            match item {
                Item::Text(text) => texts.push(self.expand(text, path)),
                Item::Node(child) => {
                    return Err(ChangelogError::unknown_element(&child.name, &node.name));
                }
            }
        }
        if texts.is_empty() {
            return Err(ChangelogError::Validation(format!(
                "{}'{}' requires a text value",
                prefix(change_set),
                node.name
            )));
        }
        Ok(texts.join("\n"))
    }
}

pub(crate) fn prefix(change_set: Option<&str>) -> String {
    change_set
        .map(|id| format!("ChangeSet '{}': ", id))
        .unwrap_or_default()
}

pub(crate) fn positional_not_allowed(element: &str, change_set: Option<&str>) -> ChangelogError {
    ChangelogError::Validation(format!(
        "{}'{}' does not accept a bare value; use named attributes",
        prefix(change_set),
        element
    ))
}

/// Validate keys in declaration order and coerce each value.
///
/// The first key the schema does not declare is the error.
pub(crate) fn apply_schema(
    element: &str,
    schema: &[ParamSpec],
    args: Vec<(String, Value)>,
    change_set: Option<&str>,
) -> ChangelogResult<Params> {
    let mut params = BTreeMap::new();
    for (key, value) in args {
        let spec = find_param(schema, &key)
            .ok_or_else(|| ChangelogError::invalid_attribute(element, &key, change_set))?;
        params.insert(key, coerce(spec, value)?);
    }
    Ok(Params(params))
}

pub(crate) fn check_required(
    element: &str,
    schema: &[ParamSpec],
    params: &BTreeMap<String, Value>,
    change_set: Option<&str>,
) -> ChangelogResult<()> {
    for spec in schema.iter().filter(|s| s.required) {
        if !params.get(spec.name).is_some_and(|v| !v.is_null()) {
            return Err(ChangelogError::missing_attribute(element, spec.name, change_set));
        }
    }
    Ok(())
}

/// 2^63: the first whole float outside the `i64` range.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Convert a resolved value to the parameter's declared type.
pub(crate) fn coerce(spec: &ParamSpec, value: Value) -> ChangelogResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = |value: &Value| {
        ChangelogError::invalid_value(spec.name, value.to_string(), spec.ty.describe())
    };

    match spec.ty {
        ParamType::Text => Ok(match value {
            Value::Text(s) => Value::Text(s),
            other => Value::Text(other.to_text().unwrap_or_default()),
        }),
        ParamType::Bool => parse_truth(spec.name, Some(&value), false).map(Value::Bool),
        ParamType::Integer => match value {
            Value::Int(n) => Ok(Value::Int(n)),
            Value::Float(f) if f.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&f) => {
                Ok(Value::Int(f as i64))
            }
            Value::Text(ref s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| mismatch(&value)),
            other => Err(mismatch(&other)),
        },
        ParamType::Number => match value {
            Value::Int(n) => Ok(Value::Int(n)),
            Value::Float(f) => Ok(Value::Float(f)),
            Value::Text(ref s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .map(Value::Int)
                    .or_else(|_| trimmed.parse::<f64>().map(Value::Float))
                    .map_err(|_| mismatch(&value))
            }
            other => Err(mismatch(&other)),
        },
    }
}

/// Parse a closed-enumeration attribute, listing the accepted names on failure.
pub(crate) fn parse_enum<T: FromStr>(
    attribute: &str,
    raw: &str,
    names: &[&str],
) -> ChangelogResult<T> {
    raw.parse::<T>().map_err(|_| {
        ChangelogError::invalid_value(attribute, raw, format!("one of {}", names.join(", ")))
    })
}

/// Split a comma-separated attribute (`dbms: 'h2, mysql'`) into names.
pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_fallback() {
        let spec = ParamSpec::integer("startWith");
        assert_eq!(coerce(&spec, Value::from("42")).unwrap(), Value::Int(42));
        assert_eq!(coerce(&spec, Value::Float(3.0)).unwrap(), Value::Int(3));
        assert_eq!(coerce(&spec, Value::Float(-7.0)).unwrap(), Value::Int(-7));
        assert!(coerce(&spec, Value::Float(1e30)).is_err());
        assert!(coerce(&spec, Value::Float(-1e30)).is_err());
        assert!(coerce(&spec, Value::Float(9_223_372_036_854_775_808.0)).is_err());
        assert!(coerce(&spec, Value::Float(2.5)).is_err());
        let err = coerce(&spec, Value::from("lots")).unwrap_err();
        assert!(err.to_string().contains("startWith"));

        let spec = ParamSpec::number("cacheSize");
        assert_eq!(coerce(&spec, Value::from("1.5")).unwrap(), Value::Float(1.5));
        assert!(coerce(&spec, Value::Bool(true)).is_err());
    }

    #[test]
    fn test_coerce_text_and_bool() {
        let spec = ParamSpec::text("dbms");
        assert_eq!(
            coerce(&spec, Value::List(vec!["h2".into(), "mysql".into()])).unwrap(),
            Value::from("h2,mysql")
        );
        assert_eq!(coerce(&spec, Value::Int(5)).unwrap(), Value::from("5"));

        let spec = ParamSpec::bool("ignore");
        assert_eq!(coerce(&spec, Value::from("TRUE")).unwrap(), Value::Bool(true));
        assert!(coerce(&spec, Value::from("yes")).is_err());
        assert_eq!(coerce(&spec, Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_first_unknown_key_reported() {
        const SCHEMA: &[ParamSpec] = &[ParamSpec::text("tableName")];
        let args = vec![
            ("tableName".to_string(), Value::from("t")),
            ("bogus".to_string(), Value::from("x")),
            ("other".to_string(), Value::from("y")),
        ];
        let err = apply_schema("dropTable", SCHEMA, args, Some("1")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ChangeSet '1': 'bogus' is not a valid dropTable attribute"
        );
    }

    #[test]
    fn test_required_and_split() {
        const SCHEMA: &[ParamSpec] = &[ParamSpec::text("tableName").required()];
        let err = check_required("dropTable", SCHEMA, &BTreeMap::new(), None).unwrap_err();
        assert_eq!(err.to_string(), "dropTable requires 'tableName'");
        assert_eq!(split_list(Some(" h2, ,mysql ")), vec!["h2", "mysql"]);
        assert!(split_list(None).is_empty());
    }
}
