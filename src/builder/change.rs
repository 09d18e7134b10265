//! Change construction from a registry lookup.

use super::Session;
use super::params::{CallForm, apply_schema, check_required, coerce, prefix};
use crate::error::{ChangelogError, ChangelogResult};
use crate::model::{Change, Value};
use crate::registry::{ChangeKind, ColumnFlavor, FinishContext};
use crate::script::{Item, Node};

impl Session<'_> {
    /// Build the change declared by `node` inside changeset `change_set`.
    ///
    /// The caller decides whether it lands in the forward or rollback list.
    pub(crate) fn build_change(
        &mut self,
        path: &str,
        change_set: &str,
        node: &Node,
    ) -> ChangelogResult<Change> {
        let parser = self.parser;
        let kind = parser
            .changes
            .get(&node.name)
            .ok_or_else(|| ChangelogError::UnknownChange {
                change_set: change_set.to_string(),
                kind: node.name.clone(),
            })?;

        let mut change = Change::new(kind.name);
        match self.call_form(node, path)? {
            CallForm::Empty => {}
            CallForm::Named(args) => {
                change.params = apply_schema(kind.name, kind.params, args, Some(change_set))?
                    .into_inner();
            }
            CallForm::Positional(mut values) => {
                let target = kind
                    .text_param
                    .and_then(|name| kind.param(name))
                    .filter(|_| values.len() == 1)
                    .ok_or_else(|| {
                        ChangelogError::Validation(format!(
                            "{}'{}' does not accept a bare value; use named attributes",
                            prefix(Some(change_set)),
                            kind.name
                        ))
                    })?;
                change.set(target.name, coerce(target, values.remove(0))?);
            }
        }

        for item in node.items() {
            self.change_item(path, change_set, kind, &mut change, item)?;
        }

        if parser.config.strict_parameters {
            check_required(kind.name, kind.params, &change.params, Some(change_set))?;
        }
        if let Some(finish) = kind.finish {
            let mut cx = FinishContext {
                change_set,
                warnings: &mut self.warnings,
            };
            finish(&mut change, &mut cx)?;
        }
        tracing::debug!(change_set, kind = kind.name, "built change");
        Ok(change)
    }

    fn change_item(
        &self,
        path: &str,
        change_set: &str,
        kind: &ChangeKind,
        change: &mut Change,
        item: &Item,
    ) -> ChangelogResult<()> {
        let node = match item {
            Item::Text(text) => {
                let Some(target) = kind.body else {
                    return Err(ChangelogError::Validation(format!(
                        "{}'{}' does not take a SQL body",
                        prefix(Some(change_set)),
                        kind.name
                    )));
                };
                let text = self.expand(text, path);
                let body = match change.text(target) {
                    Some(existing) => format!("{}\n{}", existing, text),
                    None => text,
                };
                change.set(target, Value::Text(body));
                return Ok(());
            }
            Item::Node(node) => node,
        };

        match node.name.as_str() {
            "column" => {
                let flavor = kind.columns.ok_or_else(|| {
                    ChangelogError::Validation(format!(
                        "{}columns are not allowed in '{}' changes",
                        prefix(Some(change_set)),
                        kind.name
                    ))
                })?;
                change
                    .columns
                    .push(self.build_column(path, change_set, flavor, node)?);
            }
            "where" | "whereParams" if !kind.where_clause => {
                return Err(ChangelogError::Validation(format!(
                    "{}a where clause is invalid for '{}' changes",
                    prefix(Some(change_set)),
                    kind.name
                )));
            }
            "where" => change.where_clause = Some(self.text_content(node, path, Some(change_set))?),
            "whereParams" => {
                for item in node.items() {
                    match item {
                        Item::Node(param) if param.name == "param" => change.where_params.push(
                            self.build_column(path, change_set, ColumnFlavor::Standard, param)?,
                        ),
                        Item::Node(other) => {
                            return Err(ChangelogError::unknown_element(&other.name, "whereParams"));
                        }
                        Item::Text(_) => {
                            return Err(ChangelogError::Validation(format!(
                                "{}whereParams only takes 'param' entries",
                                prefix(Some(change_set))
                            )));
                        }
                    }
                }
            }
            "arg" if kind.args => change.args.push(self.value_arg(node, path, change_set)?),
            "param" if kind.custom_params => {
                change
                    .custom_params
                    .push(self.key_value(node, path, Some(change_set))?);
            }
            "comment" if kind.comment => {
                change.comment = Some(self.text_content(node, path, Some(change_set))?);
            }
            other => return Err(ChangelogError::unknown_element(other, kind.name)),
        }
        Ok(())
    }

    /// `arg '-v'` or `arg(value: '-v')`.
    fn value_arg(&self, node: &Node, path: &str, change_set: &str) -> ChangelogResult<String> {
        let value = match self.call_form(node, path)? {
            CallForm::Positional(values) if values.len() == 1 => values[0].to_text(),
            CallForm::Named(args) => {
                let mut value = None;
                for (key, v) in args {
                    if key != "value" {
                        return Err(ChangelogError::invalid_attribute("arg", key, Some(change_set)));
                    }
                    value = v.to_text();
                }
                value
            }
            _ => None,
        };
        value.ok_or_else(|| ChangelogError::missing_attribute("arg", "value", Some(change_set)))
    }

    /// `param(name: 'k', value: 'v')` or `param('k', 'v')`.
    pub(crate) fn key_value(
        &self,
        node: &Node,
        path: &str,
        change_set: Option<&str>,
    ) -> ChangelogResult<(String, String)> {
        let (name, value) = match self.call_form(node, path)? {
            CallForm::Positional(values) if values.len() == 2 => (values[0].to_text(), values[1].to_text()),
            CallForm::Named(args) => {
                let (mut name, mut value) = (None, None);
                for (key, v) in args {
                    match key.as_str() {
                        "name" => name = v.to_text(),
                        "value" => value = v.to_text(),
                        _ => {
                            return Err(ChangelogError::invalid_attribute("param", key, change_set));
                        }
                    }
                }
                (name, value)
            }
            CallForm::Positional(_) | CallForm::Empty => (None, None),
        };
        let name =
            name.ok_or_else(|| ChangelogError::missing_attribute("param", "name", change_set))?;
        let value =
            value.ok_or_else(|| ChangelogError::missing_attribute("param", "value", change_set))?;
        Ok((name, value))
    }
}
