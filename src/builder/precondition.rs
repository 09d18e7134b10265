//! Precondition trees: containers, and/or/not composites and leaf checks.

use super::Session;
use super::params::{check_required, parse_enum};
use crate::error::{ChangelogError, ChangelogResult};
use crate::model::{
    FailOption, OutputOption, Precondition, PreconditionCheck, PreconditionContainer,
};
use crate::registry::ParamSpec;
use crate::script::{Item, Node};

const CONTAINER: &[ParamSpec] = &[
    ParamSpec::text("onFail"),
    ParamSpec::text("onError"),
    ParamSpec::text("onSqlOutput"),
    // older spelling of onSqlOutput
    ParamSpec::text("onUpdateSQL"),
    ParamSpec::text("onFailMessage"),
    ParamSpec::text("onErrorMessage"),
];

impl Session<'_> {
    /// Build a `preConditions` block. Policies are set before children are read.
    pub(crate) fn build_preconditions(
        &self,
        path: &str,
        change_set: Option<&str>,
        node: &Node,
    ) -> ChangelogResult<PreconditionContainer> {
        let params = self.schema_params(CONTAINER, node, path, change_set, None)?;

        let mut container = PreconditionContainer::default();
        if let Some(raw) = params.text("onFail") {
            container.on_fail = parse_enum::<FailOption>("onFail", raw, FailOption::NAMES)?;
        }
        if let Some(raw) = params.text("onError") {
            container.on_error = parse_enum::<FailOption>("onError", raw, FailOption::NAMES)?;
        }
        if let Some(raw) = params.text("onSqlOutput") {
            container.on_sql_output = parse_enum("onSqlOutput", raw, OutputOption::NAMES)?;
        } else if let Some(raw) = params.text("onUpdateSQL") {
            container.on_sql_output = parse_enum("onUpdateSQL", raw, OutputOption::NAMES)?;
        }
        container.on_fail_message = params.text("onFailMessage").map(str::to_string);
        container.on_error_message = params.text("onErrorMessage").map(str::to_string);

        container.nested = self.precondition_children(path, change_set, node)?;
        Ok(container)
    }

    fn precondition_children(
        &self,
        path: &str,
        change_set: Option<&str>,
        node: &Node,
    ) -> ChangelogResult<Vec<Precondition>> {
        let mut children = Vec::new();
        for item in node.items() {
            match item {
                Item::Node(child) => children.push(self.precondition(path, change_set, child)?),
                Item::Text(_) => {
                    return Err(ChangelogError::Validation(format!(
                        "'{}' at line {} only takes preconditions, not text",
                        node.name, node.line
                    )));
                }
            }
        }
        Ok(children)
    }

    fn precondition(
        &self,
        path: &str,
        change_set: Option<&str>,
        node: &Node,
    ) -> ChangelogResult<Precondition> {
        match node.name.as_str() {
            "and" | "or" | "not" => {
                if let Some(arg) = node.args.first() {
                    let attribute = arg.key.clone().unwrap_or_else(|| "value".to_string());
                    return Err(ChangelogError::invalid_attribute(
                        &node.name, attribute, change_set,
                    ));
                }
                let children = self.precondition_children(path, change_set, node)?;
                Ok(match node.name.as_str() {
                    "and" => Precondition::And(children),
                    "or" => Precondition::Or(children),
                    _ => Precondition::Not(children),
                })
            }
            name => self
                .precondition_check(path, change_set, name, node)
                .map(Precondition::Check),
        }
    }

    fn precondition_check(
        &self,
        path: &str,
        change_set: Option<&str>,
        name: &str,
        node: &Node,
    ) -> ChangelogResult<PreconditionCheck> {
        let parser = self.parser;
        let kind = parser
            .preconditions
            .get(name)
            .ok_or_else(|| ChangelogError::UnknownPrecondition {
                kind: name.to_string(),
            })?;

        let mut params = self.schema_params(kind.params, node, path, change_set, None)?;
        let mut check = PreconditionCheck::new(kind.name);
        if kind.sql_body {
            check.sql = params.take("sql").and_then(|v| v.to_text());
        }

        for item in node.items() {
            match item {
                Item::Text(text) if kind.sql_body => check.sql = Some(self.expand(text, path)),
                Item::Node(child) if kind.custom_params && child.name == "param" => {
                    check.custom_params.push(self.key_value(child, path, change_set)?);
                }
                Item::Node(child) => {
                    return Err(ChangelogError::unknown_element(&child.name, kind.name));
                }
                Item::Text(_) => {
                    return Err(ChangelogError::Validation(format!(
                        "'{}' does not take text content",
                        kind.name
                    )));
                }
            }
        }

        check.params = params.into_inner();
        if parser.config.strict_parameters {
            check_required(kind.name, kind.params, &check.params, change_set)?;
            if kind.sql_body && check.sql.as_deref().is_none_or(|s| s.trim().is_empty()) {
                return Err(ChangelogError::missing_attribute(kind.name, "sql", change_set));
            }
        }
        Ok(check)
    }
}
