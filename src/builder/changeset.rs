//! Changeset construction: attributes, nested changes, rollback and modifySql.

use super::Session;
use super::params::{CallForm, apply_schema, check_required, parse_enum, prefix, split_list};
use crate::error::{ChangelogError, ChangelogResult};
use crate::model::{
    ChangeLog, ChangeSet, ContextExpression, Labels, ObjectQuotingStrategy, SqlVisitor,
    SqlVisitorAction, ValidationFailOption, Value,
};
use crate::registry::ParamSpec;
use crate::script::{Item, Node};
use regex::Regex;

const CHANGE_SET: &[ParamSpec] = &[
    ParamSpec::text("id").required(),
    ParamSpec::text("author").required(),
    ParamSpec::text("dbms"),
    ParamSpec::bool("runAlways"),
    ParamSpec::bool("runOnChange"),
    ParamSpec::text("context"),
    ParamSpec::text("labels"),
    ParamSpec::bool("runInTransaction"),
    ParamSpec::bool("failOnError"),
    ParamSpec::text("onValidationFail"),
    ParamSpec::text("objectQuotingStrategy"),
    ParamSpec::text("logicalFilePath"),
    ParamSpec::text("filePath"),
    ParamSpec::text("created"),
    ParamSpec::text("runOrder"),
    ParamSpec::bool("ignore"),
];

const ROLLBACK_REFERENCE: &[ParamSpec] = &[
    ParamSpec::text("changeSetId"),
    ParamSpec::text("changeSetAuthor"),
    ParamSpec::text("changeSetPath"),
];

const MODIFY_SQL: &[ParamSpec] = &[
    ParamSpec::text("dbms"),
    ParamSpec::text("context"),
    ParamSpec::text("labels"),
    ParamSpec::bool("applyToRollback"),
];

const VALUE: &[ParamSpec] = &[ParamSpec::text("value").required()];

const REPLACE: &[ParamSpec] = &[
    ParamSpec::text("replace").required(),
    ParamSpec::text("with").required(),
];

impl Session<'_> {
    /// Build a changeset. `log` is the changelog built so far, used to
    /// resolve map-form rollback references.
    pub(crate) fn build_change_set(&mut self, log: &ChangeLog, node: &Node) -> ChangelogResult<ChangeSet> {
        let path = log.physical_path.as_str();
        let args = self.named_args(node, path)?;
        if args.iter().any(|(key, _)| key == "alwaysRun") {
            return Err(ChangelogError::Validation(
                "Error: ChangeSet 'alwaysRun' is no longer supported, use 'runAlways' instead"
                    .to_string(),
            ));
        }

        let params = apply_schema("changeSet", CHANGE_SET, args, None)?;
        check_required("changeSet", CHANGE_SET, params.as_map(), None)?;
        let id = params.text("id").unwrap_or_default().to_string();
        let author = params.text("author").unwrap_or_default().to_string();

        let quoting = match params.text("objectQuotingStrategy") {
            Some(raw) => parse_enum("objectQuotingStrategy", raw, ObjectQuotingStrategy::NAMES)?,
            None => log.object_quoting_strategy.unwrap_or_default(),
        };
        let file_path = params
            .text("filePath")
            .or(params.text("logicalFilePath"))
            .unwrap_or(log.file_path())
            .to_string();

        let mut change_set = ChangeSet::new(id, author, file_path, path);
        change_set.always_run = params.flag("runAlways").unwrap_or(false);
        change_set.run_on_change = params.flag("runOnChange").unwrap_or(false);
        change_set.run_in_transaction = params.flag("runInTransaction").unwrap_or(true);
        change_set.contexts = params.text("context").map(ContextExpression::new);
        change_set.labels = params.text("labels").map(Labels::parse);
        change_set.dbms = split_list(params.text("dbms"));
        change_set.object_quoting_strategy = quoting;

        change_set.fail_on_error = params.flag("failOnError");
        if let Some(raw) = params.text("onValidationFail") {
            change_set.on_validation_fail =
                parse_enum::<ValidationFailOption>("onValidationFail", raw, ValidationFailOption::NAMES)?;
        }
        change_set.created = params.text("created").map(str::to_string);
        change_set.run_order = params.text("runOrder").map(str::to_string);
        change_set.ignore = params.flag("ignore").unwrap_or(false);

        for item in node.items() {
            self.change_set_item(log, &mut change_set, item)?;
        }

        tracing::debug!(
            id = %change_set.id,
            author = %change_set.author,
            changes = change_set.changes.len(),
            rollback = change_set.rollback.len(),
            "built changeSet"
        );
        Ok(change_set)
    }

    fn change_set_item(
        &mut self,
        log: &ChangeLog,
        change_set: &mut ChangeSet,
        item: &Item,
    ) -> ChangelogResult<()> {
        let path = log.physical_path.as_str();
        let node = match item {
            Item::Node(node) => node,
            Item::Text(_) => {
                return Err(ChangelogError::Validation(format!(
                    "ChangeSet '{}': bare text is not allowed in a changeSet, wrap it in sql or rollback",
                    change_set.id
                )));
            }
        };

        match node.name.as_str() {
            "comment" => {
                change_set.comments = Some(self.text_content(node, path, Some(&change_set.id))?);
            }
            "validCheckSum" => {
                let checksum = self.text_content(node, path, Some(&change_set.id))?;
                change_set.valid_checksums.push(checksum);
            }
            "preConditions" => {
                let container = self.build_preconditions(path, Some(&change_set.id), node)?;
                change_set.preconditions = Some(container);
            }
            "rollback" => self.rollback(log, change_set, node)?,
            "modifySql" => {
                let visitors = self.modify_sql(path, &change_set.id, node)?;
                change_set.sql_visitors.extend(visitors);
            }
            _ => {
                let change = self.build_change(path, &change_set.id, node)?;
                change_set.changes.push(change);
            }
        }
        Ok(())
    }

    fn rollback(&mut self, log: &ChangeLog, change_set: &mut ChangeSet, node: &Node) -> ChangelogResult<()> {
        let path = log.physical_path.as_str();
        match self.call_form(node, path)? {
            CallForm::Empty => match &node.body {
                None => Ok(()),
                Some(items) => self.rollback_block(path, change_set, items),
            },
            CallForm::Positional(values) => {
                if values.len() != 1 || node.body.is_some() {
                    return Err(ChangelogError::Validation(format!(
                        "ChangeSet '{}': rollback takes either one SQL string or a block",
                        change_set.id
                    )));
                }
                if let Some(sql) = values[0].to_text() {
                    change_set.add_rollback_sql(sql);
                }
                Ok(())
            }
            CallForm::Named(args) => {
                if node.body.is_some() {
                    return Err(ChangelogError::Validation(format!(
                        "ChangeSet '{}': a rollback reference cannot also have a block",
                        change_set.id
                    )));
                }
                self.rollback_reference(log, change_set, args)
            }
        }
    }

    /// Changes inside become rollback changes; a trailing string is rollback SQL.
    fn rollback_block(&mut self, path: &str, change_set: &mut ChangeSet, items: &[Item]) -> ChangelogResult<()> {
        let last = items.len().saturating_sub(1);
        for (index, item) in items.iter().enumerate() {
            match item {
                Item::Text(sql) if index == last => {
                    let sql = self.expand(sql, path);
                    change_set.add_rollback_sql(sql);
                }
                Item::Text(_) => {
                    return Err(ChangelogError::Validation(format!(
                        "ChangeSet '{}': only the last statement of a rollback block can be SQL text",
                        change_set.id
                    )));
                }
                Item::Node(child) if child.name == "rollback" => {
                    return Err(ChangelogError::Validation(format!(
                        "ChangeSet '{}': rollback blocks cannot be nested",
                        change_set.id
                    )));
                }
                Item::Node(child) => {
                    let change = self.build_change(path, &change_set.id, child)?;
                    change_set.rollback.push(change);
                }
            }
        }
        Ok(())
    }

    /// `rollback(changeSetId: '1', changeSetAuthor: 'me')`: copy another
    /// changeset's forward changes as this one's rollback.
    fn rollback_reference(
        &self,
        log: &ChangeLog,
        change_set: &mut ChangeSet,
        args: Vec<(String, Value)>,
    ) -> ChangelogResult<()> {
        for (key, _) in &args {
            let replacement = match key.as_str() {
                "id" => "changeSetId",
                "author" => "changeSetAuthor",
                _ => continue,
            };
            return Err(ChangelogError::Validation(format!(
                "ChangeSet '{}': the '{}' attribute of a rollback is no longer supported, use '{}' instead",
                change_set.id, key, replacement
            )));
        }

        let params = apply_schema("rollback", ROLLBACK_REFERENCE, args, Some(&change_set.id))?;
        let id = params
            .text("changeSetId")
            .ok_or_else(|| ChangelogError::RollbackMissingId {
                change_set: change_set.id.clone(),
            })?;
        let author = match params.text("changeSetAuthor") {
            Some(author) => author.to_string(),
            None if self.parser.config.strict_rollback_references => {
                return Err(ChangelogError::missing_attribute(
                    "rollback",
                    "changeSetAuthor",
                    Some(&change_set.id),
                ));
            }
            None => change_set.author.clone(),
        };
        let target_path = params
            .text("changeSetPath")
            .unwrap_or(log.file_path())
            .to_string();

        let target = log.change_set(&target_path, &author, id).ok_or_else(|| {
            ChangelogError::RollbackImpossible {
                path: target_path.clone(),
                author: author.clone(),
                id: id.to_string(),
            }
        })?;
        tracing::debug!(
            change_set = %change_set.id,
            target = %id,
            changes = target.changes.len(),
            "rollback copied from referenced changeSet"
        );
        change_set.rollback.extend(target.changes.iter().cloned());
        Ok(())
    }

    fn modify_sql(&self, path: &str, change_set: &str, node: &Node) -> ChangelogResult<Vec<SqlVisitor>> {
        let params = self.schema_params(MODIFY_SQL, node, path, Some(change_set), None)?;
        let dbms = split_list(params.text("dbms"));
        let contexts = params.text("context").map(ContextExpression::new);
        let labels = params.text("labels").map(Labels::parse);
        let apply_to_rollback = params.flag("applyToRollback").unwrap_or(false);

        let mut visitors = Vec::new();
        for item in node.items() {
            let Item::Node(child) = item else {
                return Err(ChangelogError::Validation(format!(
                    "{}modifySql only takes append, prepend, replace and regExpReplace",
                    prefix(Some(change_set))
                )));
            };
            let action = match child.name.as_str() {
                "append" | "prepend" => {
                    let params = self.schema_params(VALUE, child, path, Some(change_set), Some("value"))?;
                    check_required(&child.name, VALUE, params.as_map(), Some(change_set))?;
                    let value = params.text("value").unwrap_or_default().to_string();
                    if child.name == "append" {
                        SqlVisitorAction::Append(value)
                    } else {
                        SqlVisitorAction::Prepend(value)
                    }
                }
                "replace" | "regExpReplace" => {
                    let params = self.schema_params(REPLACE, child, path, Some(change_set), None)?;
                    check_required(&child.name, REPLACE, params.as_map(), Some(change_set))?;
                    let replace = params.text("replace").unwrap_or_default().to_string();
                    let with = params.text("with").unwrap_or_default().to_string();
                    if child.name == "replace" {
                        SqlVisitorAction::Replace { replace, with }
                    } else {
                        Regex::new(&replace).map_err(|e| {
                            ChangelogError::invalid_value(
                                "replace",
                                replace.as_str(),
                                format!("a valid regular expression ({})", e),
                            )
                        })?;
                        SqlVisitorAction::RegExpReplace { replace, with }
                    }
                }
                other => return Err(ChangelogError::unknown_element(other, "modifySql")),
            };
            visitors.push(SqlVisitor {
                action,
                dbms: dbms.clone(),
                contexts: contexts.clone(),
                labels: labels.clone(),
                apply_to_rollback,
            });
        }
        Ok(visitors)
    }
}
