//! The root `databaseChangeLog` element: properties, includes and changesets.

use super::Session;
use super::params::{Params, apply_schema, check_required, parse_enum, split_list};
use crate::error::{ChangelogError, ChangelogResult};
use crate::expand::{Property, PropertyScope, has_unresolved, parse_properties};
use crate::model::changeset::same_path;
use crate::model::{
    ChangeLog, ContextExpression, Labels, ObjectQuotingStrategy, Precondition, Value,
};
use crate::registry::ParamSpec;
use crate::resource::{
    DSL_EXTENSION, ListOptions, ResourceEnumerator, has_dsl_extension, normalize, relative_to,
};
use crate::script::{Item, Node, Script, parse_script};

const CHANGELOG: &[ParamSpec] = &[
    ParamSpec::text("logicalFilePath"),
    ParamSpec::text("context"),
    ParamSpec::text("objectQuotingStrategy"),
];

const INCLUDE: &[ParamSpec] = &[
    ParamSpec::text("file").required(),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("context"),
    ParamSpec::text("labels"),
    ParamSpec::bool("ignore"),
];

/// Include keys for hosts whose include primitive predates labels.
const INCLUDE_WITHOUT_LABELS: &[ParamSpec] = &[
    ParamSpec::text("file").required(),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::text("context"),
];

const INCLUDE_ALL: &[ParamSpec] = &[
    ParamSpec::text("path").required(),
    ParamSpec::bool("relativeToChangelogFile"),
    ParamSpec::bool("errorIfMissingOrEmpty"),
    ParamSpec::text("resourceComparator"),
    ParamSpec::text("filter"),
    ParamSpec::text("context"),
    ParamSpec::text("labels"),
    ParamSpec::bool("ignore"),
];

const PROPERTY: &[ParamSpec] = &[
    ParamSpec::text("name"),
    ParamSpec::text("value"),
    ParamSpec::text("context"),
    ParamSpec::text("labels"),
    ParamSpec::text("dbms"),
    ParamSpec::bool("global"),
    ParamSpec::text("file"),
];

/// Filters an include hands down to the changesets it splices in.
#[derive(Debug, Clone, Default)]
struct Inclusion {
    contexts: Option<ContextExpression>,
    labels: Option<Labels>,
    ignore: bool,
}

impl Inclusion {
    fn from_params(params: &Params) -> Self {
        Self {
            contexts: params.text("context").map(ContextExpression::new),
            labels: params.text("labels").map(Labels::parse),
            ignore: params.flag("ignore").unwrap_or(false),
        }
    }
}

impl Session<'_> {
    /// Read, parse and build one changelog file.
    ///
    /// `source` bypasses the accessor for the root of an in-memory build.
    pub(crate) fn load(
        &mut self,
        path: &str,
        source: Option<&str>,
        params: Vec<(String, Value)>,
    ) -> ChangelogResult<ChangeLog> {
        let path = normalize(path);
        if self.include_stack.iter().any(|p| same_path(p, &path)) {
            let mut chain = self.include_stack.clone();
            chain.push(path.clone());
            return Err(ChangelogError::CircularInclude {
                path,
                chain: chain.join(" -> "),
            });
        }

        let text = match source {
            Some(source) => source.to_string(),
            None => self.parser.accessor.read(&path)?,
        };
        let script = parse_script(&text).map_err(|e| ChangelogError::Syntax {
            path: path.clone(),
            line: e.line,
            message: e.message,
        })?;
        tracing::debug!(path = %path, depth = self.include_stack.len(), "loading changelog");

        self.include_stack.push(path.clone());
        let built = self.build_changelog(&path, &script, params);
        self.include_stack.pop();
        built
    }

    fn build_changelog(
        &mut self,
        path: &str,
        script: &Script,
        params: Vec<(String, Value)>,
    ) -> ChangelogResult<ChangeLog> {
        let mut log = ChangeLog::new(path);
        apply_changelog_params(&mut log, params)?;

        for node in &script.nodes {
            if node.name != "databaseChangeLog" {
                return Err(ChangelogError::unknown_element(&node.name, "a changelog script"));
            }
            let args = self.named_args(node, path)?;
            apply_changelog_params(&mut log, args)?;

            for item in node.items() {
                match item {
                    Item::Node(child) => self.changelog_element(&mut log, child)?,
                    Item::Text(_) => {
                        return Err(ChangelogError::Validation(format!(
                            "databaseChangeLog at line {} only takes elements, not text",
                            node.line
                        )));
                    }
                }
            }
        }
        Ok(log)
    }

    fn changelog_element(&mut self, log: &mut ChangeLog, node: &Node) -> ChangelogResult<()> {
        match node.name.as_str() {
            "changeSet" => {
                let change_set = self.build_change_set(log, node)?;
                log.change_sets.push(change_set);
            }
            "include" => self.include(log, node)?,
            "includeAll" => self.include_all(log, node)?,
            "property" => self.property(log, node)?,
            "preConditions" => {
                let container = self.build_preconditions(&log.physical_path, None, node)?;
                match &mut log.preconditions {
                    Some(existing) => existing
                        .nested
                        .push(Precondition::Container(Box::new(container))),
                    None => log.preconditions = Some(container),
                }
            }
            other => return Err(ChangelogError::unknown_element(other, "databaseChangeLog")),
        }
        Ok(())
    }

    fn include(&mut self, log: &mut ChangeLog, node: &Node) -> ChangelogResult<()> {
        reject_block(node)?;
        let schema = if self.parser.config.host_include_labels {
            INCLUDE
        } else {
            INCLUDE_WITHOUT_LABELS
        };
        let params = self.schema_params(schema, node, &log.physical_path, None, Some("file"))?;
        check_required("include", schema, params.as_map(), None)?;

        let file = params.text("file").unwrap_or_default();
        let relative = params.flag("relativeToChangelogFile").unwrap_or(false);
        self.include_file(log, file, relative, &Inclusion::from_params(&params))
    }

    fn include_all(&mut self, log: &mut ChangeLog, node: &Node) -> ChangelogResult<()> {
        reject_block(node)?;
        let args = self.named_args(node, &log.physical_path)?;
        if args.iter().any(|(key, _)| key == "resourceFilter") {
            return Err(ChangelogError::Validation(
                "includeAll 'resourceFilter' is no longer supported, use 'filter' instead"
                    .to_string(),
            ));
        }
        let params = apply_schema("includeAll", INCLUDE_ALL, args, None)?;
        check_required("includeAll", INCLUDE_ALL, params.as_map(), None)?;

        let directory = params.text("path").unwrap_or_default();
        if has_unresolved(directory) {
            return Err(ChangelogError::UnresolvedPath {
                path: directory.to_string(),
            });
        }

        let parser = self.parser;
        let filter = params
            .text("filter")
            .map(|name| parser.plugins.filter(name))
            .transpose()?;
        let comparator = params
            .text("resourceComparator")
            .map(|name| parser.plugins.comparator(name))
            .transpose()?;
        let options = ListOptions {
            filter: filter.as_deref(),
            comparator: comparator.as_deref(),
            error_if_missing_or_empty: params.flag("errorIfMissingOrEmpty").unwrap_or(true),
        };

        let enumerator =
            ResourceEnumerator::new(parser.accessor.as_ref(), parser.config.relative_path_fixup);
        let relative = params.flag("relativeToChangelogFile").unwrap_or(false);
        let files = enumerator.list(&log.physical_path, relative, directory, true, &options)?;
        tracing::debug!(directory, files = files.len(), "includeAll");

        let inclusion = Inclusion::from_params(&params);
        for file in &files {
            self.include_file(log, file, false, &inclusion)?;
        }
        Ok(())
    }

    /// Build `file` with this session and splice its changesets into `log`.
    fn include_file(
        &mut self,
        log: &mut ChangeLog,
        file: &str,
        relative: bool,
        inclusion: &Inclusion,
    ) -> ChangelogResult<()> {
        let target = if relative {
            relative_to(&log.physical_path, file)
        } else {
            normalize(file)
        };
        if !has_dsl_extension(&target) {
            return Err(ChangelogError::resource(
                &target,
                format!("included files must be .{} changelogs", DSL_EXTENSION),
            ));
        }

        let mut child = self.load(&target, None, Vec::new())?;
        child.include_contexts = inclusion.contexts.clone();
        child.include_labels = inclusion.labels.clone();
        child.include_ignore = inclusion.ignore;
        tracing::debug!(
            parent = %log.physical_path,
            child = %child.physical_path,
            change_sets = child.change_sets.len(),
            "included changelog"
        );
        splice(log, child);
        Ok(())
    }

    fn property(&mut self, log: &ChangeLog, node: &Node) -> ChangelogResult<()> {
        reject_block(node)?;
        let path = log.physical_path.as_str();
        let params = self.schema_params(PROPERTY, node, path, None, None)?;
        let scope = PropertyScope {
            contexts: params.text("context").map(ContextExpression::new),
            labels: params.text("labels").map(Labels::parse),
            dbms: split_list(params.text("dbms")),
            global: params.flag("global").unwrap_or(true),
        };

        match (params.text("file"), params.text("name")) {
            (Some(_), Some(_)) => Err(ChangelogError::Validation(
                "property takes either 'file' or 'name' and 'value', not both".to_string(),
            )),
            (Some(file), None) => {
                let text = self.parser.accessor.read(file)?;
                let pairs = parse_properties(&text);
                tracing::debug!(file, properties = pairs.len(), "loaded properties file");
                for (name, value) in pairs {
                    self.properties.set(Property {
                        name,
                        value,
                        changelog: path.to_string(),
                        scope: scope.clone(),
                    });
                }
                Ok(())
            }
            (None, Some(name)) => {
                let value = params
                    .text("value")
                    .ok_or_else(|| ChangelogError::missing_attribute("property", "value", None))?;
                self.properties.set(Property {
                    name: name.to_string(),
                    value: value.to_string(),
                    changelog: path.to_string(),
                    scope,
                });
                Ok(())
            }
            (None, None) => Err(ChangelogError::Validation(
                "property requires either 'file' or 'name' and 'value'".to_string(),
            )),
        }
    }
}

/// `logicalFilePath`, `context` and `objectQuotingStrategy`, from the host or
/// from `databaseChangeLog(...)`.
fn apply_changelog_params(log: &mut ChangeLog, args: Vec<(String, Value)>) -> ChangelogResult<()> {
    if args.is_empty() {
        return Ok(());
    }
    let params = apply_schema("databaseChangeLog", CHANGELOG, args, None)?;
    if let Some(logical) = params.text("logicalFilePath") {
        log.logical_path = Some(logical.to_string());
    }
    if let Some(context) = params.text("context") {
        log.contexts = Some(ContextExpression::new(context));
    }
    if let Some(raw) = params.text("objectQuotingStrategy") {
        log.object_quoting_strategy = Some(parse_enum::<ObjectQuotingStrategy>(
            "objectQuotingStrategy",
            raw,
            ObjectQuotingStrategy::NAMES,
        )?);
    }
    Ok(())
}

fn reject_block(node: &Node) -> ChangelogResult<()> {
    match node.body {
        Some(_) => Err(ChangelogError::Validation(format!(
            "'{}' at line {} does not take a block",
            node.name, node.line
        ))),
        None => Ok(()),
    }
}

/// Append an included changelog's changesets and fold in its preconditions.
///
/// Inherited filters are prepended, so they read outermost first.
fn splice(log: &mut ChangeLog, child: ChangeLog) {
    let ChangeLog {
        contexts,
        change_sets,
        preconditions,
        include_contexts,
        include_labels,
        include_ignore,
        ..
    } = child;

    for mut change_set in change_sets {
        if let Some(contexts) = &contexts {
            change_set.inherited_contexts.insert(0, contexts.clone());
        }
        if let Some(contexts) = &include_contexts {
            change_set.inherited_contexts.insert(0, contexts.clone());
        }
        if let Some(labels) = &include_labels {
            change_set.inherited_labels.insert(0, labels.clone());
        }
        if include_ignore {
            change_set.ignore = true;
        }
        log.change_sets.push(change_set);
    }

    if let Some(container) = preconditions {
        log.preconditions
            .get_or_insert_with(Default::default)
            .nested
            .push(Precondition::Container(Box::new(container)));
    }
}
