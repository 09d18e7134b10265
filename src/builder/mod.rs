//! Changelog builder: turns a parsed `.qcl` script into a [`ChangeLog`].
//!
//! The builder walks the script tree depth-first. Every element is checked
//! against the schema its registry entry declares, every string goes through
//! property expansion, and includes are read through the configured
//! [`ResourceAccessor`] and spliced in place.
//!
//! ```ignore
//! use qail_changelog::builder::ChangelogParser;
//! use qail_changelog::resource::MemoryAccessor;
//!
//! let accessor = MemoryAccessor::new().with_file(
//!     "db/main.qcl",
//!     "databaseChangeLog { changeSet(id: '1', author: 'amy') { dropTable(tableName: 'monkey') } }",
//! );
//! let log = ChangelogParser::new(accessor).parse("db/main.qcl")?;
//! assert_eq!(log.change_sets.len(), 1);
//! ```

mod change;
mod changelog;
mod changeset;
mod column;
mod params;
mod precondition;

#[cfg(test)]
mod tests;

use crate::config::ParserConfig;
use crate::error::{ChangelogResult, Warning};
use crate::expand::PropertyTable;
use crate::model::{ChangeLog, Value};
use crate::registry::{ChangeRegistry, Extension, Plugin, PluginRegistry, PreconditionRegistry};
use crate::resource::{ResourceAccessor, has_dsl_extension};

/// Entry point for changelog builds.
///
/// A parser owns its registries and resource accessor and can run any
/// number of independent builds.
pub struct ChangelogParser {
    config: ParserConfig,
    changes: ChangeRegistry,
    preconditions: PreconditionRegistry,
    plugins: PluginRegistry,
    accessor: Box<dyn ResourceAccessor>,
}

impl ChangelogParser {
    /// Parser with the built-in registries and default configuration.
    pub fn new(accessor: impl ResourceAccessor + 'static) -> Self {
        Self {
            config: ParserConfig::default(),
            changes: ChangeRegistry::builtin(),
            preconditions: PreconditionRegistry::builtin(),
            plugins: PluginRegistry::builtin(),
            accessor: Box::new(accessor),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Register everything an extension contributes. Later registrations
    /// replace earlier ones with the same name.
    pub fn with_extension(mut self, extension: &dyn Extension) -> Self {
        for kind in extension.change_kinds() {
            self.changes.register(kind);
        }
        for kind in extension.precondition_kinds() {
            self.preconditions.register(kind);
        }
        for (name, plugin) in extension.plugins() {
            self.plugins.register(name, plugin);
        }
        self
    }

    pub fn with_plugin(mut self, name: impl Into<String>, plugin: Plugin) -> Self {
        self.plugins.register(name, plugin);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn changes(&self) -> &ChangeRegistry {
        &self.changes
    }

    pub fn preconditions(&self) -> &PreconditionRegistry {
        &self.preconditions
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// True when this parser handles `path` (by its `.qcl` extension).
    pub fn supports(&self, path: &str) -> bool {
        has_dsl_extension(path)
    }

    /// Build the changelog at `path`, read through the accessor.
    pub fn parse(&self, path: &str) -> ChangelogResult<ChangeLog> {
        self.run(path, None, Vec::new())
    }

    /// Build with host-supplied changelog attributes applied before the
    /// script's own (`logicalFilePath`, `context`, `objectQuotingStrategy`).
    pub fn parse_with_params(
        &self,
        path: &str,
        params: Vec<(String, Value)>,
    ) -> ChangelogResult<ChangeLog> {
        self.run(path, None, params)
    }

    /// Build from in-memory source; `path` names it for errors, relative
    /// includes and changeset identity.
    pub fn parse_str(&self, path: &str, source: &str) -> ChangelogResult<ChangeLog> {
        self.run(path, Some(source), Vec::new())
    }

    fn run(
        &self,
        path: &str,
        source: Option<&str>,
        params: Vec<(String, Value)>,
    ) -> ChangelogResult<ChangeLog> {
        let mut session = Session::new(self);
        let mut log = session.load(path, source, params)?;
        log.properties = session.properties;
        log.warnings = session.warnings;
        tracing::info!(
            path = %log.physical_path,
            change_sets = log.change_sets.len(),
            warnings = log.warnings.len(),
            "built changelog"
        );
        Ok(log)
    }
}

/// State of one build: shared by every changelog the build includes.
pub(crate) struct Session<'p> {
    parser: &'p ChangelogParser,
    properties: PropertyTable,
    /// Physical paths currently being built, outermost first.
    include_stack: Vec<String>,
    warnings: Vec<Warning>,
}

impl<'p> Session<'p> {
    fn new(parser: &'p ChangelogParser) -> Self {
        Self {
            parser,
            properties: PropertyTable::new(
                parser.config.environment.clone(),
                parser.config.max_expansion_passes,
            ),
            include_stack: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
