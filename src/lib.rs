//! # qail-changelog
//!
//! Parse `.qcl` changelog scripts into validated changeset graphs.
//!
//! A changelog is a tree of `changeSet` elements, each holding typed
//! changes (`createTable`, `sql`, `addColumn`, ...), rollback, preconditions
//! and SQL rewrite rules. Every attribute is checked against the schema of
//! its element, `${property}` tokens are expanded, and `include` /
//! `includeAll` splice other changelogs in place. Running the result against
//! a database is left to the host engine.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use qail_changelog::prelude::*;
//!
//! let parser = ChangelogParser::new(FileSystemAccessor::current_dir()?);
//! let log = parser.parse("db/changelog.qcl")?;
//!
//! for cs in &log.change_sets {
//!     println!("{}::{}::{} ({} changes)", cs.file_path, cs.author, cs.id, cs.changes.len());
//! }
//! ```
//!
//! ## Script Syntax
//!
//! ```text
//! databaseChangeLog(logicalFilePath: 'app') {
//!     property(name: 'schema', value: 'public')
//!
//!     changeSet(id: '1', author: 'amy') {
//!         createTable(tableName: 'person', schemaName: '${schema}') {
//!             column(name: 'id', type: 'int') { constraints(primaryKey: true) }
//!             column 'name'
//!         }
//!         rollback { dropTable(tableName: 'person') }
//!     }
//!
//!     includeAll(path: 'changes/', relativeToChangelogFile: true)
//! }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod expand;
pub mod model;
pub mod registry;
pub mod resource;
pub mod script;
pub mod truth;

pub mod prelude {
    pub use crate::builder::ChangelogParser;
    pub use crate::config::{Environment, ParserConfig};
    pub use crate::error::*;
    pub use crate::model::*;
    pub use crate::registry::{Extension, Plugin};
    pub use crate::resource::{
        FileSystemAccessor, IncludeFilter, MemoryAccessor, ResourceAccessor, ResourceComparator,
    };
}

pub use builder::ChangelogParser;

/// Build a changelog from the filesystem with default settings.
///
/// # Example
///
/// ```no_run
/// let log = qail_changelog::parse_file("db/changelog.qcl").unwrap();
/// println!("{} changesets", log.change_sets.len());
/// ```
pub fn parse_file(path: &str) -> error::ChangelogResult<model::ChangeLog> {
    let accessor = resource::FileSystemAccessor::current_dir()?;
    ChangelogParser::new(accessor).parse(path)
}
