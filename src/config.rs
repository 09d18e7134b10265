//! Parser configuration loaded from `qail-changelog.toml`.
//!
//! ```toml
//! relative_path_fixup = true
//! strict_rollback_references = false
//! strict_parameters = false
//! max_expansion_passes = 10
//! host_include_labels = true
//!
//! [environment]
//! dbms = "postgresql"
//! contexts = ["test"]
//! labels = "billing and !legacy"
//! ```

use crate::error::{ChangelogError, ChangelogResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "qail-changelog.toml";

/// Policy switches for a changelog build.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Rewrite includeAll results back to paths relative to the requested
    /// directory when the accessor hands back absolute paths.
    pub relative_path_fixup: bool,
    /// Require `changeSetAuthor` in map-form rollbacks instead of defaulting
    /// to the enclosing changeset's author.
    pub strict_rollback_references: bool,
    /// Reject changes and leaf preconditions that omit a parameter their
    /// schema marks as required. Off by default: the host validates those.
    pub strict_parameters: bool,
    /// Cap on `${...}` substitution passes.
    pub max_expansion_passes: usize,
    /// The host's include primitive accepts `labels` and `ignore`.
    pub host_include_labels: bool,
    pub environment: Environment,
}

/// The target the host will run against, used to scope properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environment {
    pub dbms: Option<String>,
    pub contexts: Vec<String>,
    pub labels: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            relative_path_fixup: true,
            strict_rollback_references: false,
            strict_parameters: false,
            max_expansion_passes: 10,
            host_include_labels: true,
            environment: Environment::default(),
        }
    }
}

impl ParserConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> ChangelogResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ChangelogError::Config(e.to_string()))?;
        if config.max_expansion_passes == 0 {
            return Err(ChangelogError::Config(
                "max_expansion_passes must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> ChangelogResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChangelogError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Look for `./qail-changelog.toml`, then `<config dir>/qail/changelog.toml`,
    /// falling back to defaults when neither exists.
    pub fn discover() -> ChangelogResult<Self> {
        for candidate in Self::candidates() {
            if candidate.is_file() {
                tracing::debug!("loading parser config from {}", candidate.display());
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("qail").join("changelog.toml"));
        }
        paths
    }
}
