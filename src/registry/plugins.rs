//! Named include filters and resource comparators for `includeAll`.

use crate::error::{ChangelogError, ChangelogResult};
use crate::resource::{IncludeFilter, LexicalOrder, ResourceComparator, ReverseOrder};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A registered implementation and the capability it provides.
#[derive(Clone)]
pub enum Plugin {
    Filter(Arc<dyn IncludeFilter>),
    Comparator(Arc<dyn ResourceComparator>),
}

impl Plugin {
    pub fn filter(filter: impl IncludeFilter + 'static) -> Self {
        Plugin::Filter(Arc::new(filter))
    }

    pub fn comparator(comparator: impl ResourceComparator + 'static) -> Self {
        Plugin::Comparator(Arc::new(comparator))
    }

    pub fn capability(&self) -> &'static str {
        match self {
            Plugin::Filter(_) => "IncludeFilter",
            Plugin::Comparator(_) => "ResourceComparator",
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugin({})", self.capability())
    }
}

/// Name -> plugin lookup used by `includeAll(filter:, resourceComparator:)`.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Plugin>,
}

impl PluginRegistry {
    /// Registry with the built-in `lexical` and `reverse` comparators.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register("lexical", Plugin::comparator(LexicalOrder));
        registry.register("reverse", Plugin::comparator(ReverseOrder));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, plugin: Plugin) {
        let name = name.into();
        tracing::debug!(name = %name, capability = plugin.capability(), "registered plugin");
        self.plugins.insert(name, plugin);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn filter(&self, name: &str) -> ChangelogResult<Arc<dyn IncludeFilter>> {
        match self.plugins.get(name) {
            Some(Plugin::Filter(filter)) => Ok(Arc::clone(filter)),
            Some(_) => Err(ChangelogError::PluginCapability {
                name: name.to_string(),
                expected: "IncludeFilter".to_string(),
            }),
            None => Err(ChangelogError::UnknownPlugin {
                name: name.to_string(),
                capability: "include filter".to_string(),
            }),
        }
    }

    pub fn comparator(&self, name: &str) -> ChangelogResult<Arc<dyn ResourceComparator>> {
        match self.plugins.get(name) {
            Some(Plugin::Comparator(comparator)) => Ok(Arc::clone(comparator)),
            Some(_) => Err(ChangelogError::PluginCapability {
                name: name.to_string(),
                expected: "ResourceComparator".to_string(),
            }),
            None => Err(ChangelogError::UnknownPlugin {
                name: name.to_string(),
                capability: "resource comparator".to_string(),
            }),
        }
    }
}
