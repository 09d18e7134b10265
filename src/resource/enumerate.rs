//! Directory enumeration for `includeAll`.

use super::{ResourceAccessor, as_directory, is_absolute, is_virtual, parent_dir};
use crate::error::{ChangelogError, ChangelogResult};
use std::cmp::Ordering;

/// File extension every enumerated changelog must carry.
pub const DSL_EXTENSION: &str = "qcl";

/// Decides whether a listed path is included.
pub trait IncludeFilter {
    fn include(&self, path: &str) -> bool;
}

/// Orders listed paths.
pub trait ResourceComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Plain lexicographic order, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalOrder;

impl ResourceComparator for LexicalOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Reverse lexicographic order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseOrder;

impl ResourceComparator for ReverseOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        b.cmp(a)
    }
}

/// True when the path ends in `.qcl` (any case).
pub fn has_dsl_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case(DSL_EXTENSION))
}

/// Extension rule first, user filter only for paths that pass it.
struct CombinedFilter<'a> {
    user: Option<&'a dyn IncludeFilter>,
}

impl IncludeFilter for CombinedFilter<'_> {
    fn include(&self, path: &str) -> bool {
        has_dsl_extension(path) && self.user.is_none_or(|f| f.include(path))
    }
}

/// Optional knobs for [`ResourceEnumerator::list`].
#[derive(Clone, Copy)]
pub struct ListOptions<'a> {
    pub filter: Option<&'a dyn IncludeFilter>,
    pub comparator: Option<&'a dyn ResourceComparator>,
    pub error_if_missing_or_empty: bool,
}

impl Default for ListOptions<'_> {
    fn default() -> Self {
        Self {
            filter: None,
            comparator: None,
            error_if_missing_or_empty: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMode {
    RelativeToChangelog,
    Virtual,
    Absolute,
    WorkingDirectory,
}

/// Lists the changelog files of a directory in include order.
pub struct ResourceEnumerator<'a> {
    accessor: &'a dyn ResourceAccessor,
    relative_path_fixup: bool,
}

impl<'a> ResourceEnumerator<'a> {
    pub fn new(accessor: &'a dyn ResourceAccessor, relative_path_fixup: bool) -> Self {
        Self {
            accessor,
            relative_path_fixup,
        }
    }

    /// List `directory`, optionally resolved against the directory of
    /// `base_path`, filtered, sorted and deduplicated.
    pub fn list(
        &self,
        base_path: &str,
        relative: bool,
        directory: &str,
        recursive: bool,
        options: &ListOptions<'_>,
    ) -> ChangelogResult<Vec<String>> {
        let directory = as_directory(directory);
        let mode = if relative {
            PathMode::RelativeToChangelog
        } else if is_virtual(&directory) {
            PathMode::Virtual
        } else if is_absolute(&directory) {
            PathMode::Absolute
        } else {
            PathMode::WorkingDirectory
        };
        let resolved = match mode {
            PathMode::RelativeToChangelog => {
                as_directory(&format!("{}{}", parent_dir(base_path), directory))
            }
            _ => directory.clone(),
        };
        tracing::debug!(directory = %resolved, ?mode, recursive, "Listing changelog directory");

        let filter = CombinedFilter {
            user: options.filter,
        };
        let mut paths: Vec<String> = self
            .accessor
            .list(&resolved, recursive)?
            .into_iter()
            .filter(|p| filter.include(p))
            .collect();

        if self.relative_path_fixup && !is_absolute(&directory) && !is_virtual(&directory) {
            for path in &mut paths {
                if let Some(pos) = path.find(resolved.as_str()) {
                    path.drain(..pos);
                }
            }
        }

        // Duplicates go before the user comparator runs: it need not keep them adjacent.
        paths.sort();
        paths.dedup();
        if let Some(comparator) = options.comparator {
            paths.sort_by(|a, b| comparator.compare(a, b));
        }

        if paths.is_empty() && options.error_if_missing_or_empty {
            return Err(ChangelogError::resource(
                directory,
                "Could not find directory or directory was empty for includeAll",
            ));
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FileSystemAccessor, MemoryAccessor};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn accessor() -> MemoryAccessor {
        MemoryAccessor::new()
            .with_file("db/dir/b.qcl", "")
            .with_file("db/dir/a.qcl", "")
            .with_file("db/dir/notes.txt", "")
            .with_file("db/dir/sub/c.qcl", "")
    }

    struct AcceptAll;
    impl IncludeFilter for AcceptAll {
        fn include(&self, _path: &str) -> bool {
            true
        }
    }

    struct SkipB;
    impl IncludeFilter for SkipB {
        fn include(&self, path: &str) -> bool {
            !path.ends_with("b.qcl")
        }
    }

    #[test]
    fn test_sorted_and_filtered() {
        let accessor = accessor();
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let paths = enumerator
            .list("", false, "db/dir", true, &ListOptions::default())
            .unwrap();
        assert_eq!(paths, vec!["db/dir/a.qcl", "db/dir/b.qcl", "db/dir/sub/c.qcl"]);

        let shallow = enumerator
            .list("", false, "db/dir", false, &ListOptions::default())
            .unwrap();
        assert_eq!(shallow, vec!["db/dir/a.qcl", "db/dir/b.qcl"]);
    }

    #[test]
    fn test_relative_to_changelog() {
        let accessor = accessor();
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let paths = enumerator
            .list("db/main.qcl", true, "dir/", false, &ListOptions::default())
            .unwrap();
        assert_eq!(paths, vec!["db/dir/a.qcl", "db/dir/b.qcl"]);
    }

    #[test]
    fn test_comparator_and_user_filter() {
        let accessor = accessor();
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let options = ListOptions {
            filter: Some(&SkipB),
            comparator: Some(&ReverseOrder),
            ..ListOptions::default()
        };
        let paths = enumerator.list("", false, "db/dir", true, &options).unwrap();
        assert_eq!(paths, vec!["db/dir/sub/c.qcl", "db/dir/a.qcl"]);
    }

    #[test]
    fn test_user_filter_cannot_admit_other_extensions() {
        let accessor = accessor();
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let options = ListOptions {
            filter: Some(&AcceptAll),
            ..ListOptions::default()
        };
        let paths = enumerator.list("", false, "db/dir", true, &options).unwrap();
        assert!(paths.iter().all(|p| has_dsl_extension(p)));
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_listing_is_idempotent() {
        let accessor = accessor();
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let first = enumerator
            .list("", false, "db/dir", true, &ListOptions::default())
            .unwrap();
        let second = enumerator
            .list("", false, "db/dir", true, &ListOptions::default())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_directory_policy() {
        let accessor = accessor();
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let err = enumerator
            .list("", false, "nowhere", true, &ListOptions::default())
            .unwrap_err();
        assert!(err.is_resource());
        assert!(err.to_string().contains("directory was empty"));

        let options = ListOptions {
            error_if_missing_or_empty: false,
            ..ListOptions::default()
        };
        assert!(enumerator.list("", false, "nowhere", true, &options).unwrap().is_empty());
    }

    #[test]
    fn test_fixup_strips_absolute_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("changes/v1")).unwrap();
        fs::write(dir.path().join("changes/v1/001.qcl"), "").unwrap();
        fs::write(dir.path().join("changes/v1/002.qcl"), "").unwrap();

        let accessor = FileSystemAccessor::new(dir.path());
        let enumerator = ResourceEnumerator::new(&accessor, true);
        let paths = enumerator
            .list("", false, "changes/v1", false, &ListOptions::default())
            .unwrap();
        assert_eq!(paths, vec!["changes/v1/001.qcl", "changes/v1/002.qcl"]);

        let raw = ResourceEnumerator::new(&accessor, false)
            .list("", false, "changes/v1", false, &ListOptions::default())
            .unwrap();
        assert!(raw.iter().all(|p| is_absolute(p)));
    }

    /// Lists the same file from two roots, as overlapping classpath roots do.
    struct OverlappingRoots;

    impl ResourceAccessor for OverlappingRoots {
        fn read(&self, path: &str) -> ChangelogResult<String> {
            Err(ChangelogError::resource(path, "not readable"))
        }

        fn list(&self, _dir: &str, _recursive: bool) -> ChangelogResult<Vec<String>> {
            Ok(vec![
                "db/dir/a.qcl".to_string(),
                "db/dir/b.qcl".to_string(),
                "db/dir/a.qcl".to_string(),
            ])
        }
    }

    /// Treats every pair as equal, so a stable sort keeps listing order.
    struct Unordered;

    impl ResourceComparator for Unordered {
        fn compare(&self, _a: &str, _b: &str) -> Ordering {
            Ordering::Equal
        }
    }

    #[test]
    fn test_duplicates_removed_under_any_comparator() {
        let enumerator = ResourceEnumerator::new(&OverlappingRoots, true);
        let options = ListOptions {
            comparator: Some(&Unordered),
            ..ListOptions::default()
        };
        let paths = enumerator.list("", false, "db/dir", true, &options).unwrap();
        assert_eq!(paths, vec!["db/dir/a.qcl", "db/dir/b.qcl"]);

        let reversed = ListOptions {
            comparator: Some(&ReverseOrder),
            ..ListOptions::default()
        };
        let paths = enumerator.list("", false, "db/dir", true, &reversed).unwrap();
        assert_eq!(paths, vec!["db/dir/b.qcl", "db/dir/a.qcl"]);
    }

    #[test]
    fn test_extension_check() {
        assert!(has_dsl_extension("a.qcl"));
        assert!(has_dsl_extension("dir/A.QCL"));
        assert!(!has_dsl_extension("a.sql"));
        assert!(!has_dsl_extension(".qcl"));
    }
}
