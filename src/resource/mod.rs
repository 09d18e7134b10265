//! Resource access: where changelog files live.
//!
//! Two roots are supported: real filesystem paths (relative to a working
//! root, or absolute) and a `classpath:` virtual root searched across a list
//! of directories.

pub mod enumerate;

use crate::error::{ChangelogError, ChangelogResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use enumerate::{
    DSL_EXTENSION, IncludeFilter, LexicalOrder, ListOptions, ResourceComparator,
    ResourceEnumerator, ReverseOrder, has_dsl_extension,
};

/// Prefix marking a path on the virtual root.
pub const CLASSPATH_PREFIX: &str = "classpath:";

/// Reads and lists changelog resources for the builder.
pub trait ResourceAccessor {
    /// Read a whole file as text.
    fn read(&self, path: &str) -> ChangelogResult<String>;

    /// List files below `dir` (normalised, trailing `/`).
    ///
    /// A directory that does not exist yields an empty list.
    fn list(&self, dir: &str, recursive: bool) -> ChangelogResult<Vec<String>>;
}

/// True for `classpath:` paths.
pub fn is_virtual(path: &str) -> bool {
    path.starts_with(CLASSPATH_PREFIX)
}

/// True for paths with a leading root marker (`/` or a drive letter).
pub fn is_absolute(path: &str) -> bool {
    let path = path.replace('\\', "/");
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b":/")
}

/// Canonical form: `/` separators, no `.` segments, `..` collapsed where possible.
///
/// A trailing `/` is kept so directory prefixes stay recognisable.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (prefix, rest) = match path.strip_prefix(CLASSPATH_PREFIX) {
        Some(rest) => (CLASSPATH_PREFIX, rest),
        None => ("", path.as_str()),
    };
    let absolute = rest.starts_with('/');
    let trailing = rest.len() > 1 && rest.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }

    let mut out = String::from(prefix);
    if absolute {
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    if trailing && !parts.is_empty() {
        out.push('/');
    }
    out
}

/// Normalise and force a trailing separator.
pub fn as_directory(path: &str) -> String {
    let mut dir = normalize(path);
    if !dir.is_empty() && !dir.ends_with('/') {
        dir.push('/');
    }
    dir
}

/// Directory part of a file path, including the trailing `/` (empty if none).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[..=pos],
        None => match path.strip_prefix(CLASSPATH_PREFIX) {
            Some(_) => CLASSPATH_PREFIX,
            None => "",
        },
    }
}

/// Resolve `path` against the directory of `base`.
pub fn relative_to(base: &str, path: &str) -> String {
    normalize(&format!("{}{}", parent_dir(base), path))
}

/// Filesystem accessor with an optional set of `classpath:` roots.
#[derive(Debug, Clone)]
pub struct FileSystemAccessor {
    root: PathBuf,
    classpath: Vec<PathBuf>,
}

impl FileSystemAccessor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            classpath: Vec::new(),
        }
    }

    /// Accessor rooted at the process working directory.
    pub fn current_dir() -> ChangelogResult<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Add a directory searched for `classpath:` paths.
    pub fn with_classpath(mut self, dir: impl Into<PathBuf>) -> Self {
        self.classpath.push(dir.into());
        self
    }

    fn candidates(&self, path: &str) -> Vec<PathBuf> {
        if let Some(rest) = path.strip_prefix(CLASSPATH_PREFIX) {
            let rest = rest.trim_start_matches('/');
            self.classpath.iter().map(|root| root.join(rest)).collect()
        } else if is_absolute(path) {
            vec![PathBuf::from(path)]
        } else {
            vec![self.root.join(path)]
        }
    }
}

fn walk(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                walk(&path, recursive, out)?;
            }
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl ResourceAccessor for FileSystemAccessor {
    fn read(&self, path: &str) -> ChangelogResult<String> {
        let found = self.candidates(path).into_iter().find(|c| c.is_file());
        match found {
            Some(file) => fs::read_to_string(&file)
                .map_err(|e| ChangelogError::resource(path, format!("cannot read file: {}", e))),
            None => Err(ChangelogError::resource(path, "file not found")),
        }
    }

    /// Filesystem listings come back as absolute paths; `classpath:` listings
    /// come back relative to their root, with the prefix.
    fn list(&self, dir: &str, recursive: bool) -> ChangelogResult<Vec<String>> {
        let mut results = Vec::new();

        if let Some(rest) = dir.strip_prefix(CLASSPATH_PREFIX) {
            let rest = rest.trim_start_matches('/');
            for root in &self.classpath {
                let base = root.join(rest);
                if !base.is_dir() {
                    continue;
                }
                let mut files = Vec::new();
                walk(&base, recursive, &mut files)?;
                for file in files {
                    if let Ok(relative) = file.strip_prefix(root) {
                        results.push(format!("{}{}", CLASSPATH_PREFIX, slashed(relative)));
                    }
                }
            }
            return Ok(results);
        }

        for base in self.candidates(dir) {
            if !base.is_dir() {
                continue;
            }
            let base = fs::canonicalize(&base)?;
            let mut files = Vec::new();
            walk(&base, recursive, &mut files)?;
            results.extend(files.iter().map(|f| slashed(f)));
        }
        Ok(results)
    }
}

/// In-memory accessor keyed by normalised path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessor {
    files: BTreeMap<String, String>,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        self.files.insert(normalize(path), content.into());
    }
}

impl ResourceAccessor for MemoryAccessor {
    fn read(&self, path: &str) -> ChangelogResult<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| ChangelogError::resource(path, "file not found"))
    }

    fn list(&self, dir: &str, recursive: bool) -> ChangelogResult<Vec<String>> {
        let dir = as_directory(dir);
        Ok(self
            .files
            .keys()
            .filter(|path| match path.strip_prefix(dir.as_str()) {
                Some(rest) => !rest.is_empty() && (recursive || !rest.contains('/')),
                None => false,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("db\\changes\\a.qcl"), "db/changes/a.qcl");
        assert_eq!(normalize("./db/./x/../a.qcl"), "db/a.qcl");
        assert_eq!(normalize("../shared/a.qcl"), "../shared/a.qcl");
        assert_eq!(normalize("/abs//dir/"), "/abs/dir/");
        assert_eq!(normalize("classpath:/db/../x.qcl"), "classpath:/x.qcl");
    }

    #[test]
    fn test_absolute_detection() {
        assert!(is_absolute("/etc/db"));
        assert!(is_absolute("C:\\work\\db"));
        assert!(!is_absolute("db/changes"));
        assert!(!is_absolute("classpath:db"));
        assert!(is_virtual("classpath:db"));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("db/main.qcl", "sub/a.qcl"), "db/sub/a.qcl");
        assert_eq!(relative_to("main.qcl", "a.qcl"), "a.qcl");
        assert_eq!(relative_to("db/x/main.qcl", "../a.qcl"), "db/a.qcl");
        assert_eq!(as_directory("db\\dir"), "db/dir/");
    }

    #[test]
    fn test_memory_listing() {
        let accessor = MemoryAccessor::new()
            .with_file("db/a.qcl", "")
            .with_file("db/sub/b.qcl", "")
            .with_file("dbx/c.qcl", "");
        assert_eq!(accessor.list("db", false).unwrap(), vec!["db/a.qcl"]);
        assert_eq!(
            accessor.list("db/", true).unwrap(),
            vec!["db/a.qcl", "db/sub/b.qcl"]
        );
        assert!(accessor.list("missing", true).unwrap().is_empty());
        assert!(accessor.read("nope.qcl").unwrap_err().is_resource());
    }

    #[test]
    fn test_filesystem_read_and_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("db/sub")).unwrap();
        fs::write(dir.path().join("db/a.qcl"), "x").unwrap();
        fs::write(dir.path().join("db/sub/b.qcl"), "y").unwrap();

        let accessor = FileSystemAccessor::new(dir.path());
        assert_eq!(accessor.read("db/a.qcl").unwrap(), "x");

        let listed = accessor.list("db/", true).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|p| is_absolute(p)));

        let shallow = accessor.list("db/", false).unwrap();
        assert_eq!(shallow.len(), 1);
        assert!(accessor.list("missing/", true).unwrap().is_empty());
    }

    #[test]
    fn test_classpath_listing_is_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("db")).unwrap();
        fs::write(dir.path().join("db/a.qcl"), "x").unwrap();

        let accessor = FileSystemAccessor::new(".").with_classpath(dir.path());
        assert_eq!(
            accessor.list("classpath:db/", false).unwrap(),
            vec!["classpath:db/a.qcl"]
        );
        assert_eq!(accessor.read("classpath:db/a.qcl").unwrap(), "x");
    }
}
