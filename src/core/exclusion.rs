//! The static exclusion list and the pruned recursive walk built on it.

use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::paths::is_same_or_descendant;

/// Basenames that are skipped unconditionally, whatever the hidden settings.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    names: Arc<BTreeSet<String>>,
}

impl ExclusionList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Arc::new(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_excluded(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.names.contains(n))
    }

    /// Walks `root` recursively and returns every regular file, sorted by path.
    ///
    /// Excluded directories are pruned before they are descended into, as are
    /// entries matched by `hidden_prefixes` (exact or ancestor match). Errors
    /// on individual entries (permissions, races) drop that entry only.
    pub fn walk_files(&self, root: &Path, hidden_prefixes: &[PathBuf]) -> Vec<PathBuf> {
        let names = self.names.clone();
        let hidden: Arc<Vec<PathBuf>> = Arc::new(hidden_prefixes.to_vec());

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let excluded = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| names.contains(n));
                let hidden = hidden
                    .iter()
                    .any(|h| is_same_or_descendant(entry.path(), h));
                !excluded && !hidden
            });

        let mut files = Vec::new();
        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => tracing::debug!("Skipping unreadable entry: {}", e),
            }
        }
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_walk_prunes_excluded_and_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.py");
        touch(root, "src/b.py");
        touch(root, "src/deep/c.py");
        touch(root, "node_modules/x.js");
        touch(root, ".git/config");
        touch(root, "secret/d.py");

        let exclusions = ExclusionList::new(["node_modules", ".git"]);
        let files = exclusions.walk_files(root, &[root.join("secret")]);

        assert_eq!(
            files,
            vec![
                root.join("a.py"),
                root.join("src/b.py"),
                root.join("src/deep/c.py"),
            ]
        );
    }

    #[test]
    fn test_walk_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let files = ExclusionList::default().walk_files(&dir.path().join("missing"), &[]);
        assert!(files.is_empty());
    }

    #[test]
    fn test_is_excluded() {
        let exclusions = ExclusionList::new(["venv"]);
        assert!(exclusions.is_excluded(OsStr::new("venv")));
        assert!(!exclusions.is_excluded(OsStr::new("venv2")));
    }
}
