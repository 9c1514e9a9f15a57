//! Combines extension-driven selection with manual per-path overrides.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::exclusion::ExclusionList;
use super::path_set::PathSet;
use super::paths::{file_extension, normalize_path};

/// Explicit include/exclude decisions made by the user, keyed by path.
///
/// A key may be a file or a directory; a directory key covers its subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualOverrides {
    entries: BTreeMap<PathBuf, bool>,
}

impl ManualOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, path: &Path) {
        self.entries.insert(normalize_path(path), true);
    }

    pub fn exclude(&mut self, path: &Path) {
        self.entries.insert(normalize_path(path), false);
    }

    /// Drops any override for exactly `path`.
    pub fn forget(&mut self, path: &Path) -> bool {
        self.entries.remove(&normalize_path(path)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<bool> {
        self.entries.get(path).copied()
    }

    /// The decision of the deepest override that covers `file`, if any.
    /// An override on the file itself is the deepest possible.
    pub fn most_specific(&self, file: &Path) -> Option<bool> {
        file.ancestors().find_map(|candidate| self.get(candidate))
    }

    /// Keeps overrides consistent with a rename on disk.
    pub fn rename_subtree(&mut self, old: &Path, new: &Path) {
        let old = normalize_path(old);
        let new = normalize_path(new);
        let moved: Vec<(PathBuf, bool)> = self
            .entries
            .iter()
            .filter(|(path, _)| path.starts_with(&old))
            .map(|(path, included)| (path.clone(), *included))
            .collect();
        for (path, included) in moved {
            self.entries.remove(&path);
            if let Ok(rest) = path.strip_prefix(&old) {
                self.entries.insert(new.join(rest), included);
            }
        }
    }

    pub fn remove_subtree(&mut self, path: &Path) {
        let path = normalize_path(path);
        self.entries.retain(|key, _| !key.starts_with(&path));
    }
}

/// Recomputes the effective inclusion map from scratch.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    exclusions: ExclusionList,
}

impl SelectionEngine {
    pub fn new(exclusions: ExclusionList) -> Self {
        Self { exclusions }
    }

    /// Walks `root` and decides inclusion for every file found.
    ///
    /// The most specific manual override wins (file over directory, deeper
    /// directory over shallower one). Without one, a file is included when its
    /// extension is selected. Hidden items and everything below them are not
    /// visited at all, nor are excluded directories.
    pub fn recompute(
        &self,
        root: &Path,
        selected_extensions: &BTreeSet<String>,
        manual: &ManualOverrides,
        hidden: &PathSet,
    ) -> BTreeMap<PathBuf, bool> {
        let root = normalize_path(root);
        let hidden_prefixes = hidden.to_vec();

        self.exclusions
            .walk_files(&root, &hidden_prefixes)
            .into_iter()
            .map(|file| {
                let included = manual.most_specific(&file).unwrap_or_else(|| {
                    file_extension(&file).is_some_and(|ext| selected_extensions.contains(&ext))
                });
                (file, included)
            })
            .collect()
    }

    /// The included files of a recompute result, in path order.
    pub fn included_files(selection: &BTreeMap<PathBuf, bool>) -> Vec<PathBuf> {
        selection
            .iter()
            .filter(|(_, included)| **included)
            .map(|(path, _)| path.clone())
            .collect()
    }
}
