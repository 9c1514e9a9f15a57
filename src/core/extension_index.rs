//! Discovers which text extensions actually occur under a root.

use std::collections::BTreeSet;
use std::path::Path;

use super::exclusion::ExclusionList;
use super::paths::file_extension;

/// Scans a subtree for the distinct known text extensions it contains.
#[derive(Debug, Clone)]
pub struct ExtensionIndex {
    exclusions: ExclusionList,
    allow_list: BTreeSet<String>,
}

impl ExtensionIndex {
    pub fn new(exclusions: ExclusionList, allow_list: BTreeSet<String>) -> Self {
        Self {
            exclusions,
            allow_list,
        }
    }

    /// Returns the allow-listed extensions observed under `root`, sorted.
    ///
    /// Excluded directories are pruned before descending. Hidden items are not
    /// consulted: the result feeds filter choices, not the bundle.
    pub fn scan(&self, root: &Path) -> BTreeSet<String> {
        let observed: BTreeSet<String> = self
            .exclusions
            .walk_files(root, &[])
            .iter()
            .filter_map(|path| file_extension(path))
            .filter(|ext| self.allow_list.contains(ext))
            .collect();
        tracing::debug!("Extension scan of {:?} found {:?}", root, observed);
        observed
    }
}
