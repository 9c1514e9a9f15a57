//! A persisted, path-keyed set used for favorites and hidden items.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::paths::{is_same_or_descendant, normalize_path};
use crate::config::settings::{load_json_or_default, save_json_atomic};

/// A set of normalised absolute paths backed by a JSON list on disk.
///
/// Mutations are in-memory only; callers decide when to [`PathSet::save`].
/// The list is written sorted, which falls out of the `BTreeSet` ordering.
#[derive(Debug, Clone)]
pub struct PathSet {
    file: PathBuf,
    entries: BTreeSet<PathBuf>,
}

impl PathSet {
    /// Creates an empty set that persists to `file`, without touching disk.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            entries: BTreeSet::new(),
        }
    }

    /// Loads the set from `file`. Never fails: missing or malformed content
    /// yields an empty set and a log line.
    pub fn load(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let raw: Vec<PathBuf> = load_json_or_default(&file);
        let entries = raw.iter().map(|p| normalize_path(p)).collect();
        Self { file, entries }
    }

    pub fn save(&self) -> Result<(), CoreError> {
        save_json_atomic(&self.file, &self.entries)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    /// The entries in sorted order.
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.entries.iter().cloned().collect()
    }

    /// Exact membership.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(&normalize_path(path))
    }

    pub fn add(&mut self, path: &Path) -> bool {
        self.entries.insert(normalize_path(path))
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(&normalize_path(path))
    }

    /// Replaces the whole set, e.g. from a list posted by the UI.
    pub fn replace_all<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.entries = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .collect();
    }

    /// If `old` is a member, removes it and inserts `new` when one is given.
    /// An absent `old` leaves the set unchanged. Returns whether `old` was present.
    pub fn rename_key(&mut self, old: &Path, new: Option<&Path>) -> bool {
        if !self.entries.remove(&normalize_path(old)) {
            return false;
        }
        if let Some(new) = new.filter(|p| !p.as_os_str().is_empty()) {
            self.entries.insert(normalize_path(new));
        }
        true
    }

    /// Moves `old` and every entry below it under `new`. Returns the number of
    /// rewritten entries.
    pub fn rename_subtree(&mut self, old: &Path, new: &Path) -> usize {
        let old = normalize_path(old);
        let new = normalize_path(new);
        let affected: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|entry| is_same_or_descendant(entry, &old))
            .cloned()
            .collect();

        for entry in &affected {
            self.entries.remove(entry);
            let rewritten = match entry.strip_prefix(&old) {
                Ok(rest) if rest.as_os_str().is_empty() => new.clone(),
                Ok(rest) => new.join(rest),
                Err(_) => continue,
            };
            self.entries.insert(rewritten);
        }
        affected.len()
    }

    /// Removes `path` and every entry below it. Returns the number removed.
    pub fn remove_subtree(&mut self, path: &Path) -> usize {
        let path = normalize_path(path);
        let before = self.entries.len();
        self.entries
            .retain(|entry| !is_same_or_descendant(entry, &path));
        before - self.entries.len()
    }

    /// `true` if `path` is a member or lies below a member.
    ///
    /// Lazy listings only need [`PathSet::contains`] because hidden parents
    /// are never expanded.
    pub fn is_hidden_or_under_hidden(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        self.entries
            .iter()
            .any(|hidden| is_same_or_descendant(&path, hidden))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn set_in(dir: &Path) -> PathSet {
        PathSet::load(dir.join("hidden_items.json"))
    }

    #[test]
    fn test_add_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let mut set = set_in(dir.path());
        set.add(Path::new("/proj/b.py"));
        set.add(Path::new("/proj/a.py"));
        set.save().unwrap();

        let reloaded = set_in(dir.path());
        assert!(reloaded.contains(Path::new("/proj/a.py")));
        assert!(reloaded.contains(Path::new("/proj/b.py")));

        // Persisted sorted for deterministic diffs.
        let raw: Vec<String> =
            serde_json::from_str(&fs::read_to_string(set.file()).unwrap()).unwrap();
        assert_eq!(raw, vec!["/proj/a.py", "/proj/b.py"]);
    }

    #[test]
    fn test_load_fails_soft() {
        let dir = tempdir().unwrap();
        let missing = set_in(dir.path());
        assert!(missing.is_empty());

        fs::write(dir.path().join("hidden_items.json"), "{\"oops\": ").unwrap();
        let malformed = set_in(dir.path());
        assert!(malformed.is_empty());
    }

    #[test]
    fn test_no_duplicates_after_normalization() {
        let dir = tempdir().unwrap();
        let mut set = set_in(dir.path());
        assert!(set.add(Path::new("/proj/src")));
        assert!(!set.add(Path::new("/proj/./src")));
        assert!(!set.add(Path::new("/proj/lib/../src")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_rename_key_without_replacement_removes() {
        let mut set = PathSet::new("unused.json");
        set.add(Path::new("/p/a"));
        assert!(set.rename_key(Path::new("/p/a"), None));
        assert!(set.is_empty());
    }

    #[test]
    fn test_rename_subtree_moves_descendants() {
        let mut set = PathSet::new("unused.json");
        set.add(Path::new("/p/old"));
        set.add(Path::new("/p/old/inner.py"));
        set.add(Path::new("/p/older.py"));

        assert_eq!(set.rename_subtree(Path::new("/p/old"), Path::new("/p/new")), 2);
        assert!(set.contains(Path::new("/p/new")));
        assert!(set.contains(Path::new("/p/new/inner.py")));
        assert!(set.contains(Path::new("/p/older.py")));
        assert!(!set.contains(Path::new("/p/old/inner.py")));
    }

    #[test]
    fn test_remove_subtree() {
        let mut set = PathSet::new("unused.json");
        set.add(Path::new("/p/dir"));
        set.add(Path::new("/p/dir/x"));
        set.add(Path::new("/p/dirx"));
        assert_eq!(set.remove_subtree(Path::new("/p/dir")), 2);
        assert_eq!(set.to_vec(), vec![PathBuf::from("/p/dirx")]);
    }

    #[test]
    fn test_hidden_prefix_match_is_separator_delimited() {
        let mut set = PathSet::new("unused.json");
        set.add(Path::new("/proj/src"));
        assert!(set.is_hidden_or_under_hidden(Path::new("/proj/src")));
        assert!(set.is_hidden_or_under_hidden(Path::new("/proj/src/inner.py")));
        assert!(!set.is_hidden_or_under_hidden(Path::new("/proj/srcs/inner.py")));
        assert!(!set.contains(Path::new("/proj/src/inner.py")));
    }

    fn path_strategy() -> impl Strategy<Value = PathBuf> {
        prop::collection::vec("[a-z]{1,8}", 1..5)
            .prop_map(|parts| PathBuf::from(format!("/{}", parts.join("/"))))
    }

    proptest! {
        #[test]
        fn prop_add_save_load_contains(path in path_strategy()) {
            let dir = tempdir().unwrap();
            let mut set = set_in(dir.path());
            set.add(&path);
            set.save().unwrap();
            prop_assert!(set_in(dir.path()).contains(&path));
        }

        #[test]
        fn prop_rename_key_transfers_membership(
            members in prop::collection::vec(path_strategy(), 0..6),
            p in path_strategy(),
            q in path_strategy(),
        ) {
            let mut set = PathSet::new("unused.json");
            set.replace_all(&members);
            let before = set.to_vec();
            let was_member = set.contains(&p);

            set.rename_key(&p, Some(&q));

            if was_member {
                prop_assert!(set.contains(&q));
                if p != q {
                    prop_assert!(!set.contains(&p));
                }
            } else {
                prop_assert_eq!(set.to_vec(), before);
            }
        }
    }
}
