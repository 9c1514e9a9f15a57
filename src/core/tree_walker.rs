//! Lazy directory listing and the full ASCII tree.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::exclusion::ExclusionList;
use super::path_set::PathSet;
use super::paths::file_extension;
use super::TreeNode;

/// Lists directories one level at a time, applying exclusion, hidden-item
/// and extension rules.
pub struct TreeWalker<'a> {
    exclusions: &'a ExclusionList,
    hidden: &'a PathSet,
    filter: Option<&'a BTreeSet<String>>,
}

impl<'a> TreeWalker<'a> {
    /// `filter` is the effective extension filter; `None` lets every file through.
    pub fn new(
        exclusions: &'a ExclusionList,
        hidden: &'a PathSet,
        filter: Option<&'a BTreeSet<String>>,
    ) -> Self {
        Self {
            exclusions,
            hidden,
            filter,
        }
    }

    /// Lists the direct children of `dir`, sorted by name (ordinal,
    /// case-sensitive, directories and files interleaved).
    ///
    /// Hidden entries are skipped, or returned with `is_hidden` set when
    /// `show_hidden` is true. Excluded names never appear.
    pub fn list_children(&self, dir: &Path, show_hidden: bool) -> Result<Vec<TreeNode>, CoreError> {
        let mut nodes = Vec::new();

        for entry in self.read_sorted(dir)? {
            let name = entry.file_name();
            if self.exclusions.is_excluded(&name) {
                continue;
            }

            let path = entry.path();
            let is_hidden = self.hidden.contains(&path);
            if is_hidden && !show_hidden {
                continue;
            }

            let is_directory = path.is_dir();
            if !is_directory && !self.passes_filter(&path) {
                continue;
            }

            nodes.push(TreeNode {
                name: name.to_string_lossy().into_owned(),
                path,
                is_directory,
                is_hidden,
            });
        }

        Ok(nodes)
    }

    /// Renders the whole subtree under `root` with box-drawing connectors.
    ///
    /// Directories come before files at each level. The extension filter is
    /// not applied; exclusion and hidden rules are. A directory that cannot be
    /// read keeps its own line but gets no children.
    pub fn full_tree_string(&self, root: &Path, show_hidden: bool) -> String {
        let mut result = String::new();
        result.push_str(&format!(
            "{}/\n",
            root.file_name().unwrap_or_default().to_string_lossy()
        ));
        self.render_level(root, show_hidden, "", &mut result);
        result
    }

    fn render_level(&self, dir: &Path, show_hidden: bool, prefix: &str, result: &mut String) {
        let entries = match self.read_sorted(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Truncating tree at {:?}: {}", dir, e);
                return;
            }
        };

        let mut children: Vec<(String, PathBuf, bool)> = entries
            .into_iter()
            .filter(|entry| !self.exclusions.is_excluded(&entry.file_name()))
            .filter(|entry| show_hidden || !self.hidden.contains(&entry.path()))
            .map(|entry| {
                let path = entry.path();
                let is_dir = path.is_dir();
                (entry.file_name().to_string_lossy().into_owned(), path, is_dir)
            })
            .collect();

        // Directories first, then files; the name order from `read_sorted` is kept.
        children.sort_by_key(|(_, _, is_dir)| !*is_dir);

        for (i, (name, path, is_dir)) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };
            result.push_str(&format!("{prefix}{connector}{name}\n"));

            if *is_dir {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                self.render_level(path, show_hidden, &new_prefix, result);
            }
        }
    }

    fn passes_filter(&self, path: &Path) -> bool {
        match self.filter {
            None => true,
            Some(filter) => file_extension(path).is_some_and(|ext| filter.contains(&ext)),
        }
    }

    fn read_sorted(&self, dir: &Path) -> Result<Vec<fs::DirEntry>, CoreError> {
        let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)
            .map_err(|e| CoreError::from_io(e, dir))?
            .filter_map(Result::ok)
            .collect();
        entries.sort_by_key(|entry| entry.file_name());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::running_as_root;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        exclusions: ExclusionList,
        hidden: PathSet,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let root = dir.path().join("proj");
            fs::create_dir_all(&root).unwrap();
            Self {
                root,
                exclusions: ExclusionList::new(["node_modules", ".git"]),
                hidden: PathSet::new(dir.path().join("hidden_items.json")),
                _dir: dir,
            }
        }

        fn file(&self, rel: &str) -> PathBuf {
            let path = self.root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "content").unwrap();
            path
        }
    }

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_list_children_skips_excluded_regardless_of_show_hidden() {
        let fx = Fixture::new();
        fx.file("a.py");
        fx.file(".git/config");
        fx.file("node_modules/x.js");

        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        for show_hidden in [false, true] {
            let nodes = walker.list_children(&fx.root, show_hidden).unwrap();
            assert_eq!(names(&nodes), vec!["a.py"]);
        }
    }

    #[test]
    fn test_list_children_sorted_ordinal_and_interleaved() {
        let fx = Fixture::new();
        fx.file("b.py");
        fx.file("a_dir/x.py");
        fx.file("C.py");
        fx.file("c_dir/y.py");

        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        let nodes = walker.list_children(&fx.root, false).unwrap();
        assert_eq!(names(&nodes), vec!["C.py", "a_dir", "b.py", "c_dir"]);
        assert!(nodes[1].is_directory);
        assert!(!nodes[0].is_directory);
    }

    #[test]
    fn test_list_children_hidden_skipped_or_marked() {
        let mut fx = Fixture::new();
        let secret = fx.file("secret.py");
        fx.file("open.py");
        fx.hidden.add(&secret);

        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        let visible = walker.list_children(&fx.root, false).unwrap();
        assert_eq!(names(&visible), vec!["open.py"]);

        let all = walker.list_children(&fx.root, true).unwrap();
        assert_eq!(names(&all), vec!["open.py", "secret.py"]);
        assert!(all[1].is_hidden);
        assert!(!all[0].is_hidden);
    }

    #[test]
    fn test_list_children_filters_files_not_directories() {
        let fx = Fixture::new();
        fx.file("a.py");
        fx.file("b.md");
        fx.file("docs/c.md");

        let filter: BTreeSet<String> = [".py".to_string()].into();
        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, Some(&filter));
        let nodes = walker.list_children(&fx.root, false).unwrap();
        assert_eq!(names(&nodes), vec!["a.py", "docs"]);

        let nothing = BTreeSet::new();
        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, Some(&nothing));
        let nodes = walker.list_children(&fx.root, false).unwrap();
        assert_eq!(names(&nodes), vec!["docs"]);
    }

    #[test]
    fn test_list_children_missing_dir_is_not_found() {
        let fx = Fixture::new();
        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        let err = walker.list_children(&fx.root.join("nope"), false).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_full_tree_string_layout() {
        let mut fx = Fixture::new();
        fx.file("src/main.py");
        fx.file("src/util/helpers.py");
        fx.file("README.md");
        fx.file("a.txt");
        fx.file(".git/HEAD");
        let hidden_dir = fx.file("build/out.log").parent().unwrap().to_path_buf();
        fx.hidden.add(&hidden_dir);

        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        insta::assert_snapshot!(walker.full_tree_string(&fx.root, false), @r"
        proj/
        ├── src
        │   ├── util
        │   │   └── helpers.py
        │   └── main.py
        ├── README.md
        └── a.txt
        ");
    }

    #[test]
    fn test_full_tree_string_shows_hidden_on_request() {
        let mut fx = Fixture::new();
        let hidden = fx.file("hidden.py");
        fx.hidden.add(&hidden);

        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        assert_eq!(walker.full_tree_string(&fx.root, false), "proj/\n");
        assert_eq!(
            walker.full_tree_string(&fx.root, true),
            "proj/\n└── hidden.py\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_full_tree_string_truncates_unreadable_branch() {
        use std::os::unix::fs::PermissionsExt;
        if running_as_root() {
            return;
        }
        let fx = Fixture::new();
        fx.file("locked/inner.py");
        fx.file("z.py");
        let locked = fx.root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let walker = TreeWalker::new(&fx.exclusions, &fx.hidden, None);
        let tree = walker.full_tree_string(&fx.root, false);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(tree, "proj/\n├── locked\n└── z.py\n");
    }
}
