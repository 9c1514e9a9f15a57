//! Advanced file search by name, extension and modification date.

use chrono::{Local, NaiveDate, TimeZone};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::error::CoreError;
use super::exclusion::ExclusionList;
use super::path_set::PathSet;
use super::paths::file_extension;

/// Raw search criteria as supplied by a caller. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub name: String,
    pub extensions: Vec<String>,
    /// `YYYY-MM-DD`; files modified before local midnight of that day are dropped.
    pub modified_since: String,
}

/// A query that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedQuery {
    name: Option<String>,
    extensions: BTreeSet<String>,
    modified_since: Option<SystemTime>,
}

impl SearchQuery {
    pub fn validate(&self) -> Result<ValidatedQuery, CoreError> {
        let mut extensions = BTreeSet::new();
        for raw in &self.extensions {
            let ext = raw.trim();
            if ext.is_empty() {
                continue;
            }
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(CoreError::InvalidQuery(format!(
                    "extension '{}' must start with a dot",
                    ext
                )));
            }
            extensions.insert(ext.to_lowercase());
        }

        let date = self.modified_since.trim();
        let modified_since = if date.is_empty() {
            None
        } else {
            let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                CoreError::InvalidQuery(format!("date '{}' is not in YYYY-MM-DD format", date))
            })?;
            let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(|| {
                CoreError::InvalidQuery(format!("date '{}' has no midnight", date))
            })?;
            let local = Local
                .from_local_datetime(&midnight)
                .earliest()
                .ok_or_else(|| {
                    CoreError::InvalidQuery(format!("date '{}' has no local midnight", date))
                })?;
            Some(SystemTime::from(local))
        };

        let name = self.name.trim();
        Ok(ValidatedQuery {
            name: (!name.is_empty()).then(|| name.to_lowercase()),
            extensions,
            modified_since,
        })
    }
}

impl ValidatedQuery {
    fn matches(&self, path: &Path) -> bool {
        if let Some(name) = &self.name {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !file_name.contains(name.as_str()) {
                return false;
            }
        }

        if !self.extensions.is_empty()
            && !file_extension(path).is_some_and(|ext| self.extensions.contains(&ext))
        {
            return false;
        }

        if let Some(since) = self.modified_since {
            match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(modified) if modified >= since => {}
                Ok(_) => return false,
                Err(e) => {
                    tracing::debug!("No modification time for {:?}: {}", path, e);
                    return false;
                }
            }
        }

        true
    }
}

/// Runs validated queries against a directory tree.
pub struct FileSearch;

impl FileSearch {
    /// Returns matching files under `root`, sorted by path.
    ///
    /// Excluded directories are pruned and hidden items (and everything below
    /// them) are skipped.
    pub fn search(
        root: &Path,
        query: &SearchQuery,
        exclusions: &ExclusionList,
        hidden: &PathSet,
    ) -> Result<Vec<PathBuf>, CoreError> {
        let query = query.validate()?;
        let candidates = exclusions.walk_files(root, &hidden.to_vec());
        let matches: Vec<PathBuf> = candidates
            .into_par_iter()
            .filter(|path| query.matches(path))
            .collect();
        tracing::info!("Search under {:?} matched {} files", root, matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn project() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        for rel in [
            "README.md",
            "docs/readme.txt",
            "src/main.rs",
            "src/Main.PY",
            "node_modules/readme.md",
            "secret/readme.md",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, rel).unwrap();
        }
        (dir, root)
    }

    fn run(root: &Path, query: SearchQuery, hidden: &PathSet) -> Vec<String> {
        let exclusions = ExclusionList::new(["node_modules"]);
        FileSearch::search(root, &query, &exclusions, hidden)
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_name_is_case_insensitive_substring() {
        let (_dir, root) = project();
        let mut hidden = PathSet::new(root.join("h.json"));
        hidden.add(&root.join("secret"));

        let query = SearchQuery {
            name: "ReadMe".to_string(),
            ..Default::default()
        };
        assert_eq!(run(&root, query, &hidden), vec!["README.md", "docs/readme.txt"]);
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let (_dir, root) = project();
        let hidden = PathSet::new(root.join("h.json"));
        let query = SearchQuery {
            name: "main".to_string(),
            extensions: vec![".py".to_string()],
            ..Default::default()
        };
        assert_eq!(run(&root, query, &hidden), vec!["src/Main.PY"]);
    }

    #[test]
    fn test_modified_since() {
        let (_dir, root) = project();
        let hidden = PathSet::new(root.join("h.json"));

        let past = SearchQuery {
            modified_since: "2000-01-01".to_string(),
            extensions: vec![".rs".to_string()],
            ..Default::default()
        };
        assert_eq!(run(&root, past, &hidden), vec!["src/main.rs"]);

        let future = SearchQuery {
            modified_since: "2999-01-01".to_string(),
            ..Default::default()
        };
        assert!(run(&root, future, &hidden).is_empty());
    }

    #[test]
    fn test_invalid_queries() {
        let no_dot = SearchQuery {
            extensions: vec!["py".to_string()],
            ..Default::default()
        };
        assert!(matches!(no_dot.validate(), Err(CoreError::InvalidQuery(_))));

        let bad_date = SearchQuery {
            modified_since: "01/02/2024".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_date.validate(), Err(CoreError::InvalidQuery(_))));

        assert!(SearchQuery::default().validate().is_ok());
    }
}
