//! Path and extension normalisation shared by every component.
//!
//! All path-keyed state (favorites, hidden items, manual overrides) is keyed
//! by the output of [`normalize_path`], so two spellings of the same location
//! always compare equal.

use std::path::{Component, Path, PathBuf};

/// Returns an absolute, lexically normalised version of `path`.
///
/// Relative paths are joined onto the current working directory. `.` segments
/// are dropped and `..` segments pop their parent. Symlinks are not resolved,
/// which matches `os.path.abspath` semantics and requires no I/O.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` on the root is a no-op, so `/..` stays `/`.
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Lower-cases an extension and guarantees a single leading dot.
///
/// Returns `None` for empty input.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Returns the normalised extension of a file name, `splitext` style.
///
/// `a.tar.gz` yields `.gz`; dotfiles such as `.bashrc` have no extension.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(normalize_extension)
}

/// `true` if `path` equals `ancestor` or lies below it.
///
/// Comparison is component-wise, so `/proj2` is not under `/proj`.
pub fn is_same_or_descendant(path: &Path, ancestor: &Path) -> bool {
    path.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_resolves_dots() {
        assert_eq!(
            normalize_path(Path::new("/proj/./src/../lib/a.rs")),
            PathBuf::from("/proj/lib/a.rs")
        );
        assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn test_normalize_path_makes_relative_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(normalize_path(Path::new("x/y")), cwd.join("x").join("y"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("PY"), Some(".py".to_string()));
        assert_eq!(normalize_extension(".Rs"), Some(".rs".to_string()));
        assert_eq!(normalize_extension("  "), None);
        assert_eq!(normalize_extension("."), None);
    }

    #[test]
    fn test_file_extension_follows_splitext() {
        assert_eq!(file_extension(Path::new("a/b.PY")), Some(".py".to_string()));
        assert_eq!(file_extension(Path::new("a.tar.gz")), Some(".gz".to_string()));
        assert_eq!(file_extension(Path::new(".bashrc")), None);
        assert_eq!(file_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn test_descendant_is_component_wise() {
        assert!(is_same_or_descendant(Path::new("/proj/a"), Path::new("/proj")));
        assert!(is_same_or_descendant(Path::new("/proj"), Path::new("/proj")));
        assert!(!is_same_or_descendant(Path::new("/proj2/a"), Path::new("/proj")));
    }
}
