//! The security boundary for every path that arrives from the outside.

use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::paths::{is_same_or_descendant, normalize_path};

/// The configured base directory. Every path read or mutated on behalf of a
/// caller must resolve inside it.
#[derive(Debug, Clone)]
pub struct BaseDir {
    root: PathBuf,
}

impl BaseDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize_path(root.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a caller supplied path and checks it against the base.
    ///
    /// Forward slashes are accepted on every platform. The lexical check runs
    /// before any file system access; if the path exists, its canonical form
    /// is checked as well so a symlink cannot lead out of the base.
    pub fn resolve(&self, raw: impl AsRef<Path>) -> Result<PathBuf, CoreError> {
        let raw = raw.as_ref();
        let candidate = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.root.join(raw)
        };
        let resolved = normalize_path(&candidate);

        if !is_same_or_descendant(&resolved, &self.root) {
            tracing::warn!("Rejected path outside base directory: {:?}", resolved);
            return Err(CoreError::OutsideBase(resolved));
        }

        if let (Ok(real), Ok(real_root)) = (resolved.canonicalize(), self.root.canonicalize()) {
            if !is_same_or_descendant(&real, &real_root) {
                tracing::warn!(
                    "Rejected path escaping base directory through a link: {:?} -> {:?}",
                    resolved,
                    real
                );
                return Err(CoreError::OutsideBase(resolved));
            }
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_accepts_paths_inside_base() {
        let dir = tempdir().unwrap();
        let base = BaseDir::new(dir.path());
        let inside = base.resolve(dir.path().join("a/b.txt")).unwrap();
        assert!(inside.starts_with(base.path()));

        let relative = base.resolve("src/main.rs").unwrap();
        assert_eq!(relative, base.path().join("src").join("main.rs"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempdir().unwrap();
        let base = BaseDir::new(dir.path().join("proj"));
        let err = base.resolve("../secret.txt").unwrap_err();
        assert!(matches!(err, CoreError::OutsideBase(_)));

        let sibling = dir.path().join("proj2/file.txt");
        assert!(matches!(
            base.resolve(&sibling),
            Err(CoreError::OutsideBase(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let dir = tempdir().unwrap();
        let proj = dir.path().join("proj");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&proj).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("secret.txt"), "s").unwrap();
        std::os::unix::fs::symlink(&outside, proj.join("link")).unwrap();

        let base = BaseDir::new(&proj);
        assert!(matches!(
            base.resolve(proj.join("link/secret.txt")),
            Err(CoreError::OutsideBase(_))
        ));
    }
}
