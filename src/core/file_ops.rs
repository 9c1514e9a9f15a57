//! Rename and delete on disk, keeping favorites and hidden items in step.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::path_set::PathSet;
use super::paths::normalize_path;

/// Performs file system mutations and rewrites the path-keyed sets that
/// reference the affected paths. Both sets are saved right after every
/// successful mutation.
pub struct FileOpsCoordinator<'a> {
    root: PathBuf,
    favorites: &'a mut PathSet,
    hidden: &'a mut PathSet,
}

impl<'a> FileOpsCoordinator<'a> {
    /// `root` is the directory that may never be deleted itself.
    pub fn new(root: &Path, favorites: &'a mut PathSet, hidden: &'a mut PathSet) -> Self {
        Self {
            root: normalize_path(root),
            favorites,
            hidden,
        }
    }

    /// Renames `old_path` to `new_name` inside the same parent directory.
    pub fn rename(&mut self, old_path: &Path, new_name: &str) -> Result<PathBuf, CoreError> {
        validate_name(new_name)?;

        let old_path = normalize_path(old_path);
        if fs::symlink_metadata(&old_path).is_err() {
            return Err(CoreError::NotFound(old_path));
        }
        self.protect_root(&old_path)?;
        let parent = old_path
            .parent()
            .ok_or_else(|| CoreError::InvalidName(old_path.display().to_string()))?;
        let new_path = parent.join(new_name);
        if fs::symlink_metadata(&new_path).is_ok() {
            return Err(CoreError::AlreadyExists(new_path));
        }

        fs::rename(&old_path, &new_path).map_err(|e| CoreError::from_io(e, &old_path))?;
        tracing::info!("Renamed {:?} to {:?}", old_path, new_path);

        self.favorites.rename_subtree(&old_path, &new_path);
        self.hidden.rename_subtree(&old_path, &new_path);
        self.persist();
        Ok(new_path)
    }

    /// Deletes a file or a directory tree.
    ///
    /// A path that is already gone still has its set entries removed and
    /// counts as success.
    pub fn delete(&mut self, path: &Path) -> Result<(), CoreError> {
        let path = normalize_path(path);
        self.protect_root(&path)?;

        let removal = match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{:?} already gone, cleaning up references", path);
                Ok(())
            }
            Err(e) => Err(e),
        };
        removal.map_err(|e| CoreError::from_io(e, &path))?;
        tracing::info!("Deleted {:?}", path);

        self.favorites.remove_subtree(&path);
        self.hidden.remove_subtree(&path);
        self.persist();
        Ok(())
    }

    /// Deletes every path; one failure does not stop the rest.
    pub fn delete_many(&mut self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<(), CoreError>)> {
        paths
            .iter()
            .map(|path| (path.clone(), self.delete(path)))
            .collect()
    }

    /// The root and its ancestors may be neither renamed nor deleted.
    fn protect_root(&self, path: &Path) -> Result<(), CoreError> {
        if self.root.starts_with(path) {
            return Err(CoreError::ProtectedRoot(path.to_path_buf()));
        }
        Ok(())
    }

    fn persist(&self) {
        for set in [&*self.favorites, &*self.hidden] {
            if let Err(e) = set.save() {
                tracing::error!("Failed to persist {:?} after file operation: {}", set.file(), e);
            }
        }
    }
}

/// A new name must be a single path segment.
fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidName("name is empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(CoreError::InvalidName(format!(
            "'{}' must not contain path separators",
            name
        )));
    }
    if name == "." || name == ".." || name.contains('\0') {
        return Err(CoreError::InvalidName(format!("'{}' is not a valid name", name)));
    }
    Ok(())
}
