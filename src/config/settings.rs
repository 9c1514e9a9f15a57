use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::error::CoreError;

const APP_NAME: &str = "CodeTree";
const DATA_DIR_ENV: &str = "CODETREE_DATA_DIR";
const BASE_DIR_ENV: &str = "CODETREE_BASE_DIR";

pub const PREFERENCES_FILE: &str = "preferences.json";
pub const FAVORITES_FILE: &str = "favorites.json";
pub const HIDDEN_ITEMS_FILE: &str = "hidden_items.json";

/// Returns the directory holding the persisted JSON stores.
///
/// `CODETREE_DATA_DIR` wins, then the platform data directory, then `./data`.
pub fn get_data_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    ProjectDirs::from("com", "codetree", APP_NAME)
        .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Returns the directory that bounds every path accepted from a caller.
///
/// `CODETREE_BASE_DIR` wins, then the current working directory.
pub fn get_base_directory() -> std::io::Result<PathBuf> {
    match std::env::var_os(BASE_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir(),
    }
}

/// Reads a JSON store.
///
/// A missing file is `Ok(None)`. A file that exists but cannot be parsed is
/// `MalformedStore`; callers recover by falling back to defaults.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoreError::from_io(e, path)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CoreError::MalformedStore(path.to_path_buf(), e))
}

/// Reads a JSON store, falling back to `T::default()` on any failure.
pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path) {
        Ok(Some(value)) => {
            tracing::info!("Loaded store from {:?}", path);
            value
        }
        Ok(None) => {
            tracing::info!("Store {:?} not found, starting empty", path);
            T::default()
        }
        Err(e) => {
            tracing::warn!("{}. Falling back to defaults.", e);
            T::default()
        }
    }
}

/// Writes `value` as pretty JSON via a temp file in the target directory that
/// is then persisted over `path`, so readers never observe a half-written file.
pub fn save_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| CoreError::from_io(e, &dir))?;
        tracing::info!("Created data directory: {:?}", dir);
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::Io(std::io::Error::other(e), path.to_path_buf()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| CoreError::from_io(e, &dir))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| CoreError::from_io(e, tmp.path()))?;
    tmp.persist(path)
        .map_err(|e| CoreError::from_io(e.error, path))?;

    tracing::debug!("Saved store to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preferences;
    use serial_test::serial;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let result: Option<Vec<String>> = load_json(&dir.path().join("nope.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_malformed_file_is_malformed_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_json::<Vec<String>>(&path).unwrap_err();
        assert!(matches!(err, CoreError::MalformedStore(p, _) if p == path));
    }

    #[traced_test]
    #[test]
    fn test_load_or_default_recovers_and_logs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "[1, 2").unwrap();
        let prefs: Preferences = load_json_or_default(&path);
        assert_eq!(prefs, Preferences::default());
        assert!(logs_contain("Falling back to defaults"));
    }

    #[test]
    fn test_save_atomic_creates_directory_and_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/data").join(FAVORITES_FILE);
        save_json_atomic(&path, &vec!["/a", "/b"]).unwrap();
        let loaded: Option<Vec<String>> = load_json(&path).unwrap();
        assert_eq!(loaded.unwrap(), vec!["/a".to_string(), "/b".to_string()]);

        // No temp files are left next to the store.
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    #[serial]
    fn test_data_directory_env_override() {
        let dir = tempdir().unwrap();
        std::env::set_var(DATA_DIR_ENV, dir.path());
        assert_eq!(get_data_directory(), dir.path());
        std::env::remove_var(DATA_DIR_ENV);
        assert_ne!(get_data_directory(), dir.path());
    }

    #[test]
    #[serial]
    fn test_base_directory_env_override() {
        let dir = tempdir().unwrap();
        std::env::set_var(BASE_DIR_ENV, dir.path());
        assert_eq!(get_base_directory().unwrap(), dir.path());
        std::env::remove_var(BASE_DIR_ENV);
        assert_eq!(get_base_directory().unwrap(), std::env::current_dir().unwrap());
    }
}
