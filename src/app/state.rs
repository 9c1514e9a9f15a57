//! Defines the central, mutable state of the application.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

use crate::config::settings::{self, FAVORITES_FILE, HIDDEN_ITEMS_FILE, PREFERENCES_FILE};
use crate::config::EngineConfig;
use crate::core::error::CoreError;
use crate::core::paths::normalize_path;
use crate::core::{BaseDir, ExclusionList, ExtensionIndex, ManualOverrides, PathSet, PreferenceStore};
use crate::utils::debounce::Debouncer;

/// Holds the complete, mutable state of the application.
///
/// Wrapped in an `Arc<Mutex<...>>` and shared between the IPC dispatcher and
/// the background tasks. The stores live behind that single mutex, so their
/// JSON files only ever have one writer.
pub struct AppState {
    pub config: EngineConfig,
    pub exclusions: ExclusionList,
    pub preferences: PreferenceStore,
    pub favorites: PathSet,
    pub hidden: PathSet,
    /// Every caller supplied path must resolve inside this directory.
    pub base: BaseDir,
    /// The directory currently browsed, if any.
    pub root: Option<PathBuf>,
    /// Bumped on every root change; background results carry the value they
    /// were started with.
    pub generation: u64,
    pub show_hidden: bool,
    /// Whether the next generated bundle is prefixed with the full tree.
    /// Consumed by that run.
    pub include_tree: bool,
    pub manual: ManualOverrides,
    /// Extensions observed under the current root by the last scan.
    pub available_extensions: BTreeSet<String>,
    /// The last computed inclusion map for the current root.
    pub selection: BTreeMap<PathBuf, bool>,
    /// Pending selection recompute.
    pub regeneration: Debouncer,
    /// Tree listing and extension scan tasks of the current root.
    pub root_tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Builds the state from stores found in `data_dir`. Missing or malformed
    /// stores start empty.
    pub fn new(config: EngineConfig, data_dir: &Path, base: impl AsRef<Path>) -> Self {
        let exclusions = ExclusionList::new(config.excluded_dirs.iter().cloned());
        let regeneration = Debouncer::new(config.debounce);
        Self {
            exclusions,
            preferences: PreferenceStore::load(data_dir.join(PREFERENCES_FILE)),
            favorites: PathSet::load(data_dir.join(FAVORITES_FILE)),
            hidden: PathSet::load(data_dir.join(HIDDEN_ITEMS_FILE)),
            base: BaseDir::new(base),
            root: None,
            generation: 0,
            show_hidden: false,
            include_tree: false,
            manual: ManualOverrides::new(),
            available_extensions: BTreeSet::new(),
            selection: BTreeMap::new(),
            regeneration,
            root_tasks: Vec::new(),
            config,
        }
    }

    /// Builds the state from the data and base directories of the environment.
    pub fn from_environment() -> Result<Self> {
        let data_dir = settings::get_data_directory();
        let base = settings::get_base_directory().context("Failed to determine base directory")?;
        tracing::info!("Data directory: {:?}, base directory: {:?}", data_dir, base);
        Ok(Self::new(EngineConfig::default(), &data_dir, base))
    }

    pub fn extension_index(&self) -> ExtensionIndex {
        ExtensionIndex::new(
            self.exclusions.clone(),
            self.config.known_text_extensions.clone(),
        )
    }

    /// Resolves a caller supplied path against the base directory.
    pub fn resolve(&self, raw: impl AsRef<Path>) -> Result<PathBuf, CoreError> {
        self.base.resolve(raw)
    }

    /// The browsed root, or the last persisted one.
    pub fn working_root(&self) -> PathBuf {
        self.root
            .clone()
            .or_else(|| self.preferences.last_path())
            .unwrap_or_else(|| self.base.path().to_path_buf())
    }

    /// Switches to a new root and returns its generation.
    ///
    /// Everything derived from the previous root is dropped and its pending
    /// work is aborted. `path` must already be resolved.
    pub fn set_root(&mut self, path: &Path) -> u64 {
        self.cancel_root_work();
        let path = normalize_path(path);

        self.generation += 1;
        self.include_tree = false;
        self.manual.clear();
        self.selection.clear();
        self.available_extensions.clear();

        self.preferences.set_last_path(&path);
        if let Err(e) = self.preferences.save() {
            tracing::error!("Failed to persist last path: {}", e);
        }
        tracing::info!("Root set to {:?} (generation {})", path, self.generation);
        self.root = Some(path);
        self.generation
    }

    /// Whether a result computed for `generation` still applies.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn cancel_root_work(&mut self) {
        self.regeneration.cancel();
        for handle in self.root_tasks.drain(..) {
            handle.abort();
        }
    }

    /// Saves the preference, favorites and hidden stores. Every store is
    /// attempted even if an earlier one fails; the first error is returned.
    pub fn persist_all(&self) -> Result<(), CoreError> {
        let results = [
            self.preferences.save(),
            self.favorites.save(),
            self.hidden.save(),
        ];
        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                tracing::error!("Failed to persist store: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!("All stores persisted.");
                Ok(())
            }
        }
    }
}
