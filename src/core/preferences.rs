//! The preference store: extension selection and the last browsed path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::paths::normalize_extension;
use crate::config::settings::{load_json_or_default, save_json_atomic};
use crate::config::Preferences;

/// Typed access to `preferences.json`.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    file: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    pub fn new(file: impl Into<PathBuf>, prefs: Preferences) -> Self {
        Self {
            file: file.into(),
            prefs: normalized(prefs),
        }
    }

    /// Loads the store. Never fails: missing or malformed content yields defaults.
    pub fn load(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let prefs: Preferences = load_json_or_default(&file);
        Self::new(file, prefs)
    }

    pub fn save(&self) -> Result<(), CoreError> {
        save_json_atomic(&self.file, &self.prefs)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn selected_extensions(&self) -> &BTreeSet<String> {
        &self.prefs.selected_extensions
    }

    pub fn hidden_extensions(&self) -> &BTreeSet<String> {
        &self.prefs.hidden_extensions
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        if self.prefs.last_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.prefs.last_path))
        }
    }

    pub fn set_last_path(&mut self, path: &Path) {
        self.prefs.last_path = path.to_string_lossy().into_owned();
    }

    /// Known extensions minus the hidden ones, without triggering a scan.
    pub fn visible_known_extensions(&self) -> BTreeSet<String> {
        self.prefs
            .known_extensions
            .difference(&self.prefs.hidden_extensions)
            .cloned()
            .collect()
    }

    /// Whether the known extensions still have to be initialised by a scan
    /// of the working root.
    pub fn needs_known_scan(&self) -> bool {
        self.prefs.known_extensions.is_empty()
    }

    /// Records the result of the initial scan and persists it. Ignored when
    /// the set was filled in the meantime. Returns whether it was recorded.
    pub fn record_known_scan(&mut self, scanned: BTreeSet<String>) -> bool {
        if !self.needs_known_scan() {
            tracing::debug!("Known extensions already initialised, dropping scan result");
            return false;
        }
        tracing::info!("Initialised {} known extensions", scanned.len());
        self.prefs.known_extensions = normalize_all(&scanned);
        if let Err(e) = self.save() {
            tracing::error!("Failed to persist known extensions: {}", e);
        }
        true
    }

    /// Adds extensions observed under a new root. Returns whether anything changed.
    pub fn merge_known_extensions<'a, I>(&mut self, observed: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let before = self.prefs.known_extensions.len();
        self.prefs
            .known_extensions
            .extend(observed.into_iter().filter_map(|e| normalize_extension(e)));
        self.prefs.known_extensions.len() != before
    }

    /// Stores the selection. When the known set is non-empty, entries outside
    /// it are dropped. Returns the dropped entries.
    pub fn set_selected_extensions<I, S>(&mut self, extensions: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested = normalize_all(extensions);
        let known = &self.prefs.known_extensions;
        let (accepted, rejected): (BTreeSet<String>, BTreeSet<String>) = requested
            .into_iter()
            .partition(|ext| known.is_empty() || known.contains(ext));

        if !rejected.is_empty() {
            tracing::warn!("Ignoring unknown selected extensions: {:?}", rejected);
        }
        self.prefs.selected_extensions = accepted;
        rejected.into_iter().collect()
    }

    pub fn set_hidden_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prefs.hidden_extensions = normalize_all(extensions);
    }

    /// The extension filter for listings.
    ///
    /// `None` means no filter (every file passes). Selected wins over known;
    /// the known fallback has hidden extensions removed and may therefore be
    /// an empty filter that passes nothing.
    pub fn effective_filter_extensions(&self) -> Option<BTreeSet<String>> {
        if !self.prefs.selected_extensions.is_empty() {
            Some(self.prefs.selected_extensions.clone())
        } else if !self.prefs.known_extensions.is_empty() {
            Some(self.visible_known_extensions())
        } else {
            None
        }
    }
}

fn normalize_all<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .filter_map(|e| normalize_extension(e.as_ref()))
        .collect()
}

fn normalized(mut prefs: Preferences) -> Preferences {
    prefs.selected_extensions = normalize_all(&prefs.selected_extensions);
    prefs.known_extensions = normalize_all(&prefs.known_extensions);
    prefs.hidden_extensions = normalize_all(&prefs.hidden_extensions);
    prefs
}
