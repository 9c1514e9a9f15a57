pub mod settings;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// The contents of `preferences.json`.
///
/// Only the extension sets and `last_path` drive the engine; the remaining
/// fields belong to the UI layer and are carried through untouched so that
/// rewriting the file never drops them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub selected_extensions: BTreeSet<String>,
    pub known_extensions: BTreeSet<String>,
    pub hidden_extensions: BTreeSet<String>,
    pub last_path: String,
    pub window_geometry: String,
    pub current_theme: String,
    pub is_fullscreen: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_extensions: BTreeSet::new(),
            known_extensions: BTreeSet::new(),
            hidden_extensions: BTreeSet::new(),
            last_path: String::new(),
            window_geometry: "1400x800+0+0".to_string(),
            current_theme: "flatly".to_string(),
            is_fullscreen: false,
        }
    }
}

/// Static engine configuration. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory (and file) basenames that are never listed, walked or bundled.
    pub excluded_dirs: BTreeSet<String>,
    /// Extensions considered readable text, used by the extension scan.
    pub known_text_extensions: BTreeSet<String>,
    /// Quiet period before a selection change triggers a recompute.
    pub debounce: Duration,
    /// Files larger than this are not loaded into a preview.
    pub max_preview_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let excluded_dirs = [
            "node_modules",
            "__pycache__",
            ".git",
            ".venv",
            "venv",
            "__svn__",
            "__hg__",
            ".svn",
            ".hg",
            "Google Drive",
            ".DS_Store",
            "Thumbs.db",
        ];

        let known_text_extensions = [
            ".txt", ".py", ".md", ".c", ".cpp", ".h", ".java", ".js", ".html", ".css", ".json",
            ".xml", ".csv", ".ini", ".cfg", ".bat", ".sh", ".rb", ".php", ".pl", ".yaml", ".yml",
            ".sql", ".r", ".go", ".kt", ".swift", ".ts", ".tsx", ".jsx", ".tex", ".log",
        ];

        Self {
            excluded_dirs: excluded_dirs.iter().map(|s| s.to_string()).collect(),
            known_text_extensions: known_text_extensions
                .iter()
                .map(|s| s.to_string())
                .collect(),
            debounce: Duration::from_millis(100),
            max_preview_bytes: 20 * 1024 * 1024,
        }
    }
}
