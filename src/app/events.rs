//! Defines the event and message structures exchanged with the frontend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::view_model::{OptionsView, TreeItem};

/// A per-path failure inside a batch operation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PathError {
    pub path: PathBuf,
    pub message: String,
}

/// Events sent from the backend to the frontend.
///
/// Serialised as `{"event": "<name>", "data": ...}`.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UserEvent {
    /// A new root was accepted; listings for it follow asynchronously.
    RootChanged { root: PathBuf, generation: u64 },
    /// The children of one directory.
    TreeLevel { path: PathBuf, items: Vec<TreeItem> },
    /// Extensions observed under the current root, and the current selection.
    Extensions {
        available: Vec<String>,
        selected: Vec<String>,
    },
    /// The debounced bundle of the current selection.
    GeneratedCode {
        code: String,
        file_count: usize,
        token_count: usize,
        errors: Vec<PathError>,
    },
    /// The whole tree as box-drawing text.
    FullTree { tree: String },
    Preview { path: PathBuf, content: String },
    /// A bundle of explicitly requested paths.
    Code { code: String },
    Options(Box<OptionsView>),
    /// The outcome of a rename or delete.
    FsResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_path: Option<PathBuf>,
        errors: Vec<PathError>,
    },
    SearchResults { paths: Vec<PathBuf> },
    /// An error message to be displayed to the user.
    ShowError(String),
}

/// A message received from the frontend.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
