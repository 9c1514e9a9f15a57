//! Transforms core results and `AppState` into serialisable view models.

use serde::Serialize;
use std::path::PathBuf;

use super::state::AppState;
use crate::core::TreeNode;

/// One node of a lazily loaded tree, as the tree widget expects it.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TreeItem {
    pub text: String,
    pub id: PathBuf,
    /// `true` for directories: their children are fetched on expansion.
    pub children: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeState>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NodeState {
    pub disabled: bool,
}

impl From<TreeNode> for TreeItem {
    fn from(node: TreeNode) -> Self {
        Self {
            text: node.name,
            id: node.path,
            children: node.is_directory,
            // Hidden entries only show up when requested, rendered as disabled.
            state: node.is_hidden.then_some(NodeState { disabled: true }),
        }
    }
}

/// Everything the options panel shows.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OptionsView {
    pub root: Option<PathBuf>,
    /// Known extensions without the hidden ones.
    pub known_extensions: Vec<String>,
    pub selected_extensions: Vec<String>,
    pub hidden_extensions: Vec<String>,
    pub favorites: Vec<PathBuf>,
    pub hidden: Vec<PathBuf>,
    pub show_hidden: bool,
}

/// Creates the `OptionsView` from the current `AppState`.
pub fn generate_options_view(state: &AppState) -> OptionsView {
    OptionsView {
        root: state.root.clone(),
        known_extensions: state
            .preferences
            .visible_known_extensions()
            .into_iter()
            .collect(),
        selected_extensions: state
            .preferences
            .selected_extensions()
            .iter()
            .cloned()
            .collect(),
        hidden_extensions: state
            .preferences
            .hidden_extensions()
            .iter()
            .cloned()
            .collect(),
        favorites: state.favorites.to_vec(),
        hidden: state.hidden.to_vec(),
        show_hidden: state.show_hidden,
    }
}
