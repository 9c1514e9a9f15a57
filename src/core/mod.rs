pub mod bundler;
pub mod error;
pub mod exclusion;
pub mod extension_index;
pub mod file_ops;
pub mod guard;
pub mod path_set;
pub mod paths;
pub mod preferences;
pub mod search;
pub mod selection;
pub mod tree_walker;

use std::path::PathBuf;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    /// Only ever true when hidden items were requested.
    pub is_hidden: bool,
}

pub use bundler::{CodeBundle, CodeBundler};
pub use error::CoreError;
pub use exclusion::ExclusionList;
pub use extension_index::ExtensionIndex;
pub use file_ops::FileOpsCoordinator;
pub use guard::BaseDir;
pub use path_set::PathSet;
pub use preferences::PreferenceStore;
pub use search::{FileSearch, SearchQuery};
pub use selection::{ManualOverrides, SelectionEngine};
pub use tree_walker::TreeWalker;
