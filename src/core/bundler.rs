//! Concatenates file contents into a single text bundle.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::CoreError;

/// Line placed between two bundled files.
pub const SEPARATOR: &str = "--------------------------";

/// The result of bundling a list of files.
#[derive(Debug, Clone, Default)]
pub struct CodeBundle {
    pub text: String,
    pub file_count: usize,
    /// Files that could not be read, with the reason. Their segment carries
    /// an inline marker instead of content.
    pub errors: Vec<(PathBuf, String)>,
}

/// A utility struct for producing bundles and previews.
///
/// This struct is stateless and provides methods as associated functions.
pub struct CodeBundler;

impl CodeBundler {
    /// Bundles `paths` in exactly the given order.
    ///
    /// Each segment is the path on its own line followed by the content. A file
    /// that cannot be read as UTF-8 text yields `<error reading file: ...>` in
    /// its segment; it never aborts the bundle. Reads run in parallel.
    pub fn bundle(paths: &[PathBuf]) -> CodeBundle {
        let segments: Vec<(String, Option<String>)> = paths
            .par_iter()
            .map(|path| match fs::read_to_string(path) {
                Ok(content) => (Self::segment(path, &content), None),
                Err(e) => {
                    tracing::warn!("Failed to read {:?} for bundle: {}", path, e);
                    let marker = format!("<error reading file: {}>", e);
                    (Self::segment(path, &marker), Some(e.to_string()))
                }
            })
            .collect();

        let mut bundle = CodeBundle {
            file_count: paths.len(),
            ..Default::default()
        };
        let mut texts = Vec::with_capacity(segments.len());
        for (path, (segment, error)) in paths.iter().zip(segments) {
            if let Some(reason) = error {
                bundle.errors.push((path.clone(), reason));
            }
            texts.push(segment);
        }
        bundle.text = texts.join(format!("{SEPARATOR}\n").as_str());

        tracing::info!(
            "Bundled {} files ({} unreadable, {} bytes)",
            bundle.file_count,
            bundle.errors.len(),
            bundle.text.len()
        );
        bundle
    }

    /// Prepends a directory tree to a bundle, as used by "copy all".
    pub fn with_tree(tree: &str, bundle: &str) -> String {
        format!("{}\n{}", tree.trim_end(), bundle)
    }

    /// Reads a single file for preview.
    ///
    /// Directories are rejected. Files above `max_bytes` are described rather
    /// than loaded; non UTF-8 content is decoded lossily.
    pub fn preview(path: &Path, max_bytes: u64) -> Result<String, CoreError> {
        let metadata = fs::metadata(path).map_err(|e| CoreError::from_io(e, path))?;
        if !metadata.is_file() {
            return Err(CoreError::InvalidName(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > max_bytes {
            return Ok(format!(
                "[FILE TOO LARGE: {} bytes - CONTENT SKIPPED]",
                metadata.len()
            ));
        }

        let bytes = fs::read(path).map_err(|e| CoreError::from_io(e, path))?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    fn segment(path: &Path, body: &str) -> String {
        let mut segment = format!("{}\n{}", path.display(), body);
        if !segment.ends_with('\n') {
            segment.push('\n');
        }
        segment
    }
}
