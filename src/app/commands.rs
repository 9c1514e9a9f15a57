//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! Handlers resolve every incoming path against the base directory before
//! touching the file system, mutate the `AppState` and report back through
//! `UserEvent`s.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::events::{PathError, UserEvent};
use super::helpers::{lock_state, parse_payload, send_error, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::{self, schedule_regeneration, spawn_list_children};
use super::view_model::generate_options_view;
use crate::core::{
    CodeBundler, CoreError, ExtensionIndex, FileOpsCoordinator, SearchQuery, TreeWalker,
};

#[derive(Deserialize)]
struct PathPayload {
    path: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListChildrenPayload {
    path: Option<String>,
    show_hidden: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ShowHiddenPayload {
    show_hidden: Option<bool>,
}

#[derive(Deserialize)]
struct PathsPayload {
    paths: Vec<String>,
}

#[derive(Deserialize)]
struct ExtensionsPayload {
    extensions: Vec<String>,
}

#[derive(Deserialize)]
struct FavoritesPayload {
    favorites: Vec<String>,
}

#[derive(Deserialize)]
struct HiddenPayload {
    hidden: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeneratePayload {
    include_tree: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenamePayload {
    old_path: String,
    new_name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeletePayload {
    One { path: String },
    Many { paths: Vec<String> },
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SearchPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    modified_since: String,
}

/// `null` payloads count as "no arguments".
fn or_empty(payload: serde_json::Value) -> serde_json::Value {
    if payload.is_null() {
        serde_json::json!({})
    } else {
        payload
    }
}

/// Resolves every path, failing on the first that leaves the base directory.
fn resolve_all(state: &AppState, raw: &[String]) -> Result<Vec<PathBuf>, CoreError> {
    raw.iter().map(|p| state.resolve(p)).collect()
}

/// Switches the browsed root and starts listing and scanning it.
pub fn set_root<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<PathPayload, _>("set_root", payload, &proxy) else {
        return;
    };
    let base = lock_state(&state).base.clone();
    let root = match base.resolve(&req.path) {
        Ok(root) => root,
        Err(e) => return send_error(&proxy, e),
    };
    if !root.is_dir() {
        return send_error(&proxy, format!("Not a directory: {}", root.display()));
    }

    let mut state_guard = lock_state(&state);
    let generation = state_guard.set_root(&root);
    proxy.send_event(UserEvent::RootChanged {
        root: root.clone(),
        generation,
    });
    let handles = tasks::start_root_tasks(&state_guard, proxy.clone(), state.clone());
    state_guard.root_tasks = handles;
}

/// Lists the children of a directory (the root when no path is given).
pub fn list_children<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) =
        parse_payload::<ListChildrenPayload, _>("list_children", or_empty(payload), &proxy)
    else {
        return;
    };
    let state_guard = lock_state(&state);
    let dir = match req.path {
        Some(raw) => match state_guard.resolve(&raw) {
            Ok(dir) => dir,
            Err(e) => return send_error(&proxy, e),
        },
        None => state_guard.working_root(),
    };
    let show_hidden = req.show_hidden.unwrap_or(state_guard.show_hidden);
    spawn_list_children(&state_guard, dir, show_hidden, proxy.clone(), state.clone());
}

/// Renders the full tree of the current root.
pub fn full_tree<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<ShowHiddenPayload, _>("full_tree", or_empty(payload), &proxy)
    else {
        return;
    };
    let (root, exclusions, hidden, show_hidden) = {
        let state_guard = lock_state(&state);
        (
            state_guard.working_root(),
            state_guard.exclusions.clone(),
            state_guard.hidden.clone(),
            req.show_hidden.unwrap_or(state_guard.show_hidden),
        )
    };
    let tree = TreeWalker::new(&exclusions, &hidden, None).full_tree_string(&root, show_hidden);
    proxy.send_event(UserEvent::FullTree { tree });
}

/// Loads a single file for the preview pane.
pub fn load_file_preview<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) = parse_payload::<PathPayload, _>("preview", payload, &proxy) else {
        return;
    };
    let (path, max_bytes) = {
        let state_guard = lock_state(&state);
        match state_guard.resolve(&req.path) {
            Ok(path) => (path, state_guard.config.max_preview_bytes),
            Err(e) => return send_error(&proxy, e),
        }
    };

    match CodeBundler::preview(&path, max_bytes) {
        Ok(content) => proxy.send_event(UserEvent::Preview { path, content }),
        Err(e) => send_error(&proxy, e),
    }
}

/// Bundles exactly the requested paths, in the requested order.
pub fn bundle_paths<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<PathsPayload, _>("code", payload, &proxy) else {
        return;
    };
    let paths = {
        let state_guard = lock_state(&state);
        match resolve_all(&state_guard, &req.paths) {
            Ok(paths) => paths,
            Err(e) => return send_error(&proxy, e),
        }
    };
    let bundle = CodeBundler::bundle(&paths);
    proxy.send_event(UserEvent::Code { code: bundle.text });
}

/// Reports the current options. Known extensions are initialised from the
/// working root the first time they are needed; the scan runs unlocked.
pub fn get_options<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let scanned = pending_known_scan(&state).map(|(index, root)| index.scan(&root));
    with_state_and_notify(&state, &proxy, |s| {
        if let Some(scanned) = scanned {
            s.preferences.record_known_scan(scanned);
        }
    });
}

/// The index and directory for the initial known-extension scan, if one is
/// still due. The state lock is released on return.
fn pending_known_scan(state: &Arc<Mutex<AppState>>) -> Option<(ExtensionIndex, PathBuf)> {
    let state_guard = lock_state(state);
    state_guard
        .preferences
        .needs_known_scan()
        .then(|| (state_guard.extension_index(), state_guard.working_root()))
}

/// Replaces the selected extensions and regenerates the bundle.
pub fn set_extensions<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) = parse_payload::<ExtensionsPayload, _>("set_extensions", payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        let rejected = s.preferences.set_selected_extensions(&req.extensions);
        if !rejected.is_empty() {
            send_error(
                &proxy,
                format!("Unknown extensions ignored: {}", rejected.join(", ")),
            );
        }
        if let Err(e) = s.preferences.save() {
            tracing::error!("Failed to persist selected extensions: {}", e);
        }
        schedule_regeneration(s, proxy.clone(), state.clone());
    });
}

pub fn set_hidden_extensions<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) =
        parse_payload::<ExtensionsPayload, _>("set_hidden_extensions", payload, &proxy)
    else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        s.preferences.set_hidden_extensions(&req.extensions);
        if let Err(e) = s.preferences.save() {
            tracing::error!("Failed to persist hidden extensions: {}", e);
        }
    });
}

/// Replaces the whole favorites list.
pub fn set_favorites<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) = parse_payload::<FavoritesPayload, _>("set_favorites", payload, &proxy) else {
        return;
    };
    let paths = match resolve_all(&lock_state(&state), &req.favorites) {
        Ok(paths) => paths,
        Err(e) => return send_error(&proxy, e),
    };
    with_state_and_notify(&state, &proxy, |s| {
        s.favorites.replace_all(&paths);
        if let Err(e) = s.favorites.save() {
            tracing::error!("Failed to persist favorites: {}", e);
        }
    });
}

/// Replaces the whole hidden items list and regenerates the bundle.
pub fn set_hidden<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<HiddenPayload, _>("set_hidden", payload, &proxy) else {
        return;
    };
    let paths = match resolve_all(&lock_state(&state), &req.hidden) {
        Ok(paths) => paths,
        Err(e) => return send_error(&proxy, e),
    };
    with_state_and_notify(&state, &proxy, |s| {
        s.hidden.replace_all(&paths);
        if let Err(e) = s.hidden.save() {
            tracing::error!("Failed to persist hidden items: {}", e);
        }
        schedule_regeneration(s, proxy.clone(), state.clone());
    });
}

/// Which single-path set mutation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathToggle {
    Favorite,
    Unfavorite,
    Hide,
    Unhide,
}

/// Adds or removes one path from the favorites or hidden items.
pub fn toggle_path<P: EventProxy>(
    toggle: PathToggle,
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) = parse_payload::<PathPayload, _>("toggle_path", payload, &proxy) else {
        return;
    };
    let path = match lock_state(&state).resolve(&req.path) {
        Ok(path) => path,
        Err(e) => return send_error(&proxy, e),
    };

    with_state_and_notify(&state, &proxy, |s| {
        let affects_hidden = matches!(toggle, PathToggle::Hide | PathToggle::Unhide);
        let set = if affects_hidden {
            &mut s.hidden
        } else {
            &mut s.favorites
        };
        let changed = match toggle {
            PathToggle::Favorite | PathToggle::Hide => set.add(&path),
            PathToggle::Unfavorite | PathToggle::Unhide => set.remove(&path),
        };
        if !changed {
            tracing::debug!("{:?} of {:?} changed nothing", toggle, path);
            return;
        }
        if let Err(e) = set.save() {
            tracing::error!("Failed to persist {:?}: {}", set.file(), e);
        }
        if affects_hidden {
            schedule_regeneration(s, proxy.clone(), state.clone());
        }
    });
}

/// Records a manual include (`true`) or exclude (`false`) for a path.
pub fn set_manual_selection<P: EventProxy>(
    include: bool,
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) = parse_payload::<PathPayload, _>("select", payload, &proxy) else {
        return;
    };
    let mut state_guard = lock_state(&state);
    let path = match state_guard.resolve(&req.path) {
        Ok(path) => path,
        Err(e) => return send_error(&proxy, e),
    };
    if include {
        state_guard.manual.include(&path);
    } else {
        state_guard.manual.exclude(&path);
    }
    schedule_regeneration(&mut state_guard, proxy.clone(), state.clone());
}

pub fn clear_selection<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let mut state_guard = lock_state(&state);
    state_guard.manual.clear();
    schedule_regeneration(&mut state_guard, proxy.clone(), state.clone());
}

pub fn set_show_hidden<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(req) = parse_payload::<ShowHiddenPayload, _>("set_show_hidden", payload, &proxy)
    else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        s.show_hidden = req.show_hidden.unwrap_or(false);
    });
}

/// Requests a bundle of the current selection, optionally prefixed by the tree.
pub fn generate<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<GeneratePayload, _>("generate", or_empty(payload), &proxy)
    else {
        return;
    };
    let mut state_guard = lock_state(&state);
    if state_guard.root.is_none() {
        return send_error(&proxy, "No root directory selected.");
    }
    state_guard.include_tree = req.include_tree.unwrap_or(false);
    schedule_regeneration(&mut state_guard, proxy.clone(), state.clone());
}

/// Renames a file or directory; favorites, hidden items and manual
/// selections follow it.
pub fn rename_path<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<RenamePayload, _>("rename", payload, &proxy) else {
        return;
    };
    let mut state_guard = lock_state(&state);
    let old_path = match state_guard.resolve(&req.old_path) {
        Ok(path) => path,
        Err(e) => return send_error(&proxy, e),
    };
    let s = &mut *state_guard;
    let root = s.working_root();
    let result = FileOpsCoordinator::new(&root, &mut s.favorites, &mut s.hidden)
        .rename(&old_path, &req.new_name);

    let event = match result {
        Ok(new_path) => {
            s.manual.rename_subtree(&old_path, &new_path);
            UserEvent::FsResult {
                success: true,
                new_path: Some(new_path),
                errors: Vec::new(),
            }
        }
        Err(e) => {
            tracing::warn!("Rename of {:?} failed: {}", old_path, e);
            UserEvent::FsResult {
                success: false,
                new_path: None,
                errors: vec![PathError {
                    path: old_path,
                    message: e.to_string(),
                }],
            }
        }
    };
    proxy.send_event(event);
    proxy.send_event(UserEvent::Options(Box::new(generate_options_view(s))));
    schedule_regeneration(s, proxy.clone(), state.clone());
}

/// Deletes one path or a batch; each failure is reported individually.
pub fn delete_paths<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<DeletePayload, _>("delete", payload, &proxy) else {
        return;
    };
    let raw = match req {
        DeletePayload::One { path } => vec![path],
        DeletePayload::Many { paths } => paths,
    };

    let mut state_guard = lock_state(&state);
    let paths = match resolve_all(&state_guard, &raw) {
        Ok(paths) => paths,
        Err(e) => return send_error(&proxy, e),
    };

    let s = &mut *state_guard;
    let root = s.working_root();
    let results = FileOpsCoordinator::new(&root, &mut s.favorites, &mut s.hidden).delete_many(&paths);

    let mut errors = Vec::new();
    for (path, result) in results {
        match result {
            Ok(()) => s.manual.remove_subtree(&path),
            Err(e) => {
                tracing::warn!("Delete of {:?} failed: {}", path, e);
                errors.push(PathError {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }
    proxy.send_event(UserEvent::FsResult {
        success: errors.is_empty(),
        new_path: None,
        errors,
    });
    proxy.send_event(UserEvent::Options(Box::new(generate_options_view(s))));
    schedule_regeneration(s, proxy.clone(), state.clone());
}

/// Searches the current root by name, extension and modification date.
pub async fn search<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(req) = parse_payload::<SearchPayload, _>("search", or_empty(payload), &proxy) else {
        return;
    };
    let query = SearchQuery {
        name: req.name,
        extensions: req.extensions,
        modified_since: req.modified_since,
    };
    tasks::run_search(query, proxy, state).await;
}
