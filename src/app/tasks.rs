//! Background work: directory listings, extension scans, debounced bundle
//! regeneration and search.
//!
//! Every task records the root generation it was started for and drops its
//! result when the root changed in the meantime.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use super::events::{PathError, UserEvent};
use super::helpers::{lock_state, send_error};
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model::TreeItem;
use crate::core::{CodeBundler, CoreError, FileSearch, SearchQuery, SelectionEngine, TreeWalker};
use crate::utils::tokens::estimate_tokens;

/// Runs blocking file system work off the async threads.
async fn run_blocking<T, F>(work: F) -> Result<T, CoreError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await?)
}

/// Sends `event` only if `generation` is still the current root generation.
fn deliver_if_current<P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    generation: u64,
    event: UserEvent,
) -> bool {
    let state_guard = lock_state(state);
    if !state_guard.is_current(generation) {
        tracing::debug!(
            "Dropping stale result of generation {} (current {})",
            generation,
            state_guard.generation
        );
        return false;
    }
    proxy.send_event(event);
    true
}

fn report_task_failure<P: EventProxy>(proxy: &P, what: &str, error: CoreError) {
    match error {
        CoreError::Join(e) if e.is_cancelled() => {
            tracing::debug!("{} task was cancelled", what);
        }
        other => {
            tracing::error!("{} failed: {}", what, other);
            send_error(proxy, other);
        }
    }
}

/// Starts the listing of the new root and the extension scan. Both run
/// concurrently; their handles are returned so a later root change can
/// abort them.
pub fn start_root_tasks<P: EventProxy>(
    state_guard: &AppState,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Vec<JoinHandle<()>> {
    let Some(root) = state_guard.root.clone() else {
        return Vec::new();
    };
    let generation = state_guard.generation;

    let listing = spawn_list_children(
        state_guard,
        root.clone(),
        state_guard.show_hidden,
        proxy.clone(),
        state.clone(),
    );

    let index = state_guard.extension_index();
    let scan = tokio::spawn(async move {
        let scan_root = root.clone();
        let observed = match run_blocking(move || index.scan(&scan_root)).await {
            Ok(observed) => observed,
            Err(e) => return report_task_failure(&proxy, "Extension scan", e),
        };

        let mut state_guard = lock_state(&state);
        if !state_guard.is_current(generation) {
            tracing::debug!("Dropping extension scan of stale root {:?}", root);
            return;
        }
        if state_guard.preferences.merge_known_extensions(&observed) {
            if let Err(e) = state_guard.preferences.save() {
                tracing::error!("Failed to persist known extensions: {}", e);
            }
        }
        tracing::info!("Found {} extensions under {:?}", observed.len(), root);
        let selected = state_guard
            .preferences
            .selected_extensions()
            .iter()
            .cloned()
            .collect();
        state_guard.available_extensions = observed;
        proxy.send_event(UserEvent::Extensions {
            available: selectable_extensions(&state_guard).into_iter().collect(),
            selected,
        });
        schedule_regeneration(&mut state_guard, proxy.clone(), state.clone());
    });

    vec![listing, scan]
}

/// Lists one directory level in the background and sends it as `TreeLevel`.
pub fn spawn_list_children<P: EventProxy>(
    state_guard: &AppState,
    dir: PathBuf,
    show_hidden: bool,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> JoinHandle<()> {
    let generation = state_guard.generation;
    let exclusions = state_guard.exclusions.clone();
    let hidden = state_guard.hidden.clone();
    let filter = state_guard.preferences.effective_filter_extensions();

    tokio::spawn(async move {
        let list_dir = dir.clone();
        let listing = run_blocking(move || {
            TreeWalker::new(&exclusions, &hidden, filter.as_ref()).list_children(&list_dir, show_hidden)
        })
        .await;

        match listing {
            Ok(Ok(nodes)) => {
                let items: Vec<TreeItem> = nodes.into_iter().map(TreeItem::from).collect();
                tracing::debug!("Listed {} entries in {:?}", items.len(), dir);
                deliver_if_current(
                    &state,
                    &proxy,
                    generation,
                    UserEvent::TreeLevel { path: dir, items },
                );
            }
            Ok(Err(e)) | Err(e) => report_task_failure(&proxy, "Directory listing", e),
        }
    })
}

/// Schedules a selection recompute and bundle for the current root.
///
/// Bursts of calls within the debounce window collapse into one run.
pub fn schedule_regeneration<P: EventProxy>(
    state_guard: &mut AppState,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if state_guard.root.is_none() {
        return;
    }
    let generation = state_guard.generation;
    state_guard
        .regeneration
        .schedule(async move { regenerate(generation, proxy, state).await });
}

async fn regenerate<P: EventProxy>(generation: u64, proxy: P, state: Arc<Mutex<AppState>>) {
    let (root, selected, manual, hidden, exclusions, include_tree, show_hidden) = {
        let mut state_guard = lock_state(&state);
        let Some(root) = state_guard.root.clone() else {
            return;
        };
        if !state_guard.is_current(generation) {
            return;
        }
        let include_tree = std::mem::take(&mut state_guard.include_tree);
        (
            root,
            state_guard.preferences.selected_extensions().clone(),
            state_guard.manual.clone(),
            state_guard.hidden.clone(),
            state_guard.exclusions.clone(),
            include_tree,
            state_guard.show_hidden,
        )
    };

    let work = move || {
        let engine = SelectionEngine::new(exclusions.clone());
        let selection = engine.recompute(&root, &selected, &manual, &hidden);
        let files = SelectionEngine::included_files(&selection);
        let bundle = CodeBundler::bundle(&files);

        let code = if include_tree {
            let tree = TreeWalker::new(&exclusions, &hidden, None).full_tree_string(&root, show_hidden);
            CodeBundler::with_tree(&tree, &bundle.text)
        } else {
            bundle.text
        };
        let token_count = estimate_tokens(&code);
        let errors = bundle
            .errors
            .into_iter()
            .map(|(path, message)| PathError { path, message })
            .collect();
        (
            selection,
            UserEvent::GeneratedCode {
                code,
                file_count: bundle.file_count,
                token_count,
                errors,
            },
        )
    };

    let (selection, event) = match run_blocking(work).await {
        Ok(result) => result,
        Err(e) => return report_task_failure(&proxy, "Bundle generation", e),
    };

    let mut state_guard = lock_state(&state);
    if !state_guard.is_current(generation) {
        tracing::debug!("Dropping bundle of stale generation {}", generation);
        return;
    }
    state_guard.selection = selection;
    proxy.send_event(event);
}

/// Runs a search under the current root and sends `SearchResults`.
pub async fn run_search<P: EventProxy>(query: SearchQuery, proxy: P, state: Arc<Mutex<AppState>>) {
    let (root, generation, exclusions, hidden) = {
        let state_guard = lock_state(&state);
        (
            state_guard.working_root(),
            state_guard.generation,
            state_guard.exclusions.clone(),
            state_guard.hidden.clone(),
        )
    };

    let result = run_blocking(move || FileSearch::search(&root, &query, &exclusions, &hidden)).await;
    match result {
        Ok(Ok(paths)) => {
            deliver_if_current(&state, &proxy, generation, UserEvent::SearchResults { paths });
        }
        Ok(Err(e)) | Err(e) => report_task_failure(&proxy, "Search", e),
    }
}

/// Extensions observed under the current root, minus the hidden ones.
pub fn selectable_extensions(state: &AppState) -> BTreeSet<String> {
    state
        .available_extensions
        .difference(state.preferences.hidden_extensions())
        .cloned()
        .collect()
}
