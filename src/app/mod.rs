//! The application layer: shared state, IPC command dispatch, background
//! tasks and the events sent back to the frontend.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};

use commands::PathToggle;
use events::{IpcMessage, UserEvent};
use proxy::EventProxy;
use state::AppState;

/// Runs a handler that reads or writes the file system on the blocking pool
/// and waits for it, so messages are still handled in arrival order.
async fn blocking<F>(handler: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Err(e) = tokio::task::spawn_blocking(handler).await {
        tracing::error!("Command handler panicked: {}", e);
    }
}

/// Parses a raw JSON message and dispatches it.
pub async fn handle_raw_message<P: EventProxy>(raw: &str, proxy: P, state: Arc<Mutex<AppState>>) {
    match parse_message(raw) {
        Ok(message) => handle_ipc_message(message, proxy, state).await,
        Err(e) => {
            tracing::warn!("{:#}", e);
            proxy.send_event(UserEvent::ShowError(format!("{:#}", e)));
        }
    }
}

fn parse_message(raw: &str) -> Result<IpcMessage> {
    serde_json::from_str(raw).with_context(|| format!("Failed to parse IPC message: {}", raw.trim()))
}

/// Dispatches one IPC message to its command handler.
pub async fn handle_ipc_message<P: EventProxy>(
    message: IpcMessage,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    tracing::debug!("IPC command '{}'", message.command);
    let payload = message.payload;

    match message.command.as_str() {
        "set_root" => blocking(move || commands::set_root(payload, proxy, state)).await,
        "list_children" => commands::list_children(payload, proxy, state),
        "full_tree" => blocking(move || commands::full_tree(payload, proxy, state)).await,
        "preview" => blocking(move || commands::load_file_preview(payload, proxy, state)).await,
        "code" => blocking(move || commands::bundle_paths(payload, proxy, state)).await,
        "get_options" => blocking(move || commands::get_options(proxy, state)).await,
        "set_extensions" => commands::set_extensions(payload, proxy, state),
        "set_favorites" => commands::set_favorites(payload, proxy, state),
        "set_hidden" => commands::set_hidden(payload, proxy, state),
        "set_hidden_extensions" => commands::set_hidden_extensions(payload, proxy, state),
        "favorite" => commands::toggle_path(PathToggle::Favorite, payload, proxy, state),
        "unfavorite" => commands::toggle_path(PathToggle::Unfavorite, payload, proxy, state),
        "hide" => commands::toggle_path(PathToggle::Hide, payload, proxy, state),
        "unhide" => commands::toggle_path(PathToggle::Unhide, payload, proxy, state),
        "select" => commands::set_manual_selection(true, payload, proxy, state),
        "deselect" => commands::set_manual_selection(false, payload, proxy, state),
        "clear_selection" => commands::clear_selection(proxy, state),
        "set_show_hidden" => commands::set_show_hidden(payload, proxy, state),
        "generate" => commands::generate(payload, proxy, state),
        "rename" => blocking(move || commands::rename_path(payload, proxy, state)).await,
        "delete" => blocking(move || commands::delete_paths(payload, proxy, state)).await,
        "search" => commands::search(payload, proxy, state).await,
        unknown => {
            tracing::warn!("Unknown IPC command: {}", unknown);
            proxy.send_event(UserEvent::ShowError(format!("Unknown command: {}", unknown)));
        }
    }
}
