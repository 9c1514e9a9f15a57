//! Contains helper functions to reduce boilerplate code in other `app` modules.

use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model::generate_options_view;

pub fn lock_state(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
}

/// A helper function that locks the `AppState`, performs a mutation,
/// and then automatically sends an `Options` event to the UI.
pub fn with_state_and_notify<F, P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    update_fn: F,
) where
    F: FnOnce(&mut AppState),
{
    let mut state_guard = lock_state(state);
    update_fn(&mut state_guard);
    let view = generate_options_view(&state_guard);
    proxy.send_event(UserEvent::Options(Box::new(view)));
}

/// Deserialises a command payload, reporting failures to the UI.
pub fn parse_payload<T: DeserializeOwned, P: EventProxy>(
    command: &str,
    payload: serde_json::Value,
    proxy: &P,
) -> Option<T> {
    match serde_json::from_value::<T>(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Invalid payload for '{}': {}", command, e);
            proxy.send_event(UserEvent::ShowError(format!(
                "Invalid payload for '{}': {}",
                command, e
            )));
            None
        }
    }
}

/// Sends any displayable error to the UI.
pub fn send_error<P: EventProxy>(proxy: &P, error: impl std::fmt::Display) {
    proxy.send_event(UserEvent::ShowError(error.to_string()));
}
