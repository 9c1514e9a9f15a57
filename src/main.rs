//! Line-delimited JSON bridge: commands arrive on stdin, events leave on stdout.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use codetree::app::{self, events::UserEvent, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let state = Arc::new(Mutex::new(AppState::from_environment()?));
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UserEvent>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = event_rx.recv().await {
            let mut line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to serialise event: {}", e);
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                tracing::error!("Failed to write event: {}", e);
                break;
            }
            if let Err(e) = stdout.flush().await {
                tracing::error!("Failed to flush stdout: {}", e);
                break;
            }
        }
    });

    tracing::info!("Application initialized. Waiting for commands on stdin.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        app::handle_raw_message(&line, event_tx.clone(), state.clone()).await;
    }

    tracing::info!("Input closed. Saving final state...");
    {
        let mut state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard.cancel_root_work();
        if let Err(e) = state_guard.persist_all() {
            tracing::error!("Failed to save state on exit: {}", e);
        }
    }

    drop(event_tx);
    writer.await.context("Event writer task failed")?;
    Ok(())
}
