//! Long-running async tasks: the folder-search stream consumer.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::core::{CoreError, SearchMode, StreamEvent, StreamMessage};

use super::backend::{SearchService, SearchStream};
use super::events::UserEvent;
use super::helpers::with_state_and_notify;
use super::proxy::EventProxy;
use super::state::{AppState, SearchPhase};

/// Opens a folder-search stream and spawns its consumer task.
///
/// Supersedes any live session: the prior consumer is aborted and its epoch
/// invalidated before the new stream is opened.
pub fn start_folder_search<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
    folder: PathBuf,
    query: String,
    mode: SearchMode,
) {
    let epoch = {
        let mut state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard.begin_folder_search()
    };

    let stream = service.search_folder(folder, query, mode);

    let task_proxy = proxy.clone();
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        consume_stream(task_proxy, task_state, epoch, stream).await;
    });

    with_state_and_notify(&state, &proxy, |s| {
        // Only install the handle if this is still the session we started;
        // a faster competing search may already have superseded it.
        if s.session.epoch == epoch {
            s.session.task = Some(handle);
        } else {
            handle.abort();
        }
    });
}

/// Reads one stream to its end, routing each message per the protocol.
///
/// Every state mutation is guarded by the session epoch, so a consumer that
/// was superseded mid-message never corrupts the newer session. Channel
/// closure without a terminal message is reported as a connection error.
async fn consume_stream<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    epoch: u64,
    mut stream: SearchStream,
) {
    let mut saw_terminal = false;

    while let Some(message) = stream.recv().await {
        if is_stale(&state, epoch) {
            tracing::info!(epoch, "stream consumer superseded, dropping message");
            return;
        }

        let terminal = message.is_terminal();
        match message {
            StreamMessage::SearchId { search_id } => {
                // Recorded silently; the UI learns about it only through the
                // can_cancel flag of the next state update.
                with_state_and_notify(&state, &proxy, |s| {
                    s.session.id = Some(search_id.clone());
                });
            }
            StreamMessage::Event(StreamEvent::Progress(update)) => {
                with_state_and_notify(&state, &proxy, |s| {
                    s.progress = Some(update.clone());
                });
            }
            StreamMessage::Event(StreamEvent::Complete { results }) => {
                with_state_and_notify(&state, &proxy, |s| {
                    let empty = results.is_empty();
                    s.set_results(results);
                    s.phase = SearchPhase::Completed;
                    s.session.id = None;
                    if empty {
                        s.notice = Some("No results found.".to_string());
                    }
                });
            }
            StreamMessage::Event(StreamEvent::Cancelled { results }) => {
                with_state_and_notify(&state, &proxy, |s| {
                    s.set_results(results);
                    s.phase = SearchPhase::Cancelled;
                    s.session.id = None;
                    s.notice = Some("Search cancelled. Showing partial results.".to_string());
                });
            }
            StreamMessage::Error { error } => {
                proxy.send_event(UserEvent::ShowError(error));
                with_state_and_notify(&state, &proxy, |s| {
                    s.phase = SearchPhase::Errored;
                    s.session.id = None;
                    s.progress = None;
                });
            }
        }

        if terminal {
            saw_terminal = true;
            break;
        }
    }

    if !saw_terminal && !is_stale(&state, epoch) {
        tracing::warn!(epoch, "search stream closed without a terminal message");
        proxy.send_event(UserEvent::ShowError(CoreError::Stream.to_string()));
        with_state_and_notify(&state, &proxy, |s| {
            s.phase = SearchPhase::Errored;
            s.session.id = None;
            s.progress = None;
        });
    }
}

fn is_stale(state: &Arc<Mutex<AppState>>, epoch: u64) -> bool {
    let state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");
    state_guard.session.epoch != epoch
}
