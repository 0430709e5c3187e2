//! The application layer: state, command handlers, async tasks, and the glue
//! between the webview frontend and the search service.

pub mod backend;
pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::{IpcMessage, UserEvent};
use file_dialog::DialogService;
use proxy::EventProxy;
use state::AppState;

use backend::SearchService;

/// Entry point for every message arriving on the webview IPC channel.
///
/// Parses the JSON envelope and routes to the matching command handler.
/// Async handlers are spawned so the IPC callback never blocks the UI
/// thread.
pub fn handle_ipc_message<P: EventProxy>(
    message: String,
    dialog: Arc<dyn DialogService>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
) {
    let ipc_message: IpcMessage = match serde_json::from_str(&message) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {} ({})", e, message);
            return;
        }
    };

    tracing::debug!(command = %ipc_message.command, "IPC command received");
    let payload = ipc_message.payload;

    match ipc_message.command.as_str() {
        "initialize" => commands::initialize(proxy, state),
        "runSearch" => {
            tokio::spawn(async move {
                commands::run_search(payload, proxy, state, service).await;
            });
        }
        "cancelSearch" => {
            tokio::spawn(async move {
                commands::cancel_search(proxy, state, service).await;
            });
        }
        "updateResultFilter" => commands::update_result_filter(payload, proxy, state),
        "sortResults" => commands::sort_results(payload, proxy, state),
        "updateSkippedFilter" => commands::update_skipped_filter(payload, proxy, state),
        "sortSkipped" => commands::sort_skipped(payload, proxy, state),
        "loadSkipList" => {
            tokio::spawn(async move {
                commands::load_skip_list(proxy, state, service).await;
            });
        }
        "clearSkipList" => {
            tokio::spawn(async move {
                commands::clear_skip_list(proxy, state, service).await;
            });
        }
        "exportSkipList" => {
            tokio::spawn(async move {
                commands::export_skip_list(dialog.as_ref(), proxy, service).await;
            });
        }
        "openResultFile" => commands::open_result_file(payload, proxy),
        "selectFolder" => commands::select_folder(dialog.as_ref(), proxy, state),
        "selectFile" => commands::select_file(dialog.as_ref(), proxy, state),
        "restartServices" => {
            tokio::spawn(async move {
                commands::restart_services(proxy, state, service).await;
            });
        }
        "setTheme" => commands::set_theme(payload, proxy, state),
        "setSearchKind" => commands::set_search_kind(payload, proxy, state),
        "cleanup" => commands::cleanup(state),
        unknown => tracing::warn!("Unknown IPC command: {}", unknown),
    }
}

/// Translates a `UserEvent` into a JavaScript call against the webview.
pub fn handle_user_event(event: UserEvent, webview: &wry::WebView) {
    let script = match event {
        UserEvent::StateUpdate(ui_state) => match serde_json::to_string(&ui_state) {
            Ok(json) => format!("window.render({json});"),
            Err(e) => {
                tracing::error!("Failed to serialize UiState: {}", e);
                return;
            }
        },
        UserEvent::ShowError(message) => {
            format!(
                "window.showError({});",
                serde_json::json!(message)
            )
        }
        UserEvent::ShowNotice(message) => {
            format!(
                "window.showNotice({});",
                serde_json::json!(message)
            )
        }
        UserEvent::SkipListExported(ok, path) => {
            format!(
                "window.skipListExported({}, {});",
                ok,
                serde_json::json!(path)
            )
        }
    };

    if let Err(e) = webview.evaluate_script(&script) {
        tracing::error!("Failed to evaluate script in webview: {}", e);
    }
}
