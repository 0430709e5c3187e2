//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! These handlers are responsible for interacting with the `AppState` and the
//! search service, and for sending `UserEvent`s back to the UI.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::config::{self, Theme};
use crate::core::{skipped, CoreError, SearchMode};

use super::backend::SearchService;
use super::events::UserEvent;
use super::file_dialog::DialogService;
use super::helpers::with_state_and_notify;
use super::proxy::EventProxy;
use super::state::{AppState, SearchPhase};
use super::tasks;
use super::view_model::generate_ui_state;

/// Which kind of target a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    File,
    Folder,
}

/// Regular keyword search vs. natural-language search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Regular,
    Nlp,
}

/// User-selectable match type for regular searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubMode {
    Exact,
    Any,
    All,
}

/// The raw search form as submitted by the frontend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub mode: Option<TargetMode>,
    #[serde(default)]
    pub kind: Option<SearchKind>,
    #[serde(default)]
    pub sub_mode: Option<SubMode>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub folder_path: Option<String>,
}

/// A validated, dispatchable search.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub target: SearchTarget,
    pub query: String,
    pub mode: SearchMode,
}

#[derive(Debug, Clone)]
pub enum SearchTarget {
    File(PathBuf),
    Folder(PathBuf),
}

/// Validates a request in a fixed order: query, then mode, then match type
/// (regular searches only), then target. The first failure wins and its
/// message is shown verbatim; nothing reaches the search service.
///
/// A natural-language search always forces the effective mode to `Nlp`,
/// regardless of any selected match type.
pub fn validate_request(request: &SearchRequest) -> Result<SearchPlan, CoreError> {
    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err(CoreError::Validation(
            "Please enter a search query.".to_string(),
        ));
    }

    let target_mode = request
        .mode
        .ok_or_else(|| CoreError::Validation("Please select a search mode.".to_string()))?;

    let kind = request.kind.unwrap_or(SearchKind::Regular);
    let mode = match kind {
        SearchKind::Nlp => SearchMode::Nlp,
        SearchKind::Regular => match request.sub_mode {
            Some(SubMode::Exact) => SearchMode::Exact,
            Some(SubMode::Any) => SearchMode::Any,
            Some(SubMode::All) => SearchMode::All,
            None => {
                return Err(CoreError::Validation(
                    "Please select a match type.".to_string(),
                ))
            }
        },
    };

    let target = match target_mode {
        TargetMode::File => {
            let path = request
                .file_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    CoreError::Validation("Please select a file to search.".to_string())
                })?;
            SearchTarget::File(PathBuf::from(path))
        }
        TargetMode::Folder => {
            let path = request
                .folder_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    CoreError::Validation("Please select a folder to search.".to_string())
                })?;
            SearchTarget::Folder(PathBuf::from(path))
        }
    };

    Ok(SearchPlan {
        target,
        query,
        mode,
    })
}

/// Handles the initial request for state from the frontend when it loads.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");
    let event = UserEvent::StateUpdate(Box::new(generate_ui_state(&state_guard)));
    proxy.send_event(event);
}

/// Validates and dispatches a search.
///
/// File searches run request/response and settle here; folder searches hand
/// off to the stream consumer task, which owns settling. Either way the UI
/// always returns to an interactive state.
pub async fn run_search<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
) {
    let request: SearchRequest = match serde_json::from_value(payload.clone()) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Failed to deserialize search request: {} ({:?})", e, payload);
            return;
        }
    };

    let plan = match validate_request(&request) {
        Ok(plan) => plan,
        Err(e) => {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
    };

    match plan.target {
        SearchTarget::File(path) => {
            with_state_and_notify(&state, &proxy, |s| {
                s.begin_file_search();
                s.last_file = Some(path.clone());
            });

            match service.search_file(&path, &plan.query, plan.mode).await {
                Ok(records) => {
                    with_state_and_notify(&state, &proxy, |s| {
                        let empty = records.is_empty();
                        s.set_results(records);
                        s.phase = SearchPhase::Completed;
                        if empty {
                            s.notice = Some("No results found.".to_string());
                        }
                    });
                }
                Err(e) => {
                    proxy.send_event(UserEvent::ShowError(e.to_string()));
                    with_state_and_notify(&state, &proxy, |s| {
                        s.phase = SearchPhase::Errored;
                    });
                }
            }
        }
        SearchTarget::Folder(folder) => {
            {
                let mut state_guard = state
                    .lock()
                    .expect("Mutex was poisoned. This should not happen.");
                state_guard.last_folder = Some(folder.clone());
            }
            tasks::start_folder_search(proxy, state, service, folder, plan.query, plan.mode);
        }
    }
}

/// Requests cancellation of the live folder search.
///
/// Without a recorded session id this is a silent no-op: the id arrives
/// asynchronously and an early click has nothing to address. Actual
/// settling happens when the stream's terminal `cancelled` message arrives.
pub async fn cancel_search<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
) {
    let search_id = {
        let state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard.session.id.clone()
    };

    let Some(search_id) = search_id else {
        tracing::info!("cancel requested with no active session id, ignoring");
        return;
    };

    if let Err(e) = service.cancel(&search_id).await {
        proxy.send_event(UserEvent::ShowError(e.to_string()));
    }
}

/// Payload for filter updates on either table.
#[derive(Debug, Deserialize)]
pub struct FilterPayload {
    #[serde(default)]
    pub text: String,
    pub column: crate::core::FilterColumn,
}

pub fn update_result_filter<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(filter) = serde_json::from_value::<FilterPayload>(payload) {
        with_state_and_notify(&state, &proxy, |s| {
            s.results_filter.text = filter.text;
            s.results_filter.column = filter.column;
        });
    }
}

pub fn sort_results<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(column) = serde_json::from_value::<i32>(payload) {
        with_state_and_notify(&state, &proxy, |s| {
            s.results_sort.toggle(column);
        });
    }
}

pub fn update_skipped_filter<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(filter) = serde_json::from_value::<FilterPayload>(payload) {
        with_state_and_notify(&state, &proxy, |s| {
            s.skipped_filter.text = filter.text;
            s.skipped_filter.column = filter.column;
        });
    }
}

pub fn sort_skipped<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(column) = serde_json::from_value::<i32>(payload) {
        with_state_and_notify(&state, &proxy, |s| {
            s.skipped_sort.toggle(column);
        });
    }
}

/// Fetches the skip list from the service into state.
pub async fn load_skip_list<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
) {
    match service.skip_list().await {
        Ok(records) => {
            with_state_and_notify(&state, &proxy, |s| {
                s.set_skip_list(records);
            });
        }
        Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
    }
}

pub async fn clear_skip_list<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
) {
    match service.clear_skip_list().await {
        Ok(()) => {
            with_state_and_notify(&state, &proxy, |s| {
                s.set_skip_list(Vec::new());
            });
        }
        Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
    }
}

/// Exports the current skip list as CSV to a user-chosen location.
pub async fn export_skip_list<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    service: Arc<dyn SearchService>,
) {
    let Some(path) = dialog.export_csv_path() else {
        tracing::info!("User cancelled skip-list export.");
        return;
    };

    match service.skip_list().await {
        Ok(records) => {
            let csv = skipped::export_skip_list_csv(&records);
            match std::fs::write(&path, csv) {
                Ok(()) => {
                    proxy.send_event(UserEvent::SkipListExported(
                        true,
                        path.to_string_lossy().into_owned(),
                    ));
                }
                Err(e) => {
                    proxy.send_event(UserEvent::ShowError(
                        CoreError::Io(e, path.clone()).to_string(),
                    ));
                }
            }
        }
        Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
    }
}

/// Opens a result's file with the system default application.
pub fn open_result_file<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    if let Ok(path) = serde_json::from_value::<String>(payload) {
        if let Err(e) = open::that(&path) {
            proxy.send_event(UserEvent::ShowError(CoreError::Open(e.to_string()).to_string()));
        }
    }
}

/// Opens the native folder picker and remembers the choice for this run.
pub fn select_folder<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(path) = dialog.pick_folder() {
        with_state_and_notify(&state, &proxy, |s| {
            s.last_folder = Some(path.clone());
        });
    } else {
        tracing::info!("User cancelled folder selection.");
    }
}

/// Opens the native file picker for a single file to search.
pub fn select_file<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(path) = dialog.pick_search_file() {
        with_state_and_notify(&state, &proxy, |s| {
            s.last_file = Some(path.clone());
        });
    } else {
        tracing::info!("User cancelled file selection.");
    }
}

/// Resets the search service and the session around it.
pub async fn restart_services<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    service: Arc<dyn SearchService>,
) {
    match service.restart().await {
        Ok(()) => {
            with_state_and_notify(&state, &proxy, |s| {
                s.cleanup_session();
                s.set_skip_list(Vec::new());
                s.notice = Some("Services restarted.".to_string());
            });
        }
        Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
    }
}

/// Persists a theme change.
pub fn set_theme<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    if let Ok(theme) = serde_json::from_value::<Theme>(payload) {
        with_state_and_notify(&state, &proxy, |s| {
            s.config.theme = theme;
            if let Err(e) = config::settings::save_config(&s.config) {
                tracing::warn!("Failed to save config after theme change: {}", e);
            }
        });
    }
}

/// Remembers the last selected search kind for the lifetime of this run.
pub fn set_search_kind<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(kind) = serde_json::from_value::<String>(payload) {
        with_state_and_notify(&state, &proxy, |s| {
            s.last_search_kind = Some(kind);
        });
    }
}

/// Tears down the live session. Idempotent; called from the shutdown path
/// and whenever the frontend unloads.
pub fn cleanup(state: Arc<Mutex<AppState>>) {
    let mut state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");
    state_guard.cleanup_session();
}
