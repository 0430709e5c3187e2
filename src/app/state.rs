//! Defines the central, mutable state of the application.

use std::path::PathBuf;

use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::core::{FilterState, ProgressUpdate, ResultRecord, SkippedFile, SortState};

/// Lifecycle of the (at most one) live search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    /// A single-file request/response search is running.
    Searching,
    /// A folder-search stream is open.
    Streaming,
    Completed,
    Cancelled,
    Errored,
}

/// The live folder-search stream, if any.
///
/// The id arrives asynchronously in the first stream message and is the only
/// handle the command layer may use to cancel. The epoch identifies the
/// current stream generation; a consumer task whose epoch no longer matches
/// has been superseded and must not touch state.
pub struct SearchSession {
    pub id: Option<String>,
    pub task: Option<JoinHandle<()>>,
    pub epoch: u64,
}

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow for safe, shared access
/// from different threads (e.g., the main event loop, IPC handlers, and async tasks).
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// The live search session.
    pub session: SearchSession,
    /// Where the current or last search is in its lifecycle.
    pub phase: SearchPhase,
    /// Latest progress update of the open stream.
    pub progress: Option<ProgressUpdate>,
    /// The flat result records of the last completed (or cancelled) search.
    pub results: Vec<ResultRecord>,
    pub results_sort: SortState,
    pub results_filter: FilterState,
    /// The skip list as last fetched from the search service.
    pub skipped: Vec<SkippedFile>,
    pub skipped_sort: SortState,
    pub skipped_filter: FilterState,
    /// A transient informational notice, cleared when the next search starts.
    pub notice: Option<String>,
    /// Session-only (not persisted): last picked folder, file, and search kind.
    pub last_folder: Option<PathBuf>,
    pub last_file: Option<PathBuf>,
    pub last_search_kind: Option<String>,
}

impl Default for AppState {
    /// Creates a default `AppState` instance, loading the configuration from disk.
    fn default() -> Self {
        Self {
            config: AppConfig::load().unwrap_or_default(),
            session: SearchSession {
                id: None,
                task: None,
                epoch: 0,
            },
            phase: SearchPhase::Idle,
            progress: None,
            results: Vec::new(),
            results_sort: SortState::default(),
            results_filter: FilterState::default(),
            skipped: Vec::new(),
            skipped_sort: SortState::default(),
            skipped_filter: FilterState::default(),
            notice: None,
            last_folder: None,
            last_file: None,
            last_search_kind: None,
        }
    }
}

impl AppState {
    pub fn is_searching(&self) -> bool {
        matches!(self.phase, SearchPhase::Searching | SearchPhase::Streaming)
    }

    /// A cancel affordance only makes sense while a stream is open and its
    /// id has arrived.
    pub fn can_cancel(&self) -> bool {
        self.phase == SearchPhase::Streaming && self.session.id.is_some()
    }

    /// Prepares for a new single-file search, superseding any live stream.
    pub fn begin_file_search(&mut self) {
        self.supersede_session();
        self.phase = SearchPhase::Searching;
        self.notice = None;
        self.progress = None;
    }

    /// Prepares for a new folder search and returns the new session epoch.
    pub fn begin_folder_search(&mut self) -> u64 {
        self.supersede_session();
        self.phase = SearchPhase::Streaming;
        self.notice = None;
        self.progress = None;
        self.session.epoch
    }

    /// Installs a fresh result set. Sort and filter state always reset with
    /// the records they belonged to.
    pub fn set_results(&mut self, records: Vec<ResultRecord>) {
        self.results = records;
        self.results_sort = SortState::default();
        self.results_filter = FilterState::default();
        self.progress = None;
    }

    pub fn set_skip_list(&mut self, records: Vec<SkippedFile>) {
        self.skipped = records;
        self.skipped_sort = SortState::default();
        self.skipped_filter = FilterState::default();
    }

    /// Tears down the live session. Idempotent; safe to call from a shutdown
    /// path or when no session exists.
    pub fn cleanup_session(&mut self) {
        self.supersede_session();
        self.phase = SearchPhase::Idle;
        self.progress = None;
    }

    /// Aborts the consumer task and bumps the epoch so a task that was
    /// already past its abort point sees itself as stale.
    fn supersede_session(&mut self) {
        if let Some(handle) = self.session.task.take() {
            tracing::info!(epoch = self.session.epoch, "superseding search session");
            handle.abort();
        }
        self.session.id = None;
        self.session.epoch += 1;
    }
}
