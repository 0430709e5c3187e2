//! Responsible for transforming the `AppState` into a `UiState` view model.
//!
//! This module acts as a presentation layer, preparing data specifically for
//! consumption by the UI. It runs the pure table projections and computes
//! display-related properties like the status message and progress bar.

use serde::Serialize;

use crate::config::AppConfig;
use crate::core::{results, skipped, ResultsTable, SkippedTable};

use super::state::{AppState, SearchPhase};

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
pub struct UiState {
    pub config: AppConfig,
    pub is_searching: bool,
    pub can_cancel: bool,
    pub status_message: String,
    pub progress: Option<ProgressView>,
    pub results: ResultsTable,
    /// `true` when the results area should not be rendered at all.
    pub results_hidden: bool,
    /// `true` when the active filter hides every data row.
    pub no_matching_results: bool,
    pub skipped: SkippedTable,
    pub skipped_no_matches: bool,
    pub notice: Option<String>,
    pub last_folder: Option<String>,
    pub last_file: Option<String>,
    pub last_search_kind: Option<String>,
}

/// Progress of the open stream, ready for a progress bar.
#[derive(Serialize, Clone, Debug)]
pub struct ProgressView {
    pub processed: usize,
    pub total: usize,
    pub percentage: u32,
    pub current_file: String,
    pub results_found: usize,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let results_table = results::project(&state.results, &state.results_sort, &state.results_filter);
    let skipped_table = skipped::project(&state.skipped, &state.skipped_sort, &state.skipped_filter);

    let progress = state.progress.as_ref().map(|p| ProgressView {
        processed: p.processed,
        total: p.total,
        percentage: p.percentage(),
        current_file: p.current_file.clone(),
        results_found: p.results_found,
    });

    let status_message = match state.phase {
        SearchPhase::Idle => "Ready.".to_string(),
        SearchPhase::Searching => "Searching...".to_string(),
        SearchPhase::Streaming => match &state.progress {
            Some(p) => format!(
                "Searching... {} of {} files ({} results)",
                p.processed, p.total, p.results_found
            ),
            None => "Starting search...".to_string(),
        },
        SearchPhase::Completed => format!("Search complete. {} results.", state.results.len()),
        SearchPhase::Cancelled => format!(
            "Search cancelled. {} partial results.",
            state.results.len()
        ),
        SearchPhase::Errored => "Search failed.".to_string(),
    };

    UiState {
        config: state.config.clone(),
        is_searching: state.is_searching(),
        can_cancel: state.can_cancel(),
        status_message,
        progress,
        results_hidden: results_table.is_empty(),
        no_matching_results: results_table.no_matches(),
        skipped_no_matches: skipped_table.no_matches(),
        results: results_table,
        skipped: skipped_table,
        notice: state.notice.clone(),
        last_folder: state
            .last_folder
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        last_file: state
            .last_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        last_search_kind: state.last_search_kind.clone(),
    }
}
