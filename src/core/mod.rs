pub mod engine;
pub mod error;
pub mod results;
pub mod skipped;

use serde::{Deserialize, Serialize};

pub use engine::LocalSearchEngine;
pub use error::CoreError;
pub use results::{FilterColumn, FilterState, ResultsTable, SortState, TableRow};
pub use skipped::{export_skip_list_csv, SkippedTable};

/// How the query text is matched against cell values.
///
/// `Nlp` is the forced effective mode for natural-language queries; the
/// regular modes are the user-selectable sub-modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Exact,
    Any,
    All,
    Nlp,
}

/// One match found in a searched file. Immutable once received; grouping
/// identity for presentation is `filename`, not `filepath`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub filename: String,
    pub filepath: String,
    pub sheet: String,
    pub cell: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

/// Classification of a matched cell value, used for display glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Date,
    Monetary,
    BudgetCode,
    Plain,
}

/// A file the engine could not process, and why. Grouping key is `directory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub directory: String,
    pub file: String,
    pub path: String,
    pub reason: String,
}

/// Progress of an in-flight folder search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub current_file: String,
    pub results_found: usize,
}

impl ProgressUpdate {
    /// Completion percentage. A zero total (backend misreport) clamps to 0
    /// instead of dividing by zero.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.processed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// One message on a folder-search stream.
///
/// The wire shapes are heterogenous: an `{error}` object, a `{search_id}`
/// object, or a `{type: ...}` tagged object. `serde(untagged)` resolves them
/// in declaration order, so the two untagged shapes come first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamMessage {
    Error { error: String },
    SearchId { search_id: String },
    Event(StreamEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress(ProgressUpdate),
    Complete { results: Vec<ResultRecord> },
    Cancelled { results: Vec<ResultRecord> },
}

impl StreamMessage {
    /// Terminal messages close the stream after delivery.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamMessage::Error { .. }
                | StreamMessage::Event(StreamEvent::Complete { .. })
                | StreamMessage::Event(StreamEvent::Cancelled { .. })
        )
    }
}
