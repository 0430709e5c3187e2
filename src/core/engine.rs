//! The built-in search engine. Walks folders, searches cell values of
//! delimited spreadsheet-like files, and speaks the stream protocol over a
//! tokio channel.
//!
//! Supported inputs are `.csv`, `.tsv`, and `.txt` (treated as a
//! single-column sheet). The sheet name is the file stem; cells are addressed
//! spreadsheet-style (`A1`, `B12`). Anything the engine cannot process lands
//! in the skip list with a reason.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use ignore::WalkBuilder;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use super::error::CoreError;
use super::{ProgressUpdate, ResultRecord, SearchMode, SkippedFile, StreamEvent, StreamMessage};

const DEFAULT_MAX_FILE_SIZE_MB: u64 = 20;

pub struct LocalSearchEngine {
    active: Mutex<HashMap<String, Arc<AtomicBool>>>,
    skipped: Mutex<Vec<SkippedFile>>,
    next_id: AtomicU64,
    max_file_size: u64,
}

impl Default for LocalSearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_MB)
    }
}

impl LocalSearchEngine {
    pub fn new(max_file_size_mb: u64) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            skipped: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            max_file_size: max_file_size_mb * 1024 * 1024,
        }
    }

    /// Searches one file synchronously. Unprocessable files are an error
    /// here, not a skip-list entry; the skip list belongs to folder runs.
    pub fn search_file(
        &self,
        path: &Path,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<ResultRecord>, CoreError> {
        let matcher = QueryMatcher::new(query, mode);
        match self.process_file(path, &matcher) {
            Ok(records) => Ok(records),
            Err(reason) => Err(CoreError::Request(format!(
                "Could not search {}: {}",
                path.display(),
                reason
            ))),
        }
    }

    /// Starts a streaming folder search. Returns the receiving end of the
    /// stream; the first message carries the search id usable with
    /// [`cancel`](Self::cancel).
    pub fn search_folder(
        self: &Arc<Self>,
        folder: PathBuf,
        query: String,
        mode: SearchMode,
    ) -> UnboundedReceiver<StreamMessage> {
        let (tx, rx) = unbounded_channel();
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            let search_id = format!("search-{}", engine.next_id.fetch_add(1, Ordering::Relaxed));
            let cancel_flag = Arc::new(AtomicBool::new(false));
            engine
                .active
                .lock()
                .unwrap()
                .insert(search_id.clone(), cancel_flag.clone());

            let _ = tx.send(StreamMessage::SearchId {
                search_id: search_id.clone(),
            });

            if !folder.is_dir() {
                let _ = tx.send(StreamMessage::Error {
                    error: format!("Not a folder: {}", folder.display()),
                });
                engine.active.lock().unwrap().remove(&search_id);
                return;
            }

            let files = collect_files(&folder);
            let total = files.len();
            let matcher = QueryMatcher::new(&query, mode);
            let mut results: Vec<ResultRecord> = Vec::new();
            let mut cancelled = false;

            for (index, path) in files.iter().enumerate() {
                if cancel_flag.load(Ordering::Relaxed) {
                    tracing::info!(search_id = %search_id, processed = index, "search cancelled");
                    cancelled = true;
                    break;
                }

                match engine.process_file(path, &matcher) {
                    Ok(mut records) => results.append(&mut records),
                    Err(reason) => engine.record_skip(path, reason),
                }

                let _ = tx.send(StreamMessage::Event(StreamEvent::Progress(ProgressUpdate {
                    processed: index + 1,
                    total,
                    current_file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    results_found: results.len(),
                })));

                tokio::task::yield_now().await;
            }

            let terminal = if cancelled {
                StreamEvent::Cancelled { results }
            } else {
                StreamEvent::Complete { results }
            };
            let _ = tx.send(StreamMessage::Event(terminal));
            engine.active.lock().unwrap().remove(&search_id);
        });

        rx
    }

    /// Flags an active search for cancellation. The stream still terminates
    /// with a `cancelled` message carrying partial results.
    pub fn cancel(&self, search_id: &str) -> Result<(), CoreError> {
        match self.active.lock().unwrap().get(search_id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                Ok(())
            }
            None => Err(CoreError::Cancel),
        }
    }

    pub fn skip_list(&self) -> Vec<SkippedFile> {
        self.skipped.lock().unwrap().clone()
    }

    pub fn clear_skip_list(&self) {
        self.skipped.lock().unwrap().clear();
    }

    /// Cancels everything in flight and clears the skip list.
    pub fn restart(&self) {
        let mut active = self.active.lock().unwrap();
        for flag in active.values() {
            flag.store(true, Ordering::Relaxed);
        }
        active.clear();
        drop(active);
        self.clear_skip_list();
        tracing::info!("search engine restarted");
    }

    fn record_skip(&self, path: &Path, reason: String) {
        let directory = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.skipped.lock().unwrap().push(SkippedFile {
            directory,
            file,
            path: path.to_string_lossy().into_owned(),
            reason,
        });
    }

    /// Parses and searches one file. `Err` carries a human-readable skip
    /// reason.
    fn process_file(
        &self,
        path: &Path,
        matcher: &QueryMatcher,
    ) -> Result<Vec<ResultRecord>, String> {
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Some(','),
            Some("tsv") => Some('\t'),
            Some("txt") => None,
            _ => return Err("Unsupported file type".to_string()),
        };

        let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
        if metadata.len() > self.max_file_size {
            return Err("File too large".to_string());
        }

        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sheet = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filepath = path.to_string_lossy().into_owned();

        let mut records = Vec::new();
        for (row_index, line) in content.lines().enumerate() {
            let cells = match delimiter {
                Some(d) => split_delimited(line, d),
                None => vec![line.to_string()],
            };
            for (col_index, value) in cells.into_iter().enumerate() {
                if matcher.matches(&value) {
                    records.push(ResultRecord {
                        filename: filename.clone(),
                        filepath: filepath.clone(),
                        sheet: sheet.clone(),
                        cell: format!("{}{}", column_letters(col_index), row_index + 1),
                        kind: classify_value(&value),
                        value,
                    });
                }
            }
        }
        Ok(records)
    }
}

/// Walks a folder recursively, honoring ignore files, and returns regular
/// files in walk order.
fn collect_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkBuilder::new(folder).follow_links(false).build().flatten() {
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Spreadsheet column letters for a zero-based index: 0 = A, 25 = Z, 26 = AA.
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Splits one delimited line into fields, honoring double-quoted fields with
/// doubled internal quotes.
fn split_delimited(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

fn is_year(token: &str) -> bool {
    token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) && token.starts_with(['1', '2'])
}

fn is_date_token(token: &str) -> bool {
    let t = token.trim_matches(|c: char| c == ',' || c == '.');
    if is_year(t) {
        return true;
    }
    let upper = t.to_uppercase();
    if let Some(rest) = upper.strip_prefix("FY") {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }
    if matches!(upper.as_str(), "Q1" | "Q2" | "Q3" | "Q4") {
        return true;
    }
    chrono::NaiveDate::parse_from_str(t, "%Y-%m-%d").is_ok()
        || chrono::NaiveDate::parse_from_str(t, "%m/%d/%Y").is_ok()
        || chrono::NaiveDate::parse_from_str(t, "%d.%m.%Y").is_ok()
}

fn is_monetary_token(token: &str) -> bool {
    let t = token.trim();
    match t.strip_prefix('$') {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| matches!(c, '0'..='9' | ',' | '.')),
        None => false,
    }
}

fn is_budget_code_token(token: &str) -> bool {
    let t = token.trim();
    t.len() > 2
        && t.starts_with('(')
        && t.ends_with(')')
        && t[1..t.len() - 1].chars().all(|c| c.is_ascii_digit())
}

/// Classifies a cell value for display glyph selection.
pub fn classify_value(value: &str) -> super::ValueKind {
    let t = value.trim();
    if is_monetary_token(t) {
        super::ValueKind::Monetary
    } else if is_budget_code_token(t) {
        super::ValueKind::BudgetCode
    } else if is_date_token(t) {
        super::ValueKind::Date
    } else {
        super::ValueKind::Plain
    }
}

/// A compiled query: lowercased terms plus the match mode.
struct QueryMatcher {
    mode: SearchMode,
    phrase: String,
    terms: Vec<String>,
}

impl QueryMatcher {
    fn new(query: &str, mode: SearchMode) -> Self {
        let phrase = query.trim().to_lowercase();
        let terms = match mode {
            // Natural-language queries drop recognized date, monetary, and
            // budget-code tokens and require all remaining terms. If nothing
            // remains, all original terms are kept.
            SearchMode::Nlp => {
                let kept: Vec<String> = phrase
                    .split_whitespace()
                    .filter(|t| {
                        !is_date_token(t) && !is_monetary_token(t) && !is_budget_code_token(t)
                    })
                    .map(str::to_string)
                    .collect();
                if kept.is_empty() {
                    phrase.split_whitespace().map(str::to_string).collect()
                } else {
                    kept
                }
            }
            _ => phrase.split_whitespace().map(str::to_string).collect(),
        };
        Self {
            mode,
            phrase,
            terms,
        }
    }

    fn matches(&self, value: &str) -> bool {
        if self.phrase.is_empty() {
            return false;
        }
        let haystack = value.to_lowercase();
        match self.mode {
            SearchMode::Exact => haystack.contains(&self.phrase),
            SearchMode::Any => self.terms.iter().any(|t| haystack.contains(t)),
            SearchMode::All | SearchMode::Nlp => self.terms.iter().all(|t| haystack.contains(t)),
        }
    }
}
