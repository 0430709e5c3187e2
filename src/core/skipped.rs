//! The skipped-files report: a grouped table of files the engine could not
//! process, plus CSV export of the raw list.
//!
//! Mirrors the results projection but groups by directory, and unlike the
//! results table an empty skip list still renders a single placeholder row.

use serde::Serialize;

use super::results::{FilterColumn, FilterState, SortState};
use super::SkippedFile;

pub const EMPTY_PLACEHOLDER: &str = "No files were skipped during the search.";

/// One row of the projected skipped-files table.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum SkippedRow {
    Header {
        directory: String,
        file_count: usize,
        label: String,
        visible: bool,
    },
    Data {
        /// Display cells in column order: filename, directory, reason.
        cells: [String; 3],
        path: String,
        visible: bool,
    },
    Separator {
        visible: bool,
    },
    /// Spans all columns; emitted only for an empty skip list.
    Placeholder {
        text: String,
    },
}

impl SkippedRow {
    pub fn is_visible(&self) -> bool {
        match self {
            SkippedRow::Header { visible, .. }
            | SkippedRow::Data { visible, .. }
            | SkippedRow::Separator { visible } => *visible,
            SkippedRow::Placeholder { .. } => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SkippedTable {
    pub rows: Vec<SkippedRow>,
    pub total_data_rows: usize,
    pub visible_data_rows: usize,
}

impl SkippedTable {
    pub fn no_matches(&self) -> bool {
        self.total_data_rows > 0 && self.visible_data_rows == 0
    }
}

fn sort_key(record: &SkippedFile, column: i32) -> String {
    let raw = match column {
        0 => record.file.as_str(),
        1 => record.directory.as_str(),
        _ => record.reason.as_str(),
    };
    raw.trim().to_lowercase()
}

fn matches_filter(record: &SkippedFile, filter: &FilterState) -> bool {
    if filter.text.is_empty() {
        return true;
    }
    let needle = filter.text.to_lowercase();
    let haystack = match filter.column {
        // The filename scope deliberately also matches the directory path so
        // that typing a folder name narrows to that folder's files.
        FilterColumn::Filename => format!("{} {}", record.file, record.directory),
        FilterColumn::Value => record.reason.clone(),
        _ => format!("{} {} {}", record.file, record.directory, record.reason),
    };
    haystack.to_lowercase().contains(&needle)
}

/// Projects the skip list plus sort/filter state into renderable rows.
pub fn project(records: &[SkippedFile], sort: &SortState, filter: &FilterState) -> SkippedTable {
    if records.is_empty() {
        return SkippedTable {
            rows: vec![SkippedRow::Placeholder {
                text: EMPTY_PLACEHOLDER.to_string(),
            }],
            ..Default::default()
        };
    }

    let mut ordered: Vec<&SkippedFile> = records.iter().collect();
    if sort.column >= 0 {
        ordered.sort_by(|a, b| {
            let cmp = sort_key(a, sort.column).cmp(&sort_key(b, sort.column));
            if sort.direction < 0 {
                cmp.reverse()
            } else {
                cmp
            }
        });
    }

    let mut groups: Vec<(String, Vec<&SkippedFile>)> = Vec::new();
    for record in ordered {
        match groups
            .iter_mut()
            .find(|(dir, _)| *dir == record.directory)
        {
            Some((_, members)) => members.push(record),
            None => groups.push((record.directory.clone(), vec![record])),
        }
    }

    let mut table = SkippedTable::default();
    let group_count = groups.len();
    for (group_index, (directory, members)) in groups.into_iter().enumerate() {
        let visibility: Vec<bool> = members.iter().map(|r| matches_filter(r, filter)).collect();
        let group_visible = visibility.iter().any(|v| *v);

        let label = format!(
            "{} file{} skipped",
            members.len(),
            if members.len() == 1 { "" } else { "s" }
        );
        table.rows.push(SkippedRow::Header {
            directory,
            file_count: members.len(),
            label,
            visible: group_visible,
        });

        for (record, visible) in members.iter().zip(visibility) {
            table.total_data_rows += 1;
            if visible {
                table.visible_data_rows += 1;
            }
            table.rows.push(SkippedRow::Data {
                cells: [
                    record.file.clone(),
                    record.directory.clone(),
                    record.reason.clone(),
                ],
                path: record.path.clone(),
                visible,
            });
        }

        if group_index + 1 < group_count {
            table.rows.push(SkippedRow::Separator {
                visible: group_visible,
            });
        }
    }

    table
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Serializes the skip list as CSV. Every field is quoted; embedded quotes
/// are doubled. Row order follows the grouped (unsorted, unfiltered)
/// presentation order.
pub fn export_skip_list_csv(records: &[SkippedFile]) -> String {
    let mut out = String::from("Path,File Name,Error Reason\n");
    let table = project(records, &SortState::default(), &FilterState::default());
    for row in &table.rows {
        if let SkippedRow::Data { cells, path, .. } = row {
            out.push_str(&csv_field(path));
            out.push(',');
            out.push_str(&csv_field(&cells[0]));
            out.push(',');
            out.push_str(&csv_field(&cells[2]));
            out.push('\n');
        }
    }
    out
}
