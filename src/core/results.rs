//! The grouped result presentation engine.
//!
//! Rendering is a pure projection of `records + SortState + FilterState` into
//! a flat list of table rows. The UI never feeds displayed text back into
//! sorting or filtering; the record list is the single source of truth and a
//! new projection is computed whenever sort or filter state changes.

use serde::Serialize;

use super::{ResultRecord, ValueKind};

/// Single-column sort state. `column == -1` means unsorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: i32,
    pub direction: i8,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: -1,
            direction: 1,
        }
    }
}

impl SortState {
    /// Clicking the same column twice toggles direction; a new column resets
    /// to ascending.
    pub fn toggle(&mut self, column: i32) {
        if self.column == column {
            self.direction = -self.direction;
        } else {
            self.column = column;
            self.direction = 1;
        }
    }
}

/// Which column a substring filter is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterColumn {
    All,
    Filename,
    Sheet,
    Cell,
    Value,
}

/// Live filter state. Reset whenever a new result set arrives.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub text: String,
    pub column: FilterColumn,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            text: String::new(),
            column: FilterColumn::All,
        }
    }
}

/// One row of the projected results table.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum TableRow {
    /// Group header: the file name doubles as an open-file action.
    Header {
        filename: String,
        filepath: String,
        match_count: usize,
        label: String,
        visible: bool,
    },
    Data {
        /// Display cells in column order: filename slot (blank, the header
        /// carries it), sheet, cell, formatted value.
        cells: [String; 4],
        visible: bool,
    },
    Separator {
        visible: bool,
    },
}

impl TableRow {
    pub fn is_visible(&self) -> bool {
        match self {
            TableRow::Header { visible, .. }
            | TableRow::Data { visible, .. }
            | TableRow::Separator { visible } => *visible,
        }
    }
}

/// The complete projection handed to the UI.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ResultsTable {
    pub rows: Vec<TableRow>,
    pub total_data_rows: usize,
    pub visible_data_rows: usize,
}

impl ResultsTable {
    /// `true` when the results area should be hidden entirely (no records at
    /// all — an empty result set never renders a zero-state row).
    pub fn is_empty(&self) -> bool {
        self.total_data_rows == 0
    }

    /// `true` when a "no matching results" notice should be shown: there are
    /// records, but the active filter hides every data row.
    pub fn no_matches(&self) -> bool {
        self.total_data_rows > 0 && self.visible_data_rows == 0
    }
}

/// Formats a cell value with its classification glyph.
pub fn display_value(record: &ResultRecord) -> String {
    match record.kind {
        ValueKind::Date => format!("\u{1F4C5} {}", record.value),
        ValueKind::Monetary => format!("\u{1F4B0} {}", record.value),
        ValueKind::BudgetCode => format!("\u{1F3F7}\u{FE0F} {}", record.value),
        ValueKind::Plain => record.value.clone(),
    }
}

fn sort_key(record: &ResultRecord, column: i32) -> String {
    let raw = match column {
        0 => record.filename.as_str(),
        1 => record.sheet.as_str(),
        2 => record.cell.as_str(),
        _ => record.value.as_str(),
    };
    raw.trim().to_lowercase()
}

fn matches_filter(record: &ResultRecord, filter: &FilterState) -> bool {
    if filter.text.is_empty() {
        return true;
    }
    let needle = filter.text.to_lowercase();
    let haystack = match filter.column {
        FilterColumn::All => format!(
            "{} {} {} {}",
            record.filename,
            record.sheet,
            record.cell,
            display_value(record)
        ),
        FilterColumn::Filename => record.filename.clone(),
        FilterColumn::Sheet => record.sheet.clone(),
        FilterColumn::Cell => record.cell.clone(),
        FilterColumn::Value => display_value(record),
    };
    haystack.to_lowercase().contains(&needle)
}

/// Projects records plus sort/filter state into renderable rows.
///
/// Sorting orders the data rows globally by the column key and then re-groups
/// by filename in order of first appearance in the sorted sequence, so a
/// header always precedes exactly its own rows. Group headers and separators
/// never participate in the ordering themselves. A group's header and its
/// trailing separator are hidden exactly when the group has no visible data
/// rows after filtering.
pub fn project(records: &[ResultRecord], sort: &SortState, filter: &FilterState) -> ResultsTable {
    if records.is_empty() {
        return ResultsTable::default();
    }

    let mut ordered: Vec<&ResultRecord> = records.iter().collect();
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

    // Group by filename, preserving first-seen order of the (possibly sorted)
    // sequence. Within a group, record order equals the sequence's relative
    // order.
    let mut groups: Vec<(String, Vec<&ResultRecord>)> = Vec::new();
    for record in ordered {
        match groups.iter_mut().find(|(name, _)| *name == record.filename) {
            Some((_, members)) => members.push(record),
            None => groups.push((record.filename.clone(), vec![record])),
        }
    }

    let mut table = ResultsTable::default();
    let group_count = groups.len();
    for (group_index, (filename, members)) in groups.into_iter().enumerate() {
        let visibility: Vec<bool> = members.iter().map(|r| matches_filter(r, filter)).collect();
        let group_visible = visibility.iter().any(|v| *v);

        let label = format!(
            "{} match{}",
            members.len(),
            if members.len() == 1 { "" } else { "es" }
        );
        table.rows.push(TableRow::Header {
            filename: filename.clone(),
            filepath: members[0].filepath.clone(),
            match_count: members.len(),
            label,
            visible: group_visible,
        });

        for (record, visible) in members.iter().zip(visibility) {
            table.total_data_rows += 1;
            if visible {
                table.visible_data_rows += 1;
            }
            table.rows.push(TableRow::Data {
                cells: [
                    String::new(),
                    record.sheet.clone(),
                    record.cell.clone(),
                    display_value(record),
                ],
                visible,
            });
        }

        // Separator between groups, never after the last one.
        if group_index + 1 < group_count {
            table.rows.push(TableRow::Separator {
                visible: group_visible,
            });
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(filename: &str, sheet: &str, cell: &str, value: &str) -> ResultRecord {
        ResultRecord {
            filename: filename.to_string(),
            filepath: format!("/data/{filename}"),
            sheet: sheet.to_string(),
            cell: cell.to_string(),
            value: value.to_string(),
            kind: ValueKind::Plain,
        }
    }

    fn sample_set() -> Vec<ResultRecord> {
        vec![
            record("budget.csv", "budget", "A1", "travel"),
            record("budget.csv", "budget", "B3", "$500"),
            record("report.csv", "report", "C2", "travel"),
            record("budget.csv", "budget", "D4", "misc"),
            record("notes.txt", "notes", "A2", "travel budget"),
        ]
    }

    fn data_rows(table: &ResultsTable) -> Vec<&TableRow> {
        table
            .rows
            .iter()
            .filter(|r| matches!(r, TableRow::Data { .. }))
            .collect()
    }

    fn visible_cells(table: &ResultsTable) -> Vec<[String; 4]> {
        table
            .rows
            .iter()
            .filter_map(|r| match r {
                TableRow::Data { cells, visible } if *visible => Some(cells.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_input_projects_nothing() {
        let table = project(&[], &SortState::default(), &FilterState::default());
        assert!(table.is_empty());
        assert!(table.rows.is_empty());
        assert!(!table.no_matches());
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let table = project(&sample_set(), &SortState::default(), &FilterState::default());

        let headers: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|r| match r {
                TableRow::Header { filename, .. } => Some(filename.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(headers, vec!["budget.csv", "report.csv", "notes.txt"]);

        // 5 data rows, 3 headers, 2 separators (none trailing).
        assert_eq!(table.total_data_rows, 5);
        assert_eq!(data_rows(&table).len(), 5);
        let separators = table
            .rows
            .iter()
            .filter(|r| matches!(r, TableRow::Separator { .. }))
            .count();
        assert_eq!(separators, 2);
        assert!(!matches!(table.rows.last(), Some(TableRow::Separator { .. })));
    }

    #[test]
    fn header_carries_pluralized_match_count() {
        let table = project(&sample_set(), &SortState::default(), &FilterState::default());
        let labels: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|r| match r {
                TableRow::Header { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["3 matches", "1 match", "1 match"]);
    }

    #[test]
    fn empty_filter_shows_every_row() {
        let table = project(&sample_set(), &SortState::default(), &FilterState::default());
        assert_eq!(table.visible_data_rows, 5);
        assert!(table.rows.iter().all(|r| r.is_visible()));
    }

    #[test]
    fn filter_hides_headerless_groups() {
        let filter = FilterState {
            text: "$500".into(),
            column: FilterColumn::Value,
        };
        let table = project(&sample_set(), &SortState::default(), &filter);
        assert_eq!(table.visible_data_rows, 1);

        // Only budget.csv keeps its header; its trailing separator stays too.
        let visible_headers: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|r| match r {
                TableRow::Header {
                    filename,
                    visible: true,
                    ..
                } => Some(filename.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(visible_headers, vec!["budget.csv"]);
    }

    #[test]
    fn filter_scoped_to_filename_uses_record_model() {
        let filter = FilterState {
            text: "report".into(),
            column: FilterColumn::Filename,
        };
        let table = project(&sample_set(), &SortState::default(), &filter);
        assert_eq!(table.visible_data_rows, 1);
        assert_eq!(visible_cells(&table)[0][2], "C2");
    }

    #[test]
    fn no_matches_notice_flags_and_clears() {
        let mut filter = FilterState {
            text: "zzz-nothing".into(),
            column: FilterColumn::All,
        };
        let table = project(&sample_set(), &SortState::default(), &filter);
        assert!(table.no_matches());

        filter.text.clear();
        let table = project(&sample_set(), &SortState::default(), &filter);
        assert!(!table.no_matches());
    }

    #[test]
    fn sort_toggle_round_trips() {
        let records = sample_set();
        let mut sort = SortState::default();

        sort.toggle(3); // value column, ascending
        let first = visible_cells(&project(&records, &sort, &FilterState::default()));

        sort.toggle(3); // same column, descending
        let second = visible_cells(&project(&records, &sort, &FilterState::default()));
        let mut reversed = first.clone();
        reversed.reverse();
        assert_eq!(second, reversed);

        sort.toggle(3); // third click matches the first order again
        let third = visible_cells(&project(&records, &sort, &FilterState::default()));
        assert_eq!(third, first);
    }

    #[test]
    fn switching_sort_column_resets_to_ascending() {
        let mut sort = SortState::default();
        sort.toggle(3);
        sort.toggle(3);
        assert_eq!(sort.direction, -1);
        sort.toggle(1);
        assert_eq!(sort.column, 1);
        assert_eq!(sort.direction, 1);
    }

    #[test]
    fn sort_regroups_so_headers_precede_their_rows() {
        let mut sort = SortState::default();
        sort.toggle(3);
        let table = project(&sample_set(), &sort, &FilterState::default());

        // Walk the rows: every data row must belong to the most recent header.
        let mut current: Option<&str> = None;
        let mut seen: Vec<&str> = Vec::new();
        for row in &table.rows {
            match row {
                TableRow::Header { filename, .. } => {
                    assert!(!seen.contains(&filename.as_str()), "group split by sort");
                    seen.push(filename);
                    current = Some(filename);
                }
                TableRow::Data { .. } => assert!(current.is_some()),
                TableRow::Separator { .. } => {}
            }
        }
        assert_eq!(table.total_data_rows, 5);
    }

    #[test]
    fn sort_compares_trimmed_lowercased_text() {
        let records = vec![
            record("a.csv", "s", "A1", "  Zebra"),
            record("a.csv", "s", "A2", "apple"),
        ];
        let mut sort = SortState::default();
        sort.toggle(3);
        let cells = visible_cells(&project(&records, &sort, &FilterState::default()));
        assert_eq!(cells[0][3], "apple");
        assert_eq!(cells[1][3], "  Zebra");
    }

    #[test]
    fn glyph_prefixes_apply_per_value_kind() {
        let mut r = record("a.csv", "s", "A1", "2024-01-01");
        r.kind = ValueKind::Date;
        assert!(display_value(&r).starts_with('\u{1F4C5}'));
        r.kind = ValueKind::Monetary;
        assert!(display_value(&r).starts_with('\u{1F4B0}'));
        r.kind = ValueKind::BudgetCode;
        assert!(display_value(&r).starts_with('\u{1F3F7}'));
        r.kind = ValueKind::Plain;
        assert_eq!(display_value(&r), "2024-01-01");
    }

    #[test]
    fn scenario_25_records_4_files() {
        let mut records = Vec::new();
        for (i, name) in ["q1.csv", "q2.csv", "q3.csv", "q4.csv"]
            .iter()
            .cycle()
            .take(25)
            .enumerate()
        {
            records.push(record(name, "sheet", &format!("A{}", i + 1), "v"));
        }
        let table = project(&records, &SortState::default(), &FilterState::default());
        let headers = table
            .rows
            .iter()
            .filter(|r| matches!(r, TableRow::Header { .. }))
            .count();
        let separators = table
            .rows
            .iter()
            .filter(|r| matches!(r, TableRow::Separator { .. }))
            .count();
        assert_eq!(headers, 4);
        assert_eq!(table.total_data_rows, 25);
        assert_eq!(separators, 3);
    }

    proptest! {
        /// Tightening the filter string never reveals rows: the visible set
        /// under `f1 + suffix` is a subset of the visible set under `f1`.
        #[test]
        fn filter_is_a_monotone_restriction(
            prefix in "[a-z]{0,3}",
            suffix in "[a-z]{1,3}",
        ) {
            let records = sample_set();
            let loose = FilterState { text: prefix.clone(), column: FilterColumn::All };
            let tight = FilterState { text: format!("{prefix}{suffix}"), column: FilterColumn::All };

            let loose_visible: Vec<bool> = project(&records, &SortState::default(), &loose)
                .rows
                .iter()
                .filter_map(|r| match r {
                    TableRow::Data { visible, .. } => Some(*visible),
                    _ => None,
                })
                .collect();
            let tight_visible: Vec<bool> = project(&records, &SortState::default(), &tight)
                .rows
                .iter()
                .filter_map(|r| match r {
                    TableRow::Data { visible, .. } => Some(*visible),
                    _ => None,
                })
                .collect();

            for (loose_v, tight_v) in loose_visible.iter().zip(&tight_visible) {
                prop_assert!(!(*tight_v && !loose_v));
            }
        }
    }
}
