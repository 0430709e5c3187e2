//! An abstraction layer for native file dialogs to enable testing.

use std::path::PathBuf;

/// Defines a common interface for file and folder selection dialogs.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
///
/// A `None` return always means the user dismissed the dialog; dialog
/// failures cannot be distinguished from cancellation for in-process
/// dialogs and are treated the same way.
pub trait DialogService: Send + Sync {
    /// Opens a dialog to select the folder to search.
    fn pick_folder(&self) -> Option<PathBuf>;

    /// Opens a dialog to select a single spreadsheet-like file to search.
    fn pick_search_file(&self) -> Option<PathBuf>;

    /// Opens a dialog to select a save location for the skip-list CSV export.
    fn export_csv_path(&self) -> Option<PathBuf>;
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_folder(&self) -> Option<PathBuf> {
        rfd::FileDialog::new().pick_folder()
    }

    fn pick_search_file(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Spreadsheet files", &["csv", "tsv", "txt"])
            .pick_file()
    }

    fn export_csv_path(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name("skipped-files.csv")
            .save_file()
    }
}
