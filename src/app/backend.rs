//! The search service boundary.
//!
//! Command handlers and the stream consumer talk to this trait only, never
//! to the engine directly, so tests can substitute a scripted mock and the
//! production engine stays swappable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::{
    CoreError, LocalSearchEngine, ResultRecord, SearchMode, SkippedFile, StreamMessage,
};

/// The receiving end of a folder-search stream. Messages arrive in protocol
/// order; the channel closes after the terminal message (or on transport
/// failure, without one).
pub type SearchStream = UnboundedReceiver<StreamMessage>;

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Single-file search, request/response.
    async fn search_file(
        &self,
        path: &Path,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<ResultRecord>, CoreError>;

    /// Starts a streaming folder search and returns its stream immediately.
    fn search_folder(&self, folder: PathBuf, query: String, mode: SearchMode) -> SearchStream;

    /// Requests cancellation of the identified search.
    async fn cancel(&self, search_id: &str) -> Result<(), CoreError>;

    async fn skip_list(&self) -> Result<Vec<SkippedFile>, CoreError>;

    async fn clear_skip_list(&self) -> Result<(), CoreError>;

    /// Resets the service: cancels in-flight searches and clears the skip list.
    async fn restart(&self) -> Result<(), CoreError>;
}

/// Production implementation backed by the built-in engine.
pub struct LocalSearchService {
    engine: Arc<LocalSearchEngine>,
}

impl LocalSearchService {
    pub fn new(max_file_size_mb: u64) -> Self {
        Self {
            engine: Arc::new(LocalSearchEngine::new(max_file_size_mb)),
        }
    }
}

#[async_trait]
impl SearchService for LocalSearchService {
    async fn search_file(
        &self,
        path: &Path,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<ResultRecord>, CoreError> {
        let engine = self.engine.clone();
        let path = path.to_path_buf();
        let query = query.to_string();
        // File parsing is blocking I/O; keep it off the async workers.
        tokio::task::spawn_blocking(move || engine.search_file(&path, &query, mode)).await?
    }

    fn search_folder(&self, folder: PathBuf, query: String, mode: SearchMode) -> SearchStream {
        self.engine.search_folder(folder, query, mode)
    }

    async fn cancel(&self, search_id: &str) -> Result<(), CoreError> {
        self.engine.cancel(search_id)
    }

    async fn skip_list(&self) -> Result<Vec<SkippedFile>, CoreError> {
        Ok(self.engine.skip_list())
    }

    async fn clear_skip_list(&self) -> Result<(), CoreError> {
        self.engine.clear_skip_list();
        Ok(())
    }

    async fn restart(&self) -> Result<(), CoreError> {
        self.engine.restart();
        Ok(())
    }
}
