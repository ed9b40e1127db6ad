//! Persistence collaborator boundary
//!
//! The engine never talks to storage directly. Implementations assign ids on
//! create; the SQLite one lives in `crate::db`.

use async_trait::async_trait;

use super::error::PersistError;
use super::types::{HighlightId, HighlightRecord, NewHighlight};

#[async_trait]
pub trait HighlightPersistence: Send + Sync {
    /// Store a new highlight and return it with its assigned id
    async fn create_highlight(&self, new: &NewHighlight) -> Result<HighlightRecord, PersistError>;

    /// Delete a highlight; `Ok(false)` when it did not exist
    async fn delete_highlight(&self, id: &HighlightId) -> Result<bool, PersistError>;

    /// All highlights of a document, used once per document load
    async fn list_highlights(&self, document_id: &str) -> Result<Vec<HighlightRecord>, PersistError>;
}
