//! Highlight engine error types
//!
//! None of these are fatal to a document view: the worst outcome is a single
//! highlight failing to render or persist while the rest stays correct.

use thiserror::Error;

use super::types::HighlightId;

/// Invalid record construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Highlight range is empty: [{start}, {end})")]
    EmptyRange { start: usize, end: usize },

    #[error("Unknown highlight color: {0}")]
    UnknownColor(String),

    #[error("Highlight range [{start}, {end}) exceeds text length {text_len}")]
    OutOfRange {
        start: usize,
        end: usize,
        text_len: usize,
    },

    #[error("Highlight text does not match the document at [{start}, {end})")]
    TextMismatch { start: usize, end: usize },
}

/// Selections that never become highlights
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Nothing but whitespace was selected
    #[error("Selection is empty")]
    Empty,

    /// Below the minimum length, treated as an accidental click
    #[error("Selection too short: {len} characters (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("Selection endpoint is outside the container")]
    OutsideContainer,

    #[error("Selection endpoint offset {offset} is out of range for its node")]
    InvalidEndpoint { offset: usize },
}

/// Store mutations that leave the store unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Duplicate highlight id: {0}")]
    DuplicateId(HighlightId),

    #[error("Highlight {id} belongs to document {found}, not {expected}")]
    WrongDocument {
        id: HighlightId,
        expected: String,
        found: String,
    },
}

/// Failures reported by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("Highlight not found: {0}")]
    NotFound(String),

    #[error("Highlight rejected: {0}")]
    Rejected(String),

    #[error("Persistence backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by a document view
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The optimistic local change has already been rolled back
    #[error("Persisting highlight failed: {0}")]
    PersistenceFailure(#[source] PersistError),

    #[error("No pending highlight with provisional id {0}")]
    UnknownPending(HighlightId),
}
