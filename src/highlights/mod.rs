//! Text-range highlight engine
//!
//! Character-offset highlights over a document's flattened plain text.
//!
//! # Components
//!
//! - `resolver`: live selection → `[start, end)` offsets
//! - `store`: per-document ordered record set, unique ids
//! - `renderer`: text + all records → lossless segment partition
//! - `reconciler`: per-view context tying the three together, with
//!   optimistic persistence through [`HighlightPersistence`]
//!
//! Store and renderer are pure and never touch markup; turning segments
//! into HTML is `crate::html`'s job.

mod error;
mod persistence;
mod reconciler;
mod renderer;
mod resolver;
mod store;
mod tree;
mod types;

pub use error::{PersistError, ReconcileError, RecordError, SelectionError, StoreError};
pub use persistence::HighlightPersistence;
pub use reconciler::{DocumentView, PendingCommit};
pub use renderer::{render, RenderOutput, RenderWarning};
pub use resolver::{
    OffsetResolver, ResolvedSelection, Selection, SelectionPoint, SelectionPrompt,
    DEFAULT_MIN_SELECTION_LEN,
};
pub use store::HighlightStore;
pub use tree::{NodeId, NodeKind, TextTree};
pub use types::{
    ActiveHighlight, HighlightColor, HighlightId, HighlightRecord, NewHighlight, Segment,
};
