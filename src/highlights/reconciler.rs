//! Document view reconciliation
//!
//! A [`DocumentView`] is the per-view context: built when a document is
//! displayed, dropped on navigation. Every mutation goes through the store
//! and is followed by one full render from the complete record set.
//!
//! Persistence is optimistic. A commit inserts a provisional record and
//! renders before the collaborator is asked to persist it; once the
//! collaborator answers, the provisional record is either swapped for the
//! persisted one (delete + insert) or rolled back.

use super::error::{PersistError, ReconcileError, RecordError, StoreError};
use super::persistence::HighlightPersistence;
use super::renderer::{render, RenderOutput};
use super::store::HighlightStore;
use super::types::{HighlightId, HighlightRecord, NewHighlight, Segment};

const PROVISIONAL_PREFIX: &str = "pending-";

/// A locally visible highlight whose persistence is still outstanding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    provisional_id: HighlightId,
    new: NewHighlight,
}

impl PendingCommit {
    pub fn provisional_id(&self) -> &HighlightId {
        &self.provisional_id
    }

    /// Payload to hand to the persistence collaborator
    pub fn highlight(&self) -> &NewHighlight {
        &self.new
    }
}

#[derive(Debug, Clone)]
pub struct DocumentView {
    text: String,
    store: HighlightStore,
    rendered: RenderOutput,
}

impl DocumentView {
    /// Build the view for a freshly displayed document
    ///
    /// All existing records go into an empty store before a single render,
    /// so no record can be lost to an earlier partial render. Duplicate ids
    /// are logged and skipped.
    pub fn on_document_load(
        document_id: impl Into<String>,
        text: impl Into<String>,
        existing: Vec<HighlightRecord>,
    ) -> Self {
        let mut view = Self {
            text: text.into(),
            store: HighlightStore::new(document_id),
            rendered: RenderOutput::default(),
        };
        view.reload(existing);
        view
    }

    /// Fetch a document's highlights from the collaborator and build the view
    pub async fn load<P>(
        persistence: &P,
        document_id: &str,
        text: impl Into<String>,
    ) -> Result<Self, PersistError>
    where
        P: HighlightPersistence + ?Sized,
    {
        let existing = persistence.list_highlights(document_id).await?;
        Ok(Self::on_document_load(document_id, text, existing))
    }

    /// Replace every record (e.g. on re-navigation) and render once
    pub fn reload(&mut self, existing: Vec<HighlightRecord>) {
        self.store.clear();
        let rejected = self.store.extend(existing);
        if !rejected.is_empty() {
            tracing::warn!(
                "Document {}: {} highlights rejected on load",
                self.store.document_id(),
                rejected.len()
            );
        }
        self.rerender();
    }

    /// Store a committed highlight under `id` and re-render
    pub fn on_selection_committed(
        &mut self,
        new: NewHighlight,
        id: HighlightId,
    ) -> Result<&HighlightRecord, ReconcileError> {
        self.check_against_text(&new)?;
        let record = HighlightRecord::from_new(id.clone(), &new)?;
        self.insert(record)?;
        self.rerender();
        self.store
            .get(&id)
            .ok_or(ReconcileError::UnknownPending(id))
    }

    /// Remove a highlight and re-render; `false` if it was not present
    pub fn on_delete_requested(&mut self, id: &HighlightId) -> bool {
        let removed = self.store.remove(id);
        if removed {
            self.rerender();
        }
        removed
    }

    /// Show a highlight immediately under a provisional id
    pub fn begin_commit(&mut self, new: NewHighlight) -> Result<PendingCommit, ReconcileError> {
        self.check_against_text(&new)?;
        let provisional_id = HighlightId::new(format!(
            "{}{}",
            PROVISIONAL_PREFIX,
            uuid::Uuid::new_v4()
        ));
        let record = HighlightRecord::from_new(provisional_id.clone(), &new)?;
        self.insert(record)?;
        self.rerender();

        Ok(PendingCommit {
            provisional_id,
            new,
        })
    }

    /// Settle a pending commit with the collaborator's answer
    ///
    /// On success the provisional record is replaced by the persisted one;
    /// on failure it is removed and `PersistenceFailure` is returned.
    pub fn finish_commit(
        &mut self,
        pending: PendingCommit,
        outcome: Result<HighlightRecord, PersistError>,
    ) -> Result<&HighlightRecord, ReconcileError> {
        if !self.store.remove(&pending.provisional_id) {
            return Err(ReconcileError::UnknownPending(pending.provisional_id));
        }

        let record = match outcome {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    "Rolling back highlight [{}, {}): {}",
                    pending.new.start,
                    pending.new.end,
                    e
                );
                self.rerender();
                return Err(ReconcileError::PersistenceFailure(e));
            }
        };

        let id = record.id.clone();
        let inserted = self.insert(record);
        self.rerender();
        inserted?;

        self.store
            .get(&id)
            .ok_or(ReconcileError::UnknownPending(id))
    }

    /// Optimistically commit a highlight through `persistence`
    pub async fn commit_highlight<P>(
        &mut self,
        persistence: &P,
        new: NewHighlight,
    ) -> Result<HighlightRecord, ReconcileError>
    where
        P: HighlightPersistence + ?Sized,
    {
        let pending = self.begin_commit(new)?;
        let outcome = persistence.create_highlight(pending.highlight()).await;
        self.finish_commit(pending, outcome).cloned()
    }

    /// Optimistically delete a highlight through `persistence`
    ///
    /// The local record is removed and rendered away first; if the
    /// collaborator fails it is restored.
    pub async fn delete_highlight<P>(
        &mut self,
        persistence: &P,
        id: &HighlightId,
    ) -> Result<bool, ReconcileError>
    where
        P: HighlightPersistence + ?Sized,
    {
        let removed = self.store.take(id);
        if removed.is_some() {
            self.rerender();
        }

        match persistence.delete_highlight(id).await {
            Ok(found) => Ok(found || removed.is_some()),
            Err(e) => {
                if let Some(record) = removed {
                    tracing::warn!("Restoring highlight {} after failed delete: {}", id, e);
                    self.insert(record)?;
                    self.rerender();
                }
                Err(ReconcileError::PersistenceFailure(e))
            }
        }
    }

    /// A new highlight must fit the text and quote it exactly
    fn check_against_text(&self, new: &NewHighlight) -> Result<(), RecordError> {
        if new.start >= new.end {
            return Err(RecordError::EmptyRange {
                start: new.start,
                end: new.end,
            });
        }

        let text_len = self.text.chars().count();
        if new.end > text_len {
            return Err(RecordError::OutOfRange {
                start: new.start,
                end: new.end,
                text_len,
            });
        }

        let quoted = self
            .text
            .chars()
            .skip(new.start)
            .take(new.end - new.start)
            .eq(new.text.chars());
        if !quoted {
            return Err(RecordError::TextMismatch {
                start: new.start,
                end: new.end,
            });
        }

        Ok(())
    }

    fn insert(&mut self, record: HighlightRecord) -> Result<(), StoreError> {
        self.store.add(record).map_err(|e| {
            tracing::warn!("Document {}: {}", self.store.document_id(), e);
            e
        })
    }

    fn rerender(&mut self) {
        self.rendered = render(&self.text, self.store.all());
    }

    pub fn document_id(&self) -> &str {
        self.store.document_id()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn store(&self) -> &HighlightStore {
        &self.store
    }

    pub fn rendered(&self) -> &RenderOutput {
        &self.rendered
    }

    pub fn segments(&self) -> &[Segment] {
        &self.rendered.segments
    }

    /// Whether an id is a not-yet-persisted local placeholder
    pub fn is_provisional(id: &HighlightId) -> bool {
        id.as_str().starts_with(PROVISIONAL_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::highlights::types::HighlightColor;

    const TEXT: &str = "Always check the footing depth before pouring concrete.";

    #[derive(Default)]
    struct MemoryPersistence {
        records: Mutex<Vec<HighlightRecord>>,
        next_id: AtomicUsize,
        fail: AtomicBool,
    }

    impl MemoryPersistence {
        fn failing() -> Self {
            let persistence = Self::default();
            persistence.fail.store(true, Ordering::SeqCst);
            persistence
        }
    }

    #[async_trait]
    impl HighlightPersistence for MemoryPersistence {
        async fn create_highlight(
            &self,
            new: &NewHighlight,
        ) -> Result<HighlightRecord, PersistError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistError::Backend("connection refused".to_string()));
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            let record = HighlightRecord::from_new(HighlightId::new(format!("hl-{n}")), new)
                .map_err(|e| PersistError::Rejected(e.to_string()))?;
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn delete_highlight(&self, id: &HighlightId) -> Result<bool, PersistError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistError::Backend("connection refused".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| &r.id != id);
            Ok(records.len() < before)
        }

        async fn list_highlights(
            &self,
            document_id: &str,
        ) -> Result<Vec<HighlightRecord>, PersistError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.document_id == document_id)
                .cloned()
                .collect())
        }
    }

    fn new_highlight(start: usize, end: usize, color: HighlightColor) -> NewHighlight {
        NewHighlight {
            document_id: "rule-7".to_string(),
            start,
            end,
            text: TEXT.chars().skip(start).take(end - start).collect(),
            color,
        }
    }

    fn record(id: &str, start: usize, end: usize) -> HighlightRecord {
        HighlightRecord::from_new(HighlightId::from(id), &new_highlight(start, end, HighlightColor::Yellow))
            .unwrap()
    }

    #[test]
    fn test_sequential_commits_keep_earlier_highlights() {
        let mut view = DocumentView::on_document_load("rule-7", TEXT, vec![]);

        view.on_selection_committed(new_highlight(0, 12, HighlightColor::Yellow), "a".into())
            .unwrap();
        view.on_selection_committed(new_highlight(17, 30, HighlightColor::Green), "b".into())
            .unwrap();

        let annotated: Vec<_> = view.segments().iter().filter(|s| s.is_annotated()).collect();
        assert_eq!(annotated.len(), 2);
        assert!(annotated[0].has_highlight(&"a".into()));
        assert!(annotated[1].has_highlight(&"b".into()));
        assert_eq!(view.rendered().text(), TEXT);
    }

    #[test]
    fn test_delete_matches_fresh_render() {
        let mut view = DocumentView::on_document_load(
            "rule-7",
            TEXT,
            vec![record("a", 0, 20), record("b", 10, 30)],
        );

        assert!(view.on_delete_requested(&"b".into()));
        assert!(!view.on_delete_requested(&"b".into()));

        let fresh = DocumentView::on_document_load("rule-7", TEXT, vec![record("a", 0, 20)]);
        assert_eq!(view.rendered(), fresh.rendered());
    }

    #[test]
    fn test_duplicate_commit_is_rejected_without_change() {
        let mut view = DocumentView::on_document_load("rule-7", TEXT, vec![record("a", 0, 20)]);
        let before = view.rendered().clone();

        let err = view
            .on_selection_committed(new_highlight(25, 30, HighlightColor::Blue), "a".into())
            .unwrap_err();

        assert_eq!(err, ReconcileError::Store(StoreError::DuplicateId("a".into())));
        assert_eq!(view.rendered(), &before);
        assert_eq!(view.store().len(), 1);
    }

    #[test]
    fn test_commit_must_fit_and_quote_text() {
        let mut view = DocumentView::on_document_load("d", "short", vec![]);
        let before = view.rendered().clone();

        let past_end = NewHighlight {
            document_id: "d".to_string(),
            start: 2,
            end: 50,
            text: "nonsense".to_string(),
            color: HighlightColor::Yellow,
        };
        let err = view
            .on_selection_committed(past_end.clone(), "x".into())
            .unwrap_err();
        assert_eq!(
            err,
            ReconcileError::Record(RecordError::OutOfRange {
                start: 2,
                end: 50,
                text_len: 5
            })
        );

        let misquoted = NewHighlight {
            end: 5,
            text: "nope".to_string(),
            ..past_end.clone()
        };
        let err = view.begin_commit(misquoted).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::Record(RecordError::TextMismatch { start: 2, end: 5 })
        );

        assert!(view.store().is_empty());
        assert_eq!(view.rendered(), &before);
        assert!(view.rendered().is_clean());

        let quoted = NewHighlight {
            end: 5,
            text: "ort".to_string(),
            ..past_end
        };
        view.on_selection_committed(quoted, "x".into()).unwrap();
        assert_eq!(view.store().len(), 1);
    }

    #[test]
    fn test_load_is_idempotent() {
        let existing = vec![record("b", 10, 30), record("a", 0, 20), record("c", 10, 30)];

        let first = DocumentView::on_document_load("rule-7", TEXT, existing.clone());
        let mut second = DocumentView::on_document_load("rule-7", TEXT, existing.clone());
        assert_eq!(first.rendered(), second.rendered());

        second.reload(existing);
        assert_eq!(first.rendered(), second.rendered());
    }

    #[test]
    fn test_load_tolerates_bad_records() {
        let mut too_long = record("long", 0, 5);
        too_long.end = 500;

        let view = DocumentView::on_document_load(
            "rule-7",
            TEXT,
            vec![record("a", 0, 6), too_long, record("a", 7, 12)],
        );

        assert_eq!(view.store().len(), 2);
        assert_eq!(view.rendered().warnings.len(), 1);
        assert_eq!(view.rendered().text(), TEXT);
        assert!(view.segments()[0].has_highlight(&"a".into()));
    }

    #[tokio::test]
    async fn test_commit_swaps_provisional_for_persisted() {
        let persistence = MemoryPersistence::default();
        let mut view = DocumentView::on_document_load("rule-7", TEXT, vec![]);

        let pending = view
            .begin_commit(new_highlight(7, 12, HighlightColor::Green))
            .unwrap();
        assert!(DocumentView::is_provisional(pending.provisional_id()));
        assert!(view.segments()[1].has_highlight(pending.provisional_id()));

        let outcome = persistence.create_highlight(pending.highlight()).await;
        let record = view.finish_commit(pending, outcome).unwrap().clone();

        assert_eq!(record.id.as_str(), "hl-0");
        assert_eq!(view.store().len(), 1);
        assert!(view.segments()[1].has_highlight(&record.id));
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() {
        let persistence = MemoryPersistence::failing();
        let mut view = DocumentView::on_document_load("rule-7", TEXT, vec![record("a", 0, 6)]);
        let before = view.rendered().clone();

        let err = view
            .commit_highlight(&persistence, new_highlight(7, 12, HighlightColor::Blue))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::PersistenceFailure(_)));
        assert_eq!(view.rendered(), &before);
    }

    #[tokio::test]
    async fn test_failed_delete_restores_highlight() {
        let persistence = MemoryPersistence::default();
        let mut view = DocumentView::on_document_load("rule-7", TEXT, vec![]);
        let record = view
            .commit_highlight(&persistence, new_highlight(0, 6, HighlightColor::Yellow))
            .await
            .unwrap();
        let before = view.rendered().clone();

        persistence.fail.store(true, Ordering::SeqCst);
        let err = view.delete_highlight(&persistence, &record.id).await.unwrap_err();

        assert!(matches!(err, ReconcileError::PersistenceFailure(_)));
        assert_eq!(view.rendered(), &before);

        persistence.fail.store(false, Ordering::SeqCst);
        assert!(view.delete_highlight(&persistence, &record.id).await.unwrap());
        assert!(view.store().is_empty());
    }

    #[tokio::test]
    async fn test_load_from_persistence() {
        let persistence = MemoryPersistence::default();
        let mut first = DocumentView::on_document_load("rule-7", TEXT, vec![]);
        first
            .commit_highlight(&persistence, new_highlight(0, 6, HighlightColor::Yellow))
            .await
            .unwrap();
        first
            .commit_highlight(&persistence, new_highlight(3, 12, HighlightColor::Blue))
            .await
            .unwrap();

        let reopened = DocumentView::load(&persistence, "rule-7", TEXT).await.unwrap();
        assert_eq!(reopened.rendered(), first.rendered());
    }

    #[test]
    fn test_unknown_pending() {
        let mut view = DocumentView::on_document_load("rule-7", TEXT, vec![]);
        let pending = view
            .begin_commit(new_highlight(0, 6, HighlightColor::Yellow))
            .unwrap();
        let provisional = pending.provisional_id().clone();
        assert!(view.on_delete_requested(&provisional));

        let err = view.finish_commit(pending, Ok(record("z", 0, 6))).unwrap_err();
        assert_eq!(err, ReconcileError::UnknownPending(provisional));
    }
}
