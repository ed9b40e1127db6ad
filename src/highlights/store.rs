//! Per-document highlight store
//!
//! The authoritative set of highlights for one document view. Records are
//! kept sorted by `(start, end, id)` so iteration order is offset order no
//! matter how records were inserted. Overlaps are left alone; resolving them
//! is the renderer's job.

use super::error::StoreError;
use super::types::{HighlightId, HighlightRecord};

#[derive(Debug, Clone)]
pub struct HighlightStore {
    document_id: String,
    records: Vec<HighlightRecord>,
}

impl HighlightStore {
    /// Create an empty store for a document
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            records: Vec::new(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Insert a record, keeping offset order
    ///
    /// Fails without touching the store if the id is already present or the
    /// record belongs to another document.
    pub fn add(&mut self, record: HighlightRecord) -> Result<(), StoreError> {
        if record.document_id != self.document_id {
            return Err(StoreError::WrongDocument {
                id: record.id,
                expected: self.document_id.clone(),
                found: record.document_id,
            });
        }
        if self.contains(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }

        let pos = self
            .records
            .partition_point(|r| r.sort_key() < record.sort_key());
        self.records.insert(pos, record);
        Ok(())
    }

    /// Insert many records, returning the ones that were rejected
    ///
    /// Unlike repeated `add` calls that stop at the first error, every
    /// acceptable record lands in the store.
    pub fn extend<I>(&mut self, records: I) -> Vec<StoreError>
    where
        I: IntoIterator<Item = HighlightRecord>,
    {
        let mut rejected = Vec::new();
        for record in records {
            if let Err(e) = self.add(record) {
                tracing::warn!("Skipping highlight on load: {}", e);
                rejected.push(e);
            }
        }
        rejected
    }

    /// Remove by id; returns whether anything was removed
    pub fn remove(&mut self, id: &HighlightId) -> bool {
        self.take(id).is_some()
    }

    /// Remove by id and hand back the removed record
    pub fn take(&mut self, id: &HighlightId) -> Option<HighlightRecord> {
        let pos = self.records.iter().position(|r| &r.id == id)?;
        Some(self.records.remove(pos))
    }

    pub fn get(&self, id: &HighlightId) -> Option<&HighlightRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &HighlightId) -> bool {
        self.get(id).is_some()
    }

    /// All records, ascending by `(start, end)` with ties broken by id
    pub fn all(&self) -> &[HighlightRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &HighlightRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::types::HighlightColor;

    fn record(id: &str, start: usize, end: usize) -> HighlightRecord {
        HighlightRecord::new(
            HighlightId::from(id),
            "doc-1",
            start,
            end,
            HighlightColor::Yellow,
            "",
        )
        .unwrap()
    }

    fn ids(store: &HighlightStore) -> Vec<&str> {
        store.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_add_keeps_offset_order() {
        let mut store = HighlightStore::new("doc-1");
        store.add(record("c", 10, 20)).unwrap();
        store.add(record("a", 0, 5)).unwrap();
        store.add(record("b", 0, 3)).unwrap();
        store.add(record("d", 10, 20)).unwrap();

        assert_eq!(ids(&store), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_duplicate_id_leaves_store_unchanged() {
        let mut store = HighlightStore::new("doc-1");
        store.add(record("a", 0, 5)).unwrap();

        let err = store.add(record("a", 7, 9)).unwrap_err();

        assert_eq!(err, StoreError::DuplicateId(HighlightId::from("a")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&HighlightId::from("a")).unwrap().start, 0);
    }

    #[test]
    fn test_rejects_other_documents() {
        let mut store = HighlightStore::new("doc-2");
        let err = store.add(record("a", 0, 5)).unwrap_err();

        assert!(matches!(err, StoreError::WrongDocument { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = HighlightStore::new("doc-1");
        store.add(record("a", 0, 5)).unwrap();

        assert!(store.remove(&HighlightId::from("a")));
        assert!(!store.remove(&HighlightId::from("a")));
        assert!(!store.remove(&HighlightId::from("missing")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_extend_reports_duplicates_and_keeps_the_rest() {
        let mut store = HighlightStore::new("doc-1");
        let rejected = store.extend(vec![
            record("a", 0, 5),
            record("a", 1, 2),
            record("b", 3, 9),
        ]);

        assert_eq!(rejected, vec![StoreError::DuplicateId(HighlightId::from("a"))]);
        assert_eq!(ids(&store), vec!["a", "b"]);
    }
}
