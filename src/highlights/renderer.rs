//! Segment renderer
//!
//! Partitions a document's text at every highlight boundary and tags each
//! atomic sub-range with the full set of highlights covering it. The output
//! is always rebuilt from the complete record set, so overlapping and
//! touching highlights never clobber each other, and removing a record and
//! rendering again gives exactly what rendering without it would have.
//!
//! Concatenating the segment texts reproduces the input text.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use super::types::{ActiveHighlight, HighlightId, HighlightRecord, Segment};

/// Records skipped during a render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderWarning {
    #[error("Highlight {id} range [{start}, {end}) does not fit text of length {text_len}")]
    OutOfBounds {
        id: HighlightId,
        start: usize,
        end: usize,
        text_len: usize,
    },
}

/// Result of a render pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub segments: Vec<Segment>,
    pub warnings: Vec<RenderWarning>,
}

impl RenderOutput {
    /// Concatenated segment text
    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }

    /// Whether every record made it into the output
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Segments carrying the given highlight
    pub fn segments_for<'a>(&'a self, id: &'a HighlightId) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.has_highlight(id))
    }
}

/// Boundary events at one offset, as indices into the sorted record list
#[derive(Default)]
struct Boundary {
    opens: Vec<usize>,
    closes: Vec<usize>,
}

/// Render `text` with every record in `records`
///
/// Records may arrive in any order. Records that do not fit the text are
/// left out and reported in [`RenderOutput::warnings`]; the rest of the
/// document still renders.
pub fn render(text: &str, records: &[HighlightRecord]) -> RenderOutput {
    // Byte position of every char index, plus one past the end
    let mut byte_at: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    byte_at.push(text.len());
    let text_len = byte_at.len() - 1;

    let mut warnings = Vec::new();
    let mut valid: Vec<&HighlightRecord> = Vec::with_capacity(records.len());
    for record in records {
        if record.fits(text_len) {
            valid.push(record);
        } else {
            tracing::warn!(
                "Excluding highlight {} [{}, {}) from render: text length is {}",
                record.id,
                record.start,
                record.end,
                text_len
            );
            warnings.push(RenderWarning::OutOfBounds {
                id: record.id.clone(),
                start: record.start,
                end: record.end,
                text_len,
            });
        }
    }
    valid.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut boundaries: BTreeMap<usize, Boundary> = BTreeMap::new();
    boundaries.entry(0).or_default();
    boundaries.entry(text_len).or_default();
    for (idx, record) in valid.iter().enumerate() {
        boundaries.entry(record.start).or_default().opens.push(idx);
        boundaries.entry(record.end).or_default().closes.push(idx);
    }

    // Sweep left to right; indices keep the active set in record order
    let mut active: BTreeSet<usize> = BTreeSet::new();
    let mut segments = Vec::with_capacity(boundaries.len());
    let mut points = boundaries.into_iter().peekable();

    while let Some((a, events)) = points.next() {
        for idx in &events.closes {
            active.remove(idx);
        }
        active.extend(events.opens.iter().copied());

        let Some(&(b, _)) = points.peek() else {
            break;
        };

        let slice = text[byte_at[a]..byte_at[b]].to_string();
        if active.is_empty() {
            segments.push(Segment::Plain {
                start: a,
                end: b,
                text: slice,
            });
        } else {
            segments.push(Segment::Annotated {
                start: a,
                end: b,
                text: slice,
                active: active.iter().map(|&i| ActiveHighlight::from(valid[i])).collect(),
            });
        }
    }

    tracing::debug!(
        "Rendered {} segments from {} highlights ({} skipped)",
        segments.len(),
        valid.len(),
        warnings.len()
    );

    RenderOutput { segments, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::store::HighlightStore;
    use crate::highlights::types::HighlightColor;

    fn record(id: &str, start: usize, end: usize, color: HighlightColor) -> HighlightRecord {
        HighlightRecord::new(HighlightId::from(id), "doc", start, end, color, "").unwrap()
    }

    fn active_ids(segment: &Segment) -> Vec<&str> {
        segment.active().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_no_highlights_is_one_plain_segment() {
        let output = render("plain text", &[]);

        assert_eq!(output.segments.len(), 1);
        assert_eq!(
            output.segments[0],
            Segment::Plain {
                start: 0,
                end: 10,
                text: "plain text".to_string()
            }
        );
    }

    #[test]
    fn test_empty_text_has_no_segments() {
        let output = render("", &[]);
        assert!(output.segments.is_empty());
        assert!(output.is_clean());
    }

    #[test]
    fn test_overlap_preserves_both_highlights() {
        let text = "abcdefghijklmnopqrst";
        let a = record("A", 0, 10, HighlightColor::Yellow);
        let b = record("B", 5, 15, HighlightColor::Green);

        let output = render(text, &[b, a]);

        let ranges: Vec<_> = output.segments.iter().map(Segment::range).collect();
        assert_eq!(ranges, vec![(0, 5), (5, 10), (10, 15), (15, 20)]);
        assert_eq!(active_ids(&output.segments[0]), vec!["A"]);
        assert_eq!(active_ids(&output.segments[1]), vec!["A", "B"]);
        assert_eq!(active_ids(&output.segments[2]), vec!["B"]);
        assert!(!output.segments[3].is_annotated());
        assert_eq!(output.text(), text);
    }

    #[test]
    fn test_touching_highlights_stay_separate() {
        let text = "aaaabbbb";
        let output = render(
            text,
            &[
                record("A", 0, 4, HighlightColor::Yellow),
                record("B", 4, 8, HighlightColor::Yellow),
            ],
        );

        assert_eq!(output.segments.len(), 2);
        assert_eq!(active_ids(&output.segments[0]), vec!["A"]);
        assert_eq!(active_ids(&output.segments[1]), vec!["B"]);
    }

    #[test]
    fn test_nested_highlight_splits_outer() {
        let text = "0123456789";
        let output = render(
            text,
            &[
                record("outer", 0, 10, HighlightColor::Blue),
                record("inner", 3, 6, HighlightColor::Green),
            ],
        );

        let ranges: Vec<_> = output.segments.iter().map(Segment::range).collect();
        assert_eq!(ranges, vec![(0, 3), (3, 6), (6, 10)]);
        assert_eq!(active_ids(&output.segments[1]), vec!["outer", "inner"]);
        assert_eq!(output.segments_for(&HighlightId::from("outer")).count(), 3);
    }

    #[test]
    fn test_identical_ranges_are_both_active() {
        let output = render(
            "same span",
            &[
                record("y", 0, 4, HighlightColor::Yellow),
                record("b", 0, 4, HighlightColor::Blue),
            ],
        );

        assert_eq!(active_ids(&output.segments[0]), vec!["b", "y"]);
        let colors: Vec<_> = output.segments[0].active().iter().map(|a| a.color).collect();
        assert_eq!(colors, vec![HighlightColor::Blue, HighlightColor::Yellow]);
    }

    #[test]
    fn test_delete_restores_exact_structure() {
        let text = "The quick brown fox jumps over the lazy dog";
        let a = record("A", 4, 19, HighlightColor::Yellow);
        let b = record("B", 10, 30, HighlightColor::Green);

        let mut store = HighlightStore::new("doc");
        store.add(a.clone()).unwrap();
        store.add(b.clone()).unwrap();

        let with_both = render(text, store.all());
        assert_eq!(with_both.segments.len(), 5);

        assert!(store.remove(&b.id));
        let after_delete = render(text, store.all());
        let from_scratch = render(text, &[a]);

        assert_ne!(after_delete, with_both);
        assert_eq!(after_delete, from_scratch);
        assert_eq!(after_delete.segments.len(), 3);
        assert_eq!(after_delete.segments_for(&b.id).count(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_skipped() {
        let text = "short text";
        let output = render(
            text,
            &[
                record("ok", 0, 5, HighlightColor::Yellow),
                record("bad", 6, 40, HighlightColor::Green),
            ],
        );

        assert_eq!(
            output.warnings,
            vec![RenderWarning::OutOfBounds {
                id: HighlightId::from("bad"),
                start: 6,
                end: 40,
                text_len: 10
            }]
        );
        assert_eq!(output.segments.len(), 2);
        assert_eq!(active_ids(&output.segments[0]), vec!["ok"]);
        assert_eq!(output.text(), text);
    }

    #[test]
    fn test_inverted_record_is_skipped() {
        let mut bad = record("bad", 1, 3, HighlightColor::Yellow);
        bad.start = 3;
        bad.end = 3;

        let output = render("abcdef", &[bad]);
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.segments.len(), 1);
    }

    #[test]
    fn test_offsets_are_chars_not_bytes() {
        let text = "naïve café owners";
        let output = render(text, &[record("A", 6, 10, HighlightColor::Yellow)]);

        assert_eq!(output.segments[1].text(), "café");
        assert_eq!(output.text(), text);
    }

    #[test]
    fn test_coverage_over_many_overlaps() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit";
        let len = text.chars().count();
        let mut records = Vec::new();
        for i in 0..12 {
            let start = (i * 7) % (len - 6);
            let end = (start + 3 + i * 5 % 11).min(len);
            records.push(record(&format!("h{i}"), start, end, HighlightColor::ALL[i % 3]));
        }

        let output = render(text, &records);

        assert!(output.is_clean());
        assert_eq!(output.text(), text);
        for pair in output.segments.windows(2) {
            assert_eq!(pair[0].range().1, pair[1].range().0);
            assert_ne!(pair[0].active(), pair[1].active());
        }
        for r in &records {
            let covered: usize = output
                .segments_for(&r.id)
                .map(|s| s.range().1 - s.range().0)
                .sum();
            assert_eq!(covered, r.len());
        }
    }
}
