//! Offset resolution for live selections
//!
//! Turns an anchor/focus selection inside a container into character offsets
//! over the container's flattened text. Highlight markup already mounted in
//! the container contributes only its text, so offsets stay stable across
//! re-renders.

use serde::{Deserialize, Serialize};

use super::error::SelectionError;
use super::tree::{NodeId, NodeKind, TextTree};
use super::types::{HighlightColor, NewHighlight};

/// Shortest selection (after trimming) accepted as a highlight
pub const DEFAULT_MIN_SELECTION_LEN: usize = 3;

/// One end of a selection
///
/// Inside a text node `offset` counts characters; inside an element it
/// counts children, as DOM ranges do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection as the reader made it; `focus` may come before `anchor`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl Selection {
    pub fn new(anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        Self { anchor, focus }
    }

    /// Selection within a single text node
    pub fn in_text(node: NodeId, start: usize, end: usize) -> Self {
        Self::new(SelectionPoint::new(node, start), SelectionPoint::new(node, end))
    }
}

/// Trimmed selection with offsets into the flattened text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSelection {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct OffsetResolver {
    min_len: usize,
}

impl Default for OffsetResolver {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_SELECTION_LEN,
        }
    }
}

impl OffsetResolver {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Resolve `selection` against `container`
    ///
    /// Surrounding whitespace is trimmed and the offsets move with it, so
    /// `text` is always exactly `flattened[start..end]`.
    pub fn resolve(
        &self,
        tree: &TextTree,
        container: NodeId,
        selection: &Selection,
    ) -> Result<ResolvedSelection, SelectionError> {
        let anchor = point_offset(tree, container, &selection.anchor)?;
        let focus = point_offset(tree, container, &selection.focus)?;
        let (from, to) = if anchor <= focus {
            (anchor, focus)
        } else {
            (focus, anchor)
        };

        let raw: String = tree
            .text_content(container)
            .chars()
            .skip(from)
            .take(to - from)
            .collect();

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::Empty);
        }

        let len = trimmed.chars().count();
        if len < self.min_len {
            return Err(SelectionError::TooShort {
                len,
                min: self.min_len,
            });
        }

        let leading = raw.chars().count() - raw.trim_start().chars().count();
        let start = from + leading;

        Ok(ResolvedSelection {
            start,
            end: start + len,
            text: trimmed.to_string(),
        })
    }

    /// Resolve and open a color prompt for the result
    pub fn prompt(
        &self,
        document_id: &str,
        tree: &TextTree,
        container: NodeId,
        selection: &Selection,
    ) -> Result<SelectionPrompt, SelectionError> {
        let resolved = self.resolve(tree, container, selection)?;
        Ok(SelectionPrompt {
            document_id: document_id.to_string(),
            selection: resolved,
        })
    }
}

/// Flattened offset of a selection point within `container`
fn point_offset(
    tree: &TextTree,
    container: NodeId,
    point: &SelectionPoint,
) -> Result<usize, SelectionError> {
    let before = tree
        .chars_before(container, point.node)
        .ok_or(SelectionError::OutsideContainer)?;

    let within = match tree.kind(point.node) {
        Some(NodeKind::Text(text)) => {
            if point.offset > text.chars().count() {
                return Err(SelectionError::InvalidEndpoint {
                    offset: point.offset,
                });
            }
            point.offset
        }
        Some(NodeKind::Element { .. }) => {
            let children = tree.children(point.node);
            if point.offset > children.len() {
                return Err(SelectionError::InvalidEndpoint {
                    offset: point.offset,
                });
            }
            children[..point.offset]
                .iter()
                .map(|&c| tree.text_len(c))
                .sum()
        }
        None => return Err(SelectionError::OutsideContainer),
    };

    Ok(before + within)
}

/// A resolved selection waiting for the reader to pick a color
///
/// Dismissing (or dropping) the prompt discards the selection; nothing is
/// stored until a color is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPrompt {
    document_id: String,
    selection: ResolvedSelection,
}

impl SelectionPrompt {
    pub fn selection(&self) -> &ResolvedSelection {
        &self.selection
    }

    /// Commit a color, producing the highlight to store and persist
    pub fn choose(self, color: HighlightColor) -> NewHighlight {
        NewHighlight {
            document_id: self.document_id,
            start: self.selection.start,
            end: self.selection.end,
            text: self.selection.text,
            color,
        }
    }

    pub fn dismiss(self) {
        tracing::debug!(
            "Dismissed highlight prompt for [{}, {})",
            self.selection.start,
            self.selection.end
        );
    }
}
