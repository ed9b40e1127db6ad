//! Highlight record and segment types
//!
//! Offsets are counted in Unicode scalar values (`char`s) over the
//! container's flattened plain text, never in bytes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::RecordError;

/// Opaque highlight identifier assigned by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightId(String);

impl HighlightId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh UUID v4 identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HighlightId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HighlightId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Highlight colors offered to the reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 3] = [Self::Yellow, Self::Green, Self::Blue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }

    /// Background used when inline styles are requested
    pub fn background(&self) -> &'static str {
        match self {
            Self::Yellow => "#fff3cd",
            Self::Green => "#d4edda",
            Self::Blue => "#cce5ff",
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightColor {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            other => Err(RecordError::UnknownColor(other.to_string())),
        }
    }
}

/// A persisted color tag over `[start, end)` of a document's flattened text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRecord {
    pub id: HighlightId,
    pub document_id: String,
    pub start: usize,
    pub end: usize,
    pub color: HighlightColor,
    /// `text[start..end]` when the highlight was made; never used to
    /// re-derive offsets
    pub display_text: String,
    pub created_at: DateTime<Utc>,
}

impl HighlightRecord {
    /// Build a record, rejecting empty and inverted ranges
    pub fn new(
        id: HighlightId,
        document_id: impl Into<String>,
        start: usize,
        end: usize,
        color: HighlightColor,
        display_text: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if start >= end {
            return Err(RecordError::EmptyRange { start, end });
        }

        Ok(Self {
            id,
            document_id: document_id.into(),
            start,
            end,
            color,
            display_text: display_text.into(),
            created_at: Utc::now(),
        })
    }

    /// Build the record for a committed selection under `id`
    pub fn from_new(id: HighlightId, new: &NewHighlight) -> Result<Self, RecordError> {
        Self::new(
            id,
            new.document_id.clone(),
            new.start,
            new.end,
            new.color,
            new.text.clone(),
        )
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `[a, b)` lies entirely inside this record
    pub fn covers(&self, a: usize, b: usize) -> bool {
        self.start <= a && self.end >= b
    }

    /// Whether the record fits a text of `text_len` characters
    pub fn fits(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }

    /// Store and render ordering: `(start, end)` then `id`
    pub(crate) fn sort_key(&self) -> (usize, usize, &HighlightId) {
        (self.start, self.end, &self.id)
    }
}

/// A highlight the reader has committed a color for, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHighlight {
    pub document_id: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub color: HighlightColor,
}

/// One record contributing to an annotated segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHighlight {
    pub id: HighlightId,
    pub color: HighlightColor,
}

impl From<&HighlightRecord> for ActiveHighlight {
    fn from(record: &HighlightRecord) -> Self {
        Self {
            id: record.id.clone(),
            color: record.color,
        }
    }
}

/// A maximal run of text sharing one active highlight set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Plain {
        start: usize,
        end: usize,
        text: String,
    },
    Annotated {
        start: usize,
        end: usize,
        text: String,
        /// Ordered by the records' `(start, end, id)`
        active: Vec<ActiveHighlight>,
    },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain { text, .. } | Segment::Annotated { text, .. } => text,
        }
    }

    pub fn range(&self) -> (usize, usize) {
        match self {
            Segment::Plain { start, end, .. } | Segment::Annotated { start, end, .. } => {
                (*start, *end)
            }
        }
    }

    pub fn active(&self) -> &[ActiveHighlight] {
        match self {
            Segment::Plain { .. } => &[],
            Segment::Annotated { active, .. } => active,
        }
    }

    pub fn is_annotated(&self) -> bool {
        matches!(self, Segment::Annotated { .. })
    }

    pub fn has_highlight(&self, id: &HighlightId) -> bool {
        self.active().iter().any(|a| &a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rejects_empty_range() {
        let err = HighlightRecord::new(
            HighlightId::from("h1"),
            "doc",
            4,
            4,
            HighlightColor::Yellow,
            "",
        )
        .unwrap_err();

        assert!(matches!(err, RecordError::EmptyRange { start: 4, end: 4 }));
    }

    #[test]
    fn test_record_covers() {
        let record =
            HighlightRecord::new(HighlightId::from("h1"), "doc", 2, 8, HighlightColor::Blue, "x")
                .unwrap();

        assert!(record.covers(2, 8));
        assert!(record.covers(3, 5));
        assert!(!record.covers(1, 5));
        assert!(!record.covers(5, 9));
        assert!(record.fits(8));
        assert!(!record.fits(7));
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!("Green".parse::<HighlightColor>().unwrap(), HighlightColor::Green);
        assert_eq!(" blue ".parse::<HighlightColor>().unwrap(), HighlightColor::Blue);
        assert!("magenta".parse::<HighlightColor>().is_err());
        assert_eq!(HighlightColor::default(), HighlightColor::Yellow);
    }

    #[test]
    fn test_segment_serialization() {
        let segment = Segment::Annotated {
            start: 0,
            end: 3,
            text: "abc".to_string(),
            active: vec![ActiveHighlight {
                id: HighlightId::from("h1"),
                color: HighlightColor::Green,
            }],
        };

        let json = serde_json::to_string(&segment).unwrap();
        assert!(json.contains("\"kind\":\"annotated\""));
        assert!(json.contains("\"color\":\"green\""));
        assert!(json.contains("\"id\":\"h1\""));
    }
}
