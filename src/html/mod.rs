//! HTML processing module
//!
//! Provides the markup side of highlighting:
//! - Nested `<mark>` rendering of segments
//! - Mounting segments into a [`crate::highlights::TextTree`]
//! - Flattening stored HTML into plain text offsets
//!
//! Uses lol_html for streaming HTML processing.

mod marks;

pub use marks::{flatten_html, mount_segments, render_html, MarkupConfig, MarkupError};
