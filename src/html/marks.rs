//! Highlight markup for rendered segments
//!
//! Annotated segments become one nested `<mark>` per active highlight so
//! each highlight stays individually addressable by id. The reverse
//! direction, flattening stored HTML back into the offset coordinate space,
//! uses lol_html's streaming text handlers.

use lol_html::html_content::TextType;
use lol_html::{doc_text, rewrite_str, RewriteStrSettings};

use crate::highlights::{ActiveHighlight, NodeId, Segment, TextTree};

/// Configuration for highlight markup
#[derive(Debug, Clone)]
pub struct MarkupConfig {
    /// Element wrapped around highlighted text
    pub element: String,
    /// CSS class prefix; each mark gets `{prefix} {prefix}-{color}`
    pub class_prefix: String,
    /// Data attribute carrying the highlight id
    pub id_attribute: String,
    /// Whether to include inline background styles
    pub include_inline_styles: bool,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            element: "mark".to_string(),
            class_prefix: "highlight".to_string(),
            id_attribute: "data-highlight-id".to_string(),
            include_inline_styles: false,
        }
    }
}

impl MarkupConfig {
    pub fn with_class_prefix(mut self, prefix: &str) -> Self {
        self.class_prefix = prefix.to_string();
        self
    }

    fn class_for(&self, active: &ActiveHighlight) -> String {
        format!(
            "{} {}-{}",
            self.class_prefix, self.class_prefix, active.color
        )
    }
}

/// Errors during markup processing
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

/// Render segments as HTML with nested highlight marks
pub fn render_html(segments: &[Segment], config: &MarkupConfig) -> String {
    let mut html = String::new();

    for segment in segments {
        let text = html_escape::encode_text(segment.text());
        let active = segment.active();

        for highlight in active {
            html.push_str(&open_mark(highlight, config));
        }
        html.push_str(&text);
        for _ in active {
            html.push_str("</");
            html.push_str(&config.element);
            html.push('>');
        }
    }

    html
}

/// Format an opening mark tag
fn open_mark(highlight: &ActiveHighlight, config: &MarkupConfig) -> String {
    let style = if config.include_inline_styles {
        format!(" style=\"background-color: {};\"", highlight.color.background())
    } else {
        String::new()
    };

    format!(
        "<{} class=\"{}\" {}=\"{}\"{}>",
        config.element,
        config.class_for(highlight),
        config.id_attribute,
        html_escape::encode_double_quoted_attribute(highlight.id.as_str()),
        style
    )
}

/// Append segments to `container` as text nodes and nested mark elements
///
/// This is the tree a UI mounts; its flattened text equals the segment text.
pub fn mount_segments(
    tree: &mut TextTree,
    container: NodeId,
    segments: &[Segment],
    config: &MarkupConfig,
) {
    for segment in segments {
        let mut parent = container;
        for highlight in segment.active() {
            let mark = tree.append_element(parent, &config.element);
            tree.set_attribute(mark, "class", &config.class_for(highlight));
            tree.set_attribute(mark, &config.id_attribute, highlight.id.as_str());
            parent = mark;
        }
        tree.append_text(parent, segment.text());
    }
}

/// Strip markup from HTML, returning its flattened text
///
/// Entities are decoded per text node except inside raw-text elements such
/// as `<script>` and `<style>`, so the result is what a browser's
/// `textContent` would report.
pub fn flatten_html(html: &str) -> Result<String, MarkupError> {
    let mut flattened = String::new();
    let mut node_text = String::new();

    rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|chunk| {
                node_text.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    match chunk.text_type() {
                        TextType::Data | TextType::RCData => {
                            flattened.push_str(&html_escape::decode_html_entities(&node_text))
                        }
                        _ => flattened.push_str(&node_text),
                    }
                    node_text.clear();
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| MarkupError::RewriteError(e.to_string()))?;

    Ok(flattened)
}
