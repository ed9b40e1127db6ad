//! Document API routes
//!
//! Stores each document's raw text and serves server-side highlight renders.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Document, DocumentRepository, DocumentUpsert, HighlightRepository};
use crate::error::{AppError, Result};
use crate::highlights::{DocumentView, RenderWarning, Segment};
use crate::html::{flatten_html, render_html};
use crate::state::AppState;

/// Create the documents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_document).put(put_document))
        .route("/:id/render", get(render_document))
}

/// Request body for storing a document
///
/// Exactly one of `text` or `html` must be given; HTML is flattened to its
/// text content before storing.
#[derive(Debug, Deserialize)]
pub struct PutDocumentRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PutDocumentResponse {
    pub id: String,
    pub length: usize,
    #[serde(flatten)]
    pub outcome: DocumentUpsert,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub document_id: String,
    pub segments: Vec<Segment>,
    pub html: String,
    pub warnings: Vec<RenderWarning>,
}

/// Get a stored document
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    let document = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))?;
    Ok(Json(document))
}

/// Store or replace a document's text
async fn put_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PutDocumentRequest>,
) -> Result<Json<PutDocumentResponse>> {
    let text = match (request.text, request.html) {
        (Some(text), None) => text,
        (None, Some(html)) => flatten_html(&html)?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide exactly one of `text` or `html`".to_string(),
            ))
        }
    };

    let outcome = DocumentRepository::new(state.db())
        .upsert(&id, request.title.as_deref(), &text)
        .await?;

    Ok(Json(PutDocumentResponse {
        id,
        length: text.chars().count(),
        outcome,
    }))
}

/// Render a document with all of its highlights
async fn render_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RenderResponse>> {
    let document = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))?;

    let existing = HighlightRepository::new(state.db())
        .list_for_document(&id)
        .await?;
    let view = DocumentView::on_document_load(id.as_str(), document.content, existing);
    let rendered = view.rendered();

    Ok(Json(RenderResponse {
        document_id: id,
        html: render_html(&rendered.segments, state.markup()),
        segments: rendered.segments.clone(),
        warnings: rendered.warnings.clone(),
    }))
}
