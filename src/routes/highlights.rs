//! Highlights API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{DocumentRepository, HighlightRepository};
use crate::error::{AppError, Result};
use crate::highlights::{HighlightColor, HighlightId, HighlightRecord, NewHighlight};
use crate::state::AppState;

/// Create the highlights router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_highlights).post(create_highlight))
        .route("/:id", get(get_highlight).delete(delete_highlight))
        .route("/document/:document_id", delete(delete_document_highlights))
}

/// Query parameters for listing highlights
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub document_id: Option<String>,
}

/// Request body for creating a highlight
#[derive(Debug, Deserialize)]
pub struct CreateHighlightRequest {
    pub document_id: String,
    #[serde(alias = "start_offset")]
    pub start: usize,
    #[serde(alias = "end_offset")]
    pub end: usize,
    #[serde(alias = "highlighted_text")]
    pub text: String,
    #[serde(alias = "highlight_color")]
    pub color: Option<HighlightColor>,
}

#[derive(Debug, Serialize)]
pub struct HighlightsListResponse {
    pub highlights: Vec<HighlightRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// List highlights, for one document in offset order or all newest first
async fn list_highlights(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<HighlightsListResponse>> {
    let repo = HighlightRepository::new(state.db());
    let highlights = match params.document_id {
        Some(document_id) => repo.list_for_document(&document_id).await?,
        None => repo.list_all().await?,
    };

    let total = highlights.len();
    Ok(Json(HighlightsListResponse { highlights, total }))
}

/// Create a highlight after checking it against the stored document text
async fn create_highlight(
    State(state): State<AppState>,
    Json(request): Json<CreateHighlightRequest>,
) -> Result<(StatusCode, Json<HighlightRecord>)> {
    let min_len = state.resolver().min_len();
    if request.text.trim().chars().count() < min_len {
        return Err(AppError::BadRequest(format!(
            "Highlighted text must be at least {} characters",
            min_len
        )));
    }

    let document = DocumentRepository::new(state.db())
        .get(&request.document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", request.document_id)))?;

    let text_len = document.char_len();
    if request.end > text_len {
        return Err(AppError::BadRequest(format!(
            "Range [{}, {}) exceeds document length {}",
            request.start, request.end, text_len
        )));
    }

    let slice: String = document
        .content
        .chars()
        .skip(request.start)
        .take(request.end.saturating_sub(request.start))
        .collect();
    if request.start < request.end && slice != request.text {
        return Err(AppError::BadRequest(format!(
            "Text does not match document at [{}, {})",
            request.start, request.end
        )));
    }

    let new = NewHighlight {
        document_id: request.document_id,
        start: request.start,
        end: request.end,
        text: request.text,
        color: request
            .color
            .unwrap_or(state.config().highlights.default_color),
    };

    let record = HighlightRepository::new(state.db()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a specific highlight
async fn get_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HighlightRecord>> {
    let repo = HighlightRepository::new(state.db());
    let highlight = repo
        .get(&HighlightId::new(id.as_str()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Highlight not found: {}", id)))?;
    Ok(Json(highlight))
}

/// Delete a highlight
async fn delete_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let repo = HighlightRepository::new(state.db());
    let deleted = repo.delete(&HighlightId::new(id.as_str())).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Highlight not found: {}", id)))
    }
}

/// Remove every highlight on a document
async fn delete_document_highlights(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let repo = HighlightRepository::new(state.db());
    let deleted = repo.delete_for_document(&document_id).await?;
    Ok(Json(DeletedResponse { deleted }))
}
