use axum::extract::{Query, State};
use axum::Json;

use crate::dto::{BrowseQuery, BrowseResponse, SearchQuery, SearchResponse};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /browse?path=P`: lists one directory with recursive sizes.
pub async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowseResponse>, AppError> {
    let path = query.path.unwrap_or_default();
    tracing::debug!(%path, "browse");

    // Size aggregation walks whole subtrees; keep it off the async workers.
    let root = state.root.clone();
    let listing = tokio::task::spawn_blocking(move || dirserve_core::browse(&root, &path))
        .await
        .map_err(|e| AppError::Internal(format!("browse task failed: {e}")))??;

    Ok(Json(listing.into()))
}

/// `GET /search?query=Q&path=P`: recursive substring search on names.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let needle = query
        .query
        .ok_or_else(|| AppError::BadRequest("Query parameter is required.".to_string()))?;
    let path = query.path.unwrap_or_default();
    tracing::debug!(query = %needle, %path, "search");

    let root = state.root.clone();
    let result = tokio::task::spawn_blocking(move || dirserve_core::search(&root, &path, &needle))
        .await
        .map_err(|e| AppError::Internal(format!("search task failed: {e}")))??;

    Ok(Json(result.into()))
}
