pub mod files;
pub mod transfer;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Builds the API router, nested under the configured prefix.
///
/// Only the upload route accepts a request body. Its limit comes from
/// `max_upload_size_mb` and is enforced by the multipart extractor, so an
/// oversized form fails through [`crate::error::AppError`] with a JSON 413.
pub fn router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes();

    let routes = Router::new()
        .route("/browse", get(files::browse))
        .route("/search", get(files::search))
        .route("/download", get(transfer::download))
        .route(
            "/upload",
            post(transfer::upload).layer(DefaultBodyLimit::max(max_upload)),
        );

    let prefix = state.config.normalized_prefix();
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&prefix, routes)
    };

    app.with_state(state)
}
