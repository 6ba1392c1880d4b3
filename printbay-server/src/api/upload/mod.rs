//! Model upload
//!
//! `POST /api/files-upload` takes a multipart body with a `file` field.

mod handler;

use axum::{Router, extract::DefaultBodyLimit, routing::post};

use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/files-upload", post(handler::upload))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
}
