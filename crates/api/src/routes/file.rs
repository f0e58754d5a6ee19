use axum::routing::get;
use axum::Router;

use crate::handlers::file;
use crate::state::AppState;

/// Routes mounted at `/uploads` (outside `/api/v1`).
///
/// ```text
/// GET    /{name}            serve_upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{name}", get(file::serve_upload))
}
