use axum::routing::{get, post};
use axum::Router;

use crate::handlers::progress;
use crate::state::AppState;

/// Routes mounted at `/progress`.
///
/// ```text
/// POST   /                 record_progress (student)
/// GET    /{course_id}      get_progress
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(progress::record_progress))
        .route("/{course_id}", get(progress::get_progress))
}
