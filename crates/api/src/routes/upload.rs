use axum::routing::post;
use axum::Router;

use crate::handlers::upload;
use crate::state::AppState;

/// Routes mounted at `/uploads`.
///
/// ```text
/// POST   /image            upload_editor_media (staff, admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/image", post(upload::upload_editor_media))
}
