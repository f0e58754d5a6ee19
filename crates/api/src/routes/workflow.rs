//! Approval routes shared by every content kind, merged into each kind's
//! router.

use axum::routing::{get, put};
use axum::Router;
use lms_db::repositories::ContentTable;

use crate::handlers::workflow;
use crate::state::AppState;

/// ```text
/// GET    /                           list_queue (staff, admin)
/// PUT    /{id}/submit                submit
/// PUT    /{id}/approve               approve (admin)
/// PUT    /{id}/request-corrections   request_corrections (admin)
/// PUT    /{id}/unpublish             unpublish (admin)
/// GET    /{id}/versions              versions (versioned kinds only)
/// ```
pub fn router<K: ContentTable>() -> Router<AppState> {
    let router = Router::new()
        .route("/", get(workflow::list_queue::<K>))
        .route("/{id}/submit", put(workflow::submit::<K>))
        .route("/{id}/approve", put(workflow::approve::<K>))
        .route(
            "/{id}/request-corrections",
            put(workflow::request_corrections::<K>),
        )
        .route("/{id}/unpublish", put(workflow::unpublish::<K>));

    if K::VERSIONED {
        router.route("/{id}/versions", get(workflow::versions::<K>))
    } else {
        router
    }
}
