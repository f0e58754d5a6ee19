use axum::routing::{get, post};
use axum::Router;
use lms_db::repositories::LessonKind;

use super::workflow as workflow_routes;
use crate::handlers::{lesson, workflow};
use crate::state::AppState;

/// Routes mounted at `/lessons`.
///
/// ```text
/// GET    /{id}              get_lesson
/// PUT    /{id}              update_lesson
/// DELETE /{id}              delete
/// POST   /{id}/attach-file  attach_file (multipart)
/// ```
///
/// Plus the shared approval routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(lesson::get_lesson)
                .put(lesson::update_lesson)
                .delete(workflow::delete::<LessonKind>),
        )
        .route("/{id}/attach-file", post(lesson::attach_file))
        .merge(workflow_routes::router::<LessonKind>())
}
