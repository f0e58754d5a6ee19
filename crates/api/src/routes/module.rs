use axum::routing::get;
use axum::Router;
use lms_db::repositories::ModuleKind;

use super::workflow as workflow_routes;
use crate::handlers::{lesson, module, workflow};
use crate::state::AppState;

/// Routes mounted at `/modules`.
///
/// ```text
/// GET    /{id}              get_module
/// PUT    /{id}              update_module
/// DELETE /{id}              delete
/// POST   /{id}/lessons      create_lesson
/// GET    /{id}/lessons      list_lessons
/// ```
///
/// Plus the shared approval routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(module::get_module)
                .put(module::update_module)
                .delete(workflow::delete::<ModuleKind>),
        )
        .route(
            "/{id}/lessons",
            get(lesson::list_lessons).post(lesson::create_lesson),
        )
        .merge(workflow_routes::router::<ModuleKind>())
}
