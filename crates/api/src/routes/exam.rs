use axum::routing::get;
use axum::Router;
use lms_db::repositories::ExamKind;

use super::workflow as workflow_routes;
use crate::handlers::{exam, workflow};
use crate::state::AppState;

/// Routes mounted at `/exams`.
///
/// ```text
/// GET    /{id}              get_exam
/// PUT    /{id}              update_exam
/// DELETE /{id}              delete
/// POST   /{id}/attempts     submit_attempt (student)
/// GET    /{id}/attempts     my_attempts (student)
/// ```
///
/// Plus the shared approval routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(exam::get_exam)
                .put(exam::update_exam)
                .delete(workflow::delete::<ExamKind>),
        )
        .route(
            "/{id}/attempts",
            get(exam::my_attempts).post(exam::submit_attempt),
        )
        .merge(workflow_routes::router::<ExamKind>())
}
