use axum::routing::{get, post};
use axum::Router;

use crate::handlers::enrollment;
use crate::state::AppState;

/// Routes mounted at `/enrollments`.
///
/// ```text
/// POST   /                     enroll (student)
/// GET    /mine                 my_enrollments
/// GET    /courses              my_course_ids
/// GET    /check/{course_id}    check_enrollment
/// POST   /{id}/withdraw        withdraw
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(enrollment::enroll))
        .route("/mine", get(enrollment::my_enrollments))
        .route("/courses", get(enrollment::my_course_ids))
        .route("/check/{course_id}", get(enrollment::check_enrollment))
        .route("/{id}/withdraw", post(enrollment::withdraw))
}
