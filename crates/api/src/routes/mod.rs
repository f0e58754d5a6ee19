pub mod course;
pub mod enrollment;
pub mod exam;
pub mod file;
pub mod health;
pub mod lesson;
pub mod material;
pub mod module;
pub mod progress;
pub mod upload;
pub mod workflow;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /courses                              create, list
/// /courses/{id}                         get
/// /courses/{id}/recount                 reconcile counters (admin)
/// /courses/{id}/modules                 create, list
/// /courses/{id}/materials               upload, list
/// /courses/{id}/exams                   create, list
/// /courses/{id}/exam-eligibility        exam unlock status (student)
///
/// /modules/{id}                         get, update, delete
/// /modules/{id}/lessons                 create, list
/// /lessons/{id}                         get, update, delete
/// /lessons/{id}/attach-file             attach resource
/// /materials/{id}                       get, update, delete
/// /exams/{id}                           get, update, delete
/// /exams/{id}/attempts                  submit answers, own attempts (student)
///
/// /{kind}                               review queue across courses (staff, admin)
/// /{kind}/{id}/submit                   submit for review
/// /{kind}/{id}/approve                  approve (admin)
/// /{kind}/{id}/request-corrections      reject with reason (admin)
/// /{kind}/{id}/unpublish                unpublish (admin)
/// /{kind}/{id}/versions                 version history (modules, lessons, exams)
///
/// /uploads/image                        editor media upload
///
/// /enrollments                          enroll (student)
/// /enrollments/mine                     own enrollments
/// /enrollments/courses                  ids of every course ever enrolled in
/// /enrollments/check/{course_id}        is-enrolled check
/// /enrollments/{id}/withdraw            withdraw
///
/// /progress                             record study time (student)
/// /progress/{course_id}                 own course progress
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/courses", course::router())
        .nest("/modules", module::router())
        .nest("/lessons", lesson::router())
        .nest("/materials", material::router())
        .nest("/exams", exam::router())
        .nest("/uploads", upload::router())
        .nest("/enrollments", enrollment::router())
        .nest("/progress", progress::router())
}
