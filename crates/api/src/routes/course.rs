use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{course, exam, material, module};
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// ```text
/// POST   /                  create_course (admin)
/// GET    /                  list_courses
/// GET    /{id}              get_course
/// POST   /{id}/recount      recount_course (admin)
/// POST   /{id}/modules      create_module
/// GET    /{id}/modules      list_modules
/// POST   /{id}/materials    upload_material (multipart)
/// GET    /{id}/materials    list_materials
/// POST   /{id}/exams        create_exam
/// GET    /{id}/exams        list_exams
/// GET    /{id}/exam-eligibility  exam_eligibility (student)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(course::create_course).get(course::list_courses))
        .route("/{id}", get(course::get_course))
        .route("/{id}/recount", post(course::recount_course))
        .route(
            "/{id}/modules",
            post(module::create_module).get(module::list_modules),
        )
        .route(
            "/{id}/materials",
            post(material::upload_material).get(material::list_materials),
        )
        .route("/{id}/exams", post(exam::create_exam).get(exam::list_exams))
        .route("/{id}/exam-eligibility", get(exam::exam_eligibility))
}
