//! Enrollment ledger handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lms_core::types::DbId;
use lms_db::models::enrollment::{
    CreateEnrollment, Enrollment, EnrollmentCheck, EnrollmentWithCourse,
};
use lms_db::repositories::EnrollmentRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStudent;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/enrollments
///
/// 409 when the student is already enrolled (active or completed).
pub async fn enroll(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Json(input): Json<CreateEnrollment>,
) -> AppResult<impl IntoResponse> {
    let enrollment = EnrollmentRepo::enroll(&state.pool, student.user_id, input.course_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: enrollment })))
}

/// GET /api/v1/enrollments/mine
pub async fn my_enrollments(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<EnrollmentWithCourse>>>> {
    let enrollments = EnrollmentRepo::list_for_student(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: enrollments }))
}

/// GET /api/v1/enrollments/courses
///
/// Every course the caller has ever enrolled in, withdrawn ones included,
/// in first-enrollment order.
pub async fn my_course_ids(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DbId>>>> {
    let course_ids = EnrollmentRepo::course_ids_for_student(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: course_ids }))
}

/// GET /api/v1/enrollments/check/{course_id}
pub async fn check_enrollment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<EnrollmentCheck>>> {
    let enrollment = EnrollmentRepo::find_current(&state.pool, auth.user_id, course_id).await?;
    Ok(Json(DataResponse {
        data: EnrollmentCheck {
            is_enrolled: enrollment.is_some(),
            enrollment,
        },
    }))
}

/// POST /api/v1/enrollments/{id}/withdraw
pub async fn withdraw(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Enrollment>>> {
    let enrollment = EnrollmentRepo::withdraw(&state.pool, id, &auth.actor()).await?;
    Ok(Json(DataResponse { data: enrollment }))
}
