//! Exam handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lms_core::approval::ContentKind;
use lms_core::content::validate_questions;
use lms_core::error::CoreError;
use lms_core::types::DbId;
use lms_db::models::exam::{CreateExam, Exam, UpdateExam};
use lms_db::models::exam_attempt::{ExamAttempt, ExamEligibility, SubmitAttempt};
use lms_db::repositories::{ExamAttemptRepo, ExamRepo};
use validator::Validate;

use super::course::ensure_course_exists;
use super::workflow::ensure_visible;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuthor, RequireStudent};
use crate::query::ContentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Strip answer keys before an exam is shown to a student.
fn redact_for(user: &AuthUser, mut exam: Exam) -> Exam {
    if user.is_student() {
        for question in exam.questions.0.iter_mut() {
            question.correct_option_indices.clear();
        }
    }
    exam
}

/// POST /api/v1/courses/{course_id}/exams
pub async fn create_exam(
    RequireAuthor(auth): RequireAuthor,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Json(input): Json<CreateExam>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_questions(&input.questions)?;

    let exam = ExamRepo::create(&state.pool, course_id, auth.user_id, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Exam.as_str(),
        entity_id = exam.id,
        course_id,
        questions = exam.questions.0.len(),
        "Content created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: exam })))
}

/// GET /api/v1/courses/{course_id}/exams
pub async fn list_exams(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Query(params): Query<ContentListParams>,
) -> AppResult<Json<DataResponse<Vec<Exam>>>> {
    ensure_course_exists(&state.pool, course_id).await?;
    let filter = params.to_filter(&auth)?;
    let exams: Vec<Exam> = ExamRepo::list_for_course(&state.pool, course_id, &filter)
        .await?
        .into_iter()
        .map(|exam| redact_for(&auth, exam))
        .collect();
    Ok(Json(DataResponse { data: exams }))
}

/// GET /api/v1/exams/{id}
pub async fn get_exam(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Exam>>> {
    let exam = ExamRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Exam", id }))?;
    ensure_visible(&auth, ContentKind::Exam, exam.is_published)?;
    Ok(Json(DataResponse {
        data: redact_for(&auth, exam),
    }))
}

/// PUT /api/v1/exams/{id}
///
/// Replacing the question list archives the previous one.
pub async fn update_exam(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateExam>,
) -> AppResult<Json<DataResponse<Exam>>> {
    input.validate()?;
    if let Some(questions) = &input.questions {
        validate_questions(questions)?;
    }

    let exam = ExamRepo::update(&state.pool, id, &auth.actor(), &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Exam.as_str(),
        entity_id = id,
        status_id = exam.approval_status_id,
        version = exam.version,
        "Content updated",
    );
    Ok(Json(DataResponse { data: exam }))
}

/// POST /api/v1/exams/{id}/attempts
///
/// Grades the answers and records the attempt. 403 until the student is
/// eligible.
pub async fn submit_attempt(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SubmitAttempt>,
) -> AppResult<impl IntoResponse> {
    let attempt = ExamAttemptRepo::submit(&state.pool, student.user_id, id, &input.answers).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: attempt })))
}

/// GET /api/v1/exams/{id}/attempts
pub async fn my_attempts(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ExamAttempt>>>> {
    let attempts = ExamAttemptRepo::list_for_student(&state.pool, student.user_id, id).await?;
    Ok(Json(DataResponse { data: attempts }))
}

/// GET /api/v1/courses/{course_id}/exam-eligibility
pub async fn exam_eligibility(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ExamEligibility>>>> {
    ensure_course_exists(&state.pool, course_id).await?;
    let exams =
        ExamAttemptRepo::eligibility_for_course(&state.pool, student.user_id, course_id).await?;
    Ok(Json(DataResponse { data: exams }))
}
