//! Study-time tracking handlers.

use axum::extract::{Path, State};
use axum::Json;
use lms_core::types::DbId;
use lms_db::models::progress::{ProgressSummary, ProgressUpdate, RecordProgress};
use lms_db::repositories::ProgressRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStudent;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/progress
///
/// Adds `time_spent_secs` to the module. Repeating a request adds the time
/// again; clients send deltas.
pub async fn record_progress(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Json(input): Json<RecordProgress>,
) -> AppResult<Json<DataResponse<ProgressUpdate>>> {
    input.validate()?;
    let update = ProgressRepo::record_time(&state.pool, student.user_id, &input).await?;
    Ok(Json(DataResponse { data: update }))
}

/// GET /api/v1/progress/{course_id}
pub async fn get_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProgressSummary>>> {
    let summary = ProgressRepo::summary(&state.pool, auth.user_id, course_id).await?;
    Ok(Json(DataResponse { data: summary }))
}
