//! Authenticated download of stored uploads.

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use lms_core::error::CoreError;
use lms_core::storage::is_safe_file_name;
use lms_db::repositories::{EnrollmentRepo, UploadRepo};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::workflow::ensure_visible;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::storage::UPLOADS_ROUTE;

/// GET /uploads/{name}
///
/// Files owned by a material or lesson follow that row's visibility:
/// students need it published and an enrollment in its course. Inline
/// editor media is served to any signed-in user.
pub async fn serve_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> AppResult<Response> {
    if !is_safe_file_name(&name) {
        return Err(AppError::BadRequest("Invalid file name".into()));
    }

    let url = format!("{UPLOADS_ROUTE}/{name}");
    if let Some((kind, owner)) = UploadRepo::find_owner(&state.pool, &url).await? {
        ensure_visible(&auth, kind, owner.is_published)?;
        if auth.is_student()
            && EnrollmentRepo::find_current(&state.pool, auth.user_id, owner.course_id)
                .await?
                .is_none()
        {
            return Err(AppError::Core(CoreError::Forbidden(
                "You must be enrolled in this course to download its files".into(),
            )));
        }
    }

    let response = match ServeFile::new(state.config.upload_dir.join(&name))
        .oneshot(request)
        .await
    {
        Ok(response) => response,
        Err(never) => match never {},
    };

    tracing::debug!(user_id = auth.user_id, file = %name, status = %response.status(), "Upload served");
    Ok(response.map(Body::new).into_response())
}
