//! Lesson handlers, including resource attachments.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lms_core::approval::ContentKind;
use lms_core::content::{empty_document, parse_document, resource_type};
use lms_core::error::CoreError;
use lms_core::types::DbId;
use lms_db::models::lesson::{CreateLesson, Lesson, LessonResource, UpdateLesson, VALID_VIDEO_TYPES};
use lms_db::repositories::{LessonKind, LessonRepo, WorkflowRepo};
use validator::Validate;

use super::module::ensure_module_exists;
use super::upload::{discard_upload, store_upload, UploadForm};
use super::workflow::ensure_visible;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuthor;
use crate::query::ContentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn validate_video_type(video_type: Option<&str>) -> Result<(), CoreError> {
    match video_type {
        Some(t) if !VALID_VIDEO_TYPES.contains(&t) => Err(CoreError::Validation(format!(
            "Invalid video type '{t}'. Must be one of: {}",
            VALID_VIDEO_TYPES.join(", ")
        ))),
        _ => Ok(()),
    }
}

/// POST /api/v1/modules/{module_id}/lessons
pub async fn create_lesson(
    RequireAuthor(auth): RequireAuthor,
    State(state): State<AppState>,
    Path(module_id): Path<DbId>,
    Json(input): Json<CreateLesson>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_video_type(input.video_type.as_deref())?;
    let content = input
        .content
        .as_ref()
        .map(parse_document)
        .transpose()?
        .unwrap_or_else(empty_document);

    let lesson =
        LessonRepo::create(&state.pool, module_id, auth.user_id, &input, &content).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Lesson.as_str(),
        entity_id = lesson.id,
        module_id,
        "Content created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: lesson })))
}

/// GET /api/v1/modules/{module_id}/lessons
pub async fn list_lessons(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(module_id): Path<DbId>,
    Query(params): Query<ContentListParams>,
) -> AppResult<Json<DataResponse<Vec<Lesson>>>> {
    let module = ensure_module_exists(&state.pool, module_id).await?;
    ensure_visible(&auth, ContentKind::Module, module.is_published)?;

    let filter = params.to_filter(&auth)?;
    let lessons = LessonRepo::list_for_module(&state.pool, module_id, &filter).await?;
    Ok(Json(DataResponse { data: lessons }))
}

/// GET /api/v1/lessons/{id}
pub async fn get_lesson(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Lesson>>> {
    let lesson = LessonRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Lesson",
            id,
        }))?;
    ensure_visible(&auth, ContentKind::Lesson, lesson.is_published)?;
    Ok(Json(DataResponse { data: lesson }))
}

/// PUT /api/v1/lessons/{id}
pub async fn update_lesson(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLesson>,
) -> AppResult<Json<DataResponse<Lesson>>> {
    input.validate()?;
    validate_video_type(input.video_type.as_deref())?;
    let content = input.content.as_ref().map(parse_document).transpose()?;

    let lesson = LessonRepo::update(&state.pool, id, &auth.actor(), &input, content).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Lesson.as_str(),
        entity_id = id,
        status_id = lesson.approval_status_id,
        version = lesson.version,
        "Content updated",
    );
    Ok(Json(DataResponse { data: lesson }))
}

/// POST /api/v1/lessons/{id}/attach-file
///
/// Multipart fields: `file` (required), `title`, `resource_type`.
pub async fn attach_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<Lesson>>> {
    let actor = auth.actor();

    // Check edit rights before anything is written to storage.
    let record = WorkflowRepo::<LessonKind>::find(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Lesson",
            id,
        }))?;
    record.state()?.authorize_edit(&actor, record.created_by)?;

    let mut form = UploadForm::read(&mut multipart, &["file"]).await?;
    let resource_type = resource_type(form.text("resource_type"))?;
    let title = form.text("title").map(str::to_string);
    let file = form.take_file()?;

    let stored = store_upload(&state, &file).await?;
    let resource = LessonResource {
        title: title.unwrap_or_else(|| stored.file_name.clone()),
        url: stored.url.clone(),
        resource_type,
        file_name: stored.file_name.clone(),
        size_bytes: stored.size_bytes,
    };

    let lesson = match LessonRepo::add_resource(&state.pool, id, &actor, &resource).await {
        Ok(lesson) => lesson,
        Err(e) => {
            discard_upload(&state, &stored).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Lesson.as_str(),
        entity_id = id,
        resource_type = %resource.resource_type,
        "Lesson resource attached",
    );
    Ok(Json(DataResponse { data: lesson }))
}
