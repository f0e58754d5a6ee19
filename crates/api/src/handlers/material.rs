//! Course material handlers. Materials are created by multipart upload.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lms_core::approval::ContentKind;
use lms_core::content::material_category;
use lms_core::error::CoreError;
use lms_core::types::DbId;
use lms_db::models::material::{CreateMaterial, Material, UpdateMaterial};
use lms_db::repositories::MaterialRepo;
use validator::Validate;

use super::course::ensure_course_exists;
use super::upload::{discard_upload, store_upload, UploadForm};
use super::workflow::ensure_visible;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuthor;
use crate::query::ContentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/courses/{course_id}/materials
///
/// Multipart fields: `file` (required), `title`, `material_type` (or
/// `type`), `description`, `category`, `preview_duration_secs`.
pub async fn upload_material(
    RequireAuthor(auth): RequireAuthor,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = UploadForm::read(&mut multipart, &["file"]).await?;
    let material_type = form
        .text("material_type")
        .or_else(|| form.text("type"))
        .ok_or_else(|| CoreError::Validation("material_type is required".into()))?
        .to_ascii_lowercase();
    let category = material_category(&material_type, form.text("category"))?;

    let input = CreateMaterial {
        title: form.text("title").unwrap_or_default().to_string(),
        description: form.text("description").map(str::to_string),
        material_type,
        category,
        preview_duration_secs: form.parsed("preview_duration_secs")?,
    };
    input.validate()?;

    let file = form.take_file()?;
    let stored = store_upload(&state, &file).await?;
    // The course is checked under lock by the insert; a missing course
    // leaves no file behind.
    let material =
        match MaterialRepo::create(&state.pool, course_id, auth.user_id, &input, &stored).await {
            Ok(material) => material,
            Err(e) => {
                discard_upload(&state, &stored).await;
                return Err(e.into());
            }
        };

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Material.as_str(),
        entity_id = material.id,
        course_id,
        size_bytes = material.file_size_bytes,
        "Content created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: material })))
}

/// GET /api/v1/courses/{course_id}/materials
pub async fn list_materials(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Query(params): Query<ContentListParams>,
) -> AppResult<Json<DataResponse<Vec<Material>>>> {
    ensure_course_exists(&state.pool, course_id).await?;
    let filter = params.to_filter(&auth)?;
    let materials = MaterialRepo::list_for_course(&state.pool, course_id, &filter).await?;
    Ok(Json(DataResponse { data: materials }))
}

/// GET /api/v1/materials/{id}
pub async fn get_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Material>>> {
    let material = MaterialRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Material",
            id,
        }))?;
    ensure_visible(&auth, ContentKind::Material, material.is_published)?;
    Ok(Json(DataResponse { data: material }))
}

/// PUT /api/v1/materials/{id}
///
/// Metadata only; the stored file is replaced by uploading a new material.
pub async fn update_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaterial>,
) -> AppResult<Json<DataResponse<Material>>> {
    input.validate()?;
    let material = MaterialRepo::update(&state.pool, id, &auth.actor(), &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Material.as_str(),
        entity_id = id,
        "Content updated",
    );
    Ok(Json(DataResponse { data: material }))
}
