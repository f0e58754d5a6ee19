//! Module handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lms_core::approval::ContentKind;
use lms_core::content::{empty_document, parse_document};
use lms_core::error::CoreError;
use lms_core::types::DbId;
use lms_db::models::module::{CreateModule, Module, UpdateModule};
use lms_db::repositories::ModuleRepo;
use validator::Validate;

use super::course::ensure_course_exists;
use super::workflow::ensure_visible;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuthor;
use crate::query::ContentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a module or fail with `NotFound`.
pub async fn ensure_module_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Module> {
    ModuleRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Module",
            id,
        }))
}

/// POST /api/v1/courses/{course_id}/modules
pub async fn create_module(
    RequireAuthor(auth): RequireAuthor,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Json(input): Json<CreateModule>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let content = input
        .content
        .as_ref()
        .map(parse_document)
        .transpose()?
        .unwrap_or_else(empty_document);

    let module =
        ModuleRepo::create(&state.pool, course_id, auth.user_id, &input, &content).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Module.as_str(),
        entity_id = module.id,
        course_id,
        "Content created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: module })))
}

/// GET /api/v1/courses/{course_id}/modules
pub async fn list_modules(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Query(params): Query<ContentListParams>,
) -> AppResult<Json<DataResponse<Vec<Module>>>> {
    ensure_course_exists(&state.pool, course_id).await?;
    let filter = params.to_filter(&auth)?;
    let modules = ModuleRepo::list_for_course(&state.pool, course_id, &filter).await?;
    Ok(Json(DataResponse { data: modules }))
}

/// GET /api/v1/modules/{id}
pub async fn get_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Module>>> {
    let module = ensure_module_exists(&state.pool, id).await?;
    ensure_visible(&auth, ContentKind::Module, module.is_published)?;
    Ok(Json(DataResponse { data: module }))
}

/// PUT /api/v1/modules/{id}
///
/// A content change by a non-admin sends the module back to review.
pub async fn update_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateModule>,
) -> AppResult<Json<DataResponse<Module>>> {
    input.validate()?;
    let content = input.content.as_ref().map(parse_document).transpose()?;

    let module = ModuleRepo::update(&state.pool, id, &auth.actor(), &input, content).await?;

    tracing::info!(
        user_id = auth.user_id,
        kind = ContentKind::Module.as_str(),
        entity_id = id,
        status_id = module.approval_status_id,
        version = module.version,
        "Content updated",
    );
    Ok(Json(DataResponse { data: module }))
}
