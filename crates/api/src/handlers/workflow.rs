//! Approval workflow endpoints shared by every content kind.
//!
//! Each handler is generic over a [`ContentTable`] and mounted once per
//! kind by `routes::workflow::router`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use lms_core::approval::{ContentKind, Transition};
use lms_core::error::CoreError;
use lms_core::types::DbId;
use lms_db::models::workflow::{
    ApproveRequest, ContentSummary, RejectRequest, TransitionResult, VersionListing,
};
use lms_db::repositories::{ContentTable, WorkflowRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuthor};
use crate::query::ContentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reject students asking for content that is not published.
pub fn ensure_visible(user: &AuthUser, kind: ContentKind, is_published: bool) -> Result<(), CoreError> {
    if user.is_student() && !is_published {
        return Err(CoreError::Forbidden(format!(
            "{} is not published",
            kind.entity_name()
        )));
    }
    Ok(())
}

async fn run<K: ContentTable>(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    transition: Transition,
) -> AppResult<Json<DataResponse<TransitionResult>>> {
    let next = WorkflowRepo::<K>::transition(&state.pool, id, &user.actor(), &transition).await?;
    Ok(Json(DataResponse {
        data: TransitionResult {
            kind: K::KIND,
            id,
            action: transition.name(),
            state: next,
        },
    }))
}

/// GET /api/v1/{kind}
///
/// Review queue across every course, filtered by `?status=` and `?mine=`.
/// Staff only ever see their own rows; admins see everyone's.
pub async fn list_queue<K: ContentTable>(
    RequireAuthor(auth): RequireAuthor,
    State(state): State<AppState>,
    Query(params): Query<ContentListParams>,
) -> AppResult<Json<DataResponse<Vec<ContentSummary>>>> {
    let mut filter = params.to_filter(&auth)?;
    if !auth.actor().is_admin() {
        filter.created_by = Some(auth.user_id);
    }
    let rows = WorkflowRepo::<K>::list_queue(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// PUT /api/v1/{kind}/{id}/submit
pub async fn submit<K: ContentTable>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TransitionResult>>> {
    run::<K>(&state, &auth, id, Transition::Submit).await
}

/// PUT /api/v1/{kind}/{id}/approve
pub async fn approve<K: ContentTable>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ApproveRequest>,
) -> AppResult<Json<DataResponse<TransitionResult>>> {
    run::<K>(&state, &admin, id, Transition::Approve { remarks: input.remarks }).await
}

/// PUT /api/v1/{kind}/{id}/request-corrections
///
/// Rejects the entity. The reason must be at least 10 characters.
pub async fn request_corrections<K: ContentTable>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<Json<DataResponse<TransitionResult>>> {
    let transition = Transition::Reject {
        reason: input.reason,
        remarks: input.remarks,
    };
    run::<K>(&state, &admin, id, transition).await
}

/// PUT /api/v1/{kind}/{id}/unpublish
pub async fn unpublish<K: ContentTable>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TransitionResult>>> {
    run::<K>(&state, &admin, id, Transition::Unpublish).await
}

/// DELETE /api/v1/{kind}/{id}
pub async fn delete<K: ContentTable>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    WorkflowRepo::<K>::delete(&state.pool, id, &auth.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/{kind}/{id}/versions
///
/// Archived payloads, oldest first. Owner or admin only.
pub async fn versions<K: ContentTable>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VersionListing>>> {
    let row = WorkflowRepo::<K>::history(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: K::KIND.entity_name(),
            id,
        }))?;

    if !auth.actor().owns_or_admin(row.created_by) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner or an admin can view version history".into(),
        )));
    }

    Ok(Json(DataResponse {
        data: VersionListing {
            id,
            current_version: row.version,
            versions: row.previous_versions.0.iter().cloned().collect(),
        },
    }))
}
