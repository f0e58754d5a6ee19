//! Repository for the `lessons` table.

use sqlx::types::Json;
use sqlx::PgPool;
use lms_core::approval::Actor;
use lms_core::content::block_count;
use lms_core::error::CoreError;
use lms_core::types::DbId;

use crate::error::RepoError;
use crate::models::lesson::{CreateLesson, Lesson, LessonResource, UpdateLesson};
use crate::models::workflow::ContentFilter;
use crate::repositories::workflow_repo::{bind_filter, LessonKind, WorkflowRepo, FILTER_SQL};

/// Column list for lessons queries.
const COLUMNS: &str = "id, module_id, course_id, title, description, content, sort_order, \
    duration_mins, video_url, video_type, video_duration_secs, thumbnail_url, resources, \
    is_free_preview, preview_duration_secs, version, created_by, approval_status_id, \
    rejection_reason, admin_remarks, approved_by, approved_at, is_published, published_at, \
    created_at, updated_at";

/// Provides CRUD operations for lessons.
pub struct LessonRepo;

impl LessonRepo {
    /// Insert a Draft lesson at the end of its module, registering it on the
    /// module and course in the same transaction.
    pub async fn create(
        pool: &PgPool,
        module_id: DbId,
        created_by: DbId,
        input: &CreateLesson,
        content: &serde_json::Value,
    ) -> Result<Lesson, RepoError> {
        let mut tx = pool.begin().await?;

        let course_id: DbId =
            sqlx::query_scalar("SELECT course_id FROM modules WHERE id = $1 FOR UPDATE")
                .bind(module_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Module",
                    id: module_id,
                })?;

        let sort_order: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM lessons WHERE module_id = $1",
        )
        .bind(module_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO lessons
                (module_id, course_id, title, description, content, sort_order, duration_mins,
                 video_url, video_type, video_duration_secs, thumbnail_url, is_free_preview,
                 preview_duration_secs, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'upload'), $10, $11,
                     COALESCE($12, false), $13, $14)
             RETURNING {COLUMNS}"
        );
        let lesson = sqlx::query_as::<_, Lesson>(&query)
            .bind(module_id)
            .bind(course_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(content)
            .bind(sort_order)
            .bind(input.duration_mins)
            .bind(&input.video_url)
            .bind(&input.video_type)
            .bind(input.video_duration_secs)
            .bind(&input.thumbnail_url)
            .bind(input.is_free_preview)
            .bind(input.preview_duration_secs)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE modules SET lesson_ids = array_append(lesson_ids, $2) WHERE id = $1")
            .bind(module_id)
            .bind(lesson.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE courses SET total_lessons = total_lessons + 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(lesson)
    }

    /// Find a lesson by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lesson>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lessons WHERE id = $1");
        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List lessons of a module by ordering key.
    pub async fn list_for_module(
        pool: &PgPool,
        module_id: DbId,
        filter: &ContentFilter,
    ) -> Result<Vec<Lesson>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lessons
             WHERE module_id = $1 AND {FILTER_SQL}
             ORDER BY sort_order ASC"
        );
        bind_filter(sqlx::query_as::<_, Lesson>(&query).bind(module_id), filter)
            .fetch_all(pool)
            .await
    }

    /// Apply an edit.
    ///
    /// A content change archives the previous document, bumps the version
    /// and (for non-admins) sends the lesson back for review.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
        input: &UpdateLesson,
        content: Option<serde_json::Value>,
    ) -> Result<Lesson, RepoError> {
        let mut tx = pool.begin().await?;
        let record = WorkflowRepo::<LessonKind>::lock(&mut tx, id).await?;
        let state = record.state()?;
        state.authorize_edit(actor, record.created_by)?;

        let current: serde_json::Value =
            sqlx::query_scalar("SELECT content FROM lessons WHERE id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let new_content = content.filter(|c| *c != current);

        if let Some(new) = &new_content {
            WorkflowRepo::<LessonKind>::archive_previous(
                &mut tx,
                id,
                &current,
                block_count(&current) > 0,
                actor.user_id,
                chrono::Utc::now(),
            )
            .await?;
            let next = state.after_edit(actor, true, block_count(new) > 0);
            WorkflowRepo::<LessonKind>::write_state(&mut tx, id, &next).await?;
        }

        let query = format!(
            "UPDATE lessons SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                duration_mins = COALESCE($5, duration_mins),
                video_url = COALESCE($6, video_url),
                video_type = COALESCE($7, video_type),
                video_duration_secs = COALESCE($8, video_duration_secs),
                thumbnail_url = COALESCE($9, thumbnail_url),
                is_free_preview = COALESCE($10, is_free_preview),
                preview_duration_secs = COALESCE($11, preview_duration_secs)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let lesson = sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&new_content)
            .bind(input.duration_mins)
            .bind(&input.video_url)
            .bind(&input.video_type)
            .bind(input.video_duration_secs)
            .bind(&input.thumbnail_url)
            .bind(input.is_free_preview)
            .bind(input.preview_duration_secs)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(lesson)
    }

    /// Append a downloadable resource to a lesson.
    ///
    /// Subject to the same edit rules as a content change, but resources are
    /// supplementary and do not reset the approval status.
    pub async fn add_resource(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
        resource: &LessonResource,
    ) -> Result<Lesson, RepoError> {
        let mut tx = pool.begin().await?;
        let record = WorkflowRepo::<LessonKind>::lock(&mut tx, id).await?;
        record.state()?.authorize_edit(actor, record.created_by)?;

        let query = format!(
            "UPDATE lessons SET resources = resources || $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let lesson = sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .bind(Json(vec![resource]))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(lesson)
    }
}
