//! Repository for the `modules` table.

use sqlx::PgPool;
use lms_core::approval::Actor;
use lms_core::content::block_count;
use lms_core::error::CoreError;
use lms_core::types::DbId;

use crate::error::RepoError;
use crate::models::module::{CreateModule, Module, UpdateModule};
use crate::models::workflow::ContentFilter;
use crate::repositories::workflow_repo::{bind_filter, ModuleKind, WorkflowRepo, FILTER_SQL};

/// Column list for modules queries.
const COLUMNS: &str = "id, course_id, title, description, content, sort_order, duration_mins, \
    lesson_ids, version, created_by, approval_status_id, rejection_reason, admin_remarks, \
    approved_by, approved_at, is_published, published_at, created_at, updated_at";

/// Provides CRUD operations for modules.
pub struct ModuleRepo;

impl ModuleRepo {
    /// Insert a Draft module at the end of its course and register it on the
    /// course, all in one transaction.
    ///
    /// The course row is locked while the next `sort_order` is computed so
    /// concurrent creates cannot pick the same slot.
    pub async fn create(
        pool: &PgPool,
        course_id: DbId,
        created_by: DbId,
        input: &CreateModule,
        content: &serde_json::Value,
    ) -> Result<Module, RepoError> {
        let mut tx = pool.begin().await?;

        sqlx::query_scalar::<_, DbId>("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Course",
                id: course_id,
            })?;

        let sort_order: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM modules WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO modules (course_id, title, description, content, sort_order, duration_mins, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let module = sqlx::query_as::<_, Module>(&query)
            .bind(course_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(content)
            .bind(sort_order)
            .bind(input.duration_mins)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE courses SET total_modules = total_modules + 1,
                module_ids = array_append(module_ids, $2)
             WHERE id = $1",
        )
        .bind(course_id)
        .bind(module.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(module)
    }

    /// Find a module by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Module>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM modules WHERE id = $1");
        sqlx::query_as::<_, Module>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List modules of a course by ordering key.
    pub async fn list_for_course(
        pool: &PgPool,
        course_id: DbId,
        filter: &ContentFilter,
    ) -> Result<Vec<Module>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM modules
             WHERE course_id = $1 AND {FILTER_SQL}
             ORDER BY sort_order ASC"
        );
        bind_filter(sqlx::query_as::<_, Module>(&query).bind(course_id), filter)
            .fetch_all(pool)
            .await
    }

    /// Apply an edit.
    ///
    /// A content change archives the previous document, bumps the version
    /// and (for non-admins) sends the module back for review.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
        input: &UpdateModule,
        content: Option<serde_json::Value>,
    ) -> Result<Module, RepoError> {
        let mut tx = pool.begin().await?;
        let record = WorkflowRepo::<ModuleKind>::lock(&mut tx, id).await?;
        let state = record.state()?;
        state.authorize_edit(actor, record.created_by)?;

        let current: serde_json::Value =
            sqlx::query_scalar("SELECT content FROM modules WHERE id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let new_content = content.filter(|c| *c != current);

        if let Some(new) = &new_content {
            let now = chrono::Utc::now();
            WorkflowRepo::<ModuleKind>::archive_previous(
                &mut tx,
                id,
                &current,
                block_count(&current) > 0,
                actor.user_id,
                now,
            )
            .await?;
            let next = state.after_edit(actor, true, block_count(new) > 0);
            WorkflowRepo::<ModuleKind>::write_state(&mut tx, id, &next).await?;
        }

        let query = format!(
            "UPDATE modules SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                duration_mins = COALESCE($5, duration_mins)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let module = sqlx::query_as::<_, Module>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&new_content)
            .bind(input.duration_mins)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(module)
    }
}
