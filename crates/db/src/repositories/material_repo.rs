//! Repository for the `materials` table.

use sqlx::PgPool;
use lms_core::approval::Actor;
use lms_core::error::CoreError;
use lms_core::storage::StoredFile;
use lms_core::types::DbId;

use crate::error::RepoError;
use crate::models::material::{CreateMaterial, Material, UpdateMaterial};
use crate::models::workflow::ContentFilter;
use crate::repositories::workflow_repo::{bind_filter, MaterialKind, WorkflowRepo, FILTER_SQL};

/// Column list for materials queries.
const COLUMNS: &str = "id, course_id, title, description, material_type, category, file_url, \
    file_name, file_size_bytes, preview_duration_secs, created_by, approval_status_id, \
    rejection_reason, admin_remarks, approved_by, approved_at, is_published, published_at, \
    created_at, updated_at";

/// Provides CRUD operations for materials.
pub struct MaterialRepo;

impl MaterialRepo {
    /// Insert a Draft material for an already-stored file and bump the
    /// course's material counter in the same transaction.
    pub async fn create(
        pool: &PgPool,
        course_id: DbId,
        created_by: DbId,
        input: &CreateMaterial,
        file: &StoredFile,
    ) -> Result<Material, RepoError> {
        let mut tx = pool.begin().await?;

        sqlx::query_scalar::<_, DbId>("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Course",
                id: course_id,
            })?;

        let query = format!(
            "INSERT INTO materials
                (course_id, title, description, material_type, category, file_url, file_name,
                 file_size_bytes, preview_duration_secs, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        let material = sqlx::query_as::<_, Material>(&query)
            .bind(course_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.material_type)
            .bind(&input.category)
            .bind(&file.url)
            .bind(&file.file_name)
            .bind(file.size_bytes)
            .bind(input.preview_duration_secs)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE courses SET total_materials = total_materials + 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(material)
    }

    /// Find a material by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Material>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM materials WHERE id = $1");
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List materials of a course, newest first.
    pub async fn list_for_course(
        pool: &PgPool,
        course_id: DbId,
        filter: &ContentFilter,
    ) -> Result<Vec<Material>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM materials
             WHERE course_id = $1 AND {FILTER_SQL}
             ORDER BY created_at DESC, id DESC"
        );
        bind_filter(sqlx::query_as::<_, Material>(&query).bind(course_id), filter)
            .fetch_all(pool)
            .await
    }

    /// Edit material metadata. The stored file is immutable, so the approval
    /// status is left alone.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
        input: &UpdateMaterial,
    ) -> Result<Material, RepoError> {
        let mut tx = pool.begin().await?;
        let record = WorkflowRepo::<MaterialKind>::lock(&mut tx, id).await?;
        record.state()?.authorize_edit(actor, record.created_by)?;

        let query = format!(
            "UPDATE materials SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                preview_duration_secs = COALESCE($5, preview_duration_secs)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let material = sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.category.as_deref().map(str::to_ascii_lowercase))
            .bind(input.preview_duration_secs)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(material)
    }
}
