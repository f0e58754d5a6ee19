//! Generic persistence for the approval workflow.
//!
//! [`WorkflowRepo`] loads a content row under a row lock, runs the pure
//! engine from `lms_core::approval` and writes the resulting state back in
//! the same transaction. What differs between modules, lessons, materials
//! and exams lives in the [`ContentTable`] implementations.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres};
use lms_core::approval::{Actor, ContentKind, Transition, TransitionContext, WorkflowState};
use lms_core::error::CoreError;
use lms_core::types::{DbId, Timestamp};
use lms_core::versioning::VersionHistory;

use crate::error::RepoError;
use crate::models::workflow::{ContentFilter, ContentSummary, VersionHistoryRow, WorkflowRecord};

/// `WHERE` fragment applying a [`ContentFilter`] bound as `$2..$4`.
pub(crate) const FILTER_SQL: &str = "($2::SMALLINT IS NULL OR approval_status_id = $2) \
    AND (NOT $3 OR is_published) \
    AND ($4::BIGINT IS NULL OR created_by = $4)";

/// Bind the three [`FILTER_SQL`] parameters.
pub(crate) fn bind_filter<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &ContentFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(filter.status_id)
        .bind(filter.published_only)
        .bind(filter.created_by)
}

/// Per-kind strategy consumed by [`WorkflowRepo`].
#[async_trait]
pub trait ContentTable: Send + Sync + 'static {
    const KIND: ContentKind;
    const TABLE: &'static str;
    /// Column holding the parent id (course or module).
    const PARENT_COLUMN: &'static str;
    /// SQL boolean expression, true when the payload is non-empty.
    const HAS_CONTENT_SQL: &'static str;
    /// Whether the table carries `version` and `previous_versions`.
    const VERSIONED: bool;
    /// Whether rows belong to a module (and through it to a course).
    const IN_MODULE: bool = false;

    /// Undo the parent's denormalized bookkeeping for `record`.
    ///
    /// Runs inside the delete transaction, before the row is removed.
    async fn detach(conn: &mut PgConnection, record: &WorkflowRecord) -> Result<(), sqlx::Error>;
}

pub struct ModuleKind;
pub struct LessonKind;
pub struct MaterialKind;
pub struct ExamKind;

#[async_trait]
impl ContentTable for ModuleKind {
    const KIND: ContentKind = ContentKind::Module;
    const TABLE: &'static str = "modules";
    const PARENT_COLUMN: &'static str = "course_id";
    const HAS_CONTENT_SQL: &'static str =
        "COALESCE(jsonb_array_length(content->'blocks'), 0) > 0";
    const VERSIONED: bool = true;

    async fn detach(conn: &mut PgConnection, record: &WorkflowRecord) -> Result<(), sqlx::Error> {
        // The module's lessons cascade with it.
        sqlx::query(
            "UPDATE courses SET
                total_modules = GREATEST(total_modules - 1, 0),
                total_lessons = GREATEST(
                    total_lessons - (SELECT COUNT(*) FROM lessons WHERE module_id = $2)::INTEGER,
                    0),
                module_ids = array_remove(module_ids, $2)
             WHERE id = $1",
        )
        .bind(record.course_id)
        .bind(record.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentTable for LessonKind {
    const KIND: ContentKind = ContentKind::Lesson;
    const TABLE: &'static str = "lessons";
    const PARENT_COLUMN: &'static str = "module_id";
    const HAS_CONTENT_SQL: &'static str =
        "COALESCE(jsonb_array_length(content->'blocks'), 0) > 0";
    const VERSIONED: bool = true;
    const IN_MODULE: bool = true;

    async fn detach(conn: &mut PgConnection, record: &WorkflowRecord) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE modules SET lesson_ids = array_remove(lesson_ids, $2) WHERE id = $1")
            .bind(record.parent_id)
            .bind(record.id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            "UPDATE courses SET total_lessons = GREATEST(total_lessons - 1, 0) WHERE id = $1",
        )
        .bind(record.course_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentTable for MaterialKind {
    const KIND: ContentKind = ContentKind::Material;
    const TABLE: &'static str = "materials";
    const PARENT_COLUMN: &'static str = "course_id";
    const HAS_CONTENT_SQL: &'static str = "file_url <> ''";
    const VERSIONED: bool = false;

    async fn detach(conn: &mut PgConnection, record: &WorkflowRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE courses SET total_materials = GREATEST(total_materials - 1, 0) WHERE id = $1",
        )
        .bind(record.course_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentTable for ExamKind {
    const KIND: ContentKind = ContentKind::Exam;
    const TABLE: &'static str = "exams";
    const PARENT_COLUMN: &'static str = "course_id";
    const HAS_CONTENT_SQL: &'static str = "jsonb_array_length(questions) > 0";
    const VERSIONED: bool = true;

    async fn detach(conn: &mut PgConnection, record: &WorkflowRecord) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE courses SET total_exams = GREATEST(total_exams - 1, 0) WHERE id = $1")
            .bind(record.course_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Workflow operations shared by every content kind.
pub struct WorkflowRepo<K>(PhantomData<K>);

impl<K: ContentTable> WorkflowRepo<K> {
    fn record_query(for_update: bool) -> String {
        format!(
            "SELECT id, course_id, {parent} AS parent_id, created_by, approval_status_id, \
                rejection_reason, admin_remarks, approved_by, approved_at, published_at, \
                ({has_content}) AS has_content \
             FROM {table} WHERE id = $1{lock}",
            parent = K::PARENT_COLUMN,
            has_content = K::HAS_CONTENT_SQL,
            table = K::TABLE,
            lock = if for_update { " FOR UPDATE" } else { "" },
        )
    }

    fn not_found(id: DbId) -> RepoError {
        RepoError::Core(CoreError::NotFound {
            entity: K::KIND.entity_name(),
            id,
        })
    }

    /// Load the workflow slice of a row without locking it.
    pub async fn find(pool: &PgPool, id: DbId) -> Result<Option<WorkflowRecord>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowRecord>(&Self::record_query(false))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load and row-lock the workflow slice; `NotFound` when absent.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<WorkflowRecord, RepoError> {
        sqlx::query_as::<_, WorkflowRecord>(&Self::record_query(true))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Persist a workflow state onto the row.
    pub async fn write_state(
        conn: &mut PgConnection,
        id: DbId,
        state: &WorkflowState,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "UPDATE {} SET
                approval_status_id = $2, rejection_reason = $3, admin_remarks = $4,
                approved_by = $5, approved_at = $6, is_published = $7, published_at = $8
             WHERE id = $1",
            K::TABLE
        );
        sqlx::query(&query)
            .bind(id)
            .bind(state.status().id())
            .bind(state.rejection_reason())
            .bind(state.admin_remarks())
            .bind(state.approved_by())
            .bind(state.approved_at())
            .bind(state.is_published())
            .bind(state.published_at())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Apply `transition` atomically: lock, evaluate, write, commit.
    ///
    /// A failed guard rolls the transaction back, leaving the row untouched.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
        transition: &Transition,
    ) -> Result<WorkflowState, RepoError> {
        let mut tx = pool.begin().await?;
        let record = Self::lock(&mut tx, id).await?;
        let next = record.state()?.apply(
            transition,
            &TransitionContext {
                actor,
                owner_id: record.created_by,
                has_content: record.has_content,
                now: chrono::Utc::now(),
            },
        )?;
        Self::write_state(&mut tx, id, &next).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = actor.user_id,
            kind = K::KIND.as_str(),
            entity_id = id,
            action = transition.name(),
            status = %next.status(),
            "Workflow transition applied",
        );
        Ok(next)
    }

    /// Delete the row and update the parent's counters in one transaction.
    pub async fn delete(pool: &PgPool, id: DbId, actor: &Actor) -> Result<(), RepoError> {
        let mut tx = pool.begin().await?;
        let record = Self::lock(&mut tx, id).await?;
        record.state()?.authorize_delete(actor, record.created_by)?;

        K::detach(&mut tx, &record).await?;
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", K::TABLE))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            user_id = actor.user_id,
            kind = K::KIND.as_str(),
            entity_id = id,
            course_id = record.course_id,
            "Content deleted",
        );
        Ok(())
    }

    /// Rows of this kind across every course, most recently changed first,
    /// with their course (and module) titles.
    pub async fn list_queue(
        pool: &PgPool,
        filter: &ContentFilter,
    ) -> Result<Vec<ContentSummary>, sqlx::Error> {
        let (module_columns, module_join) = if K::IN_MODULE {
            (
                "m.id AS module_id, m.title AS module_title",
                "JOIN modules m ON m.id = t.module_id",
            )
        } else {
            ("NULL::BIGINT AS module_id, NULL::TEXT AS module_title", "")
        };
        let query = format!(
            "SELECT t.id, t.title, t.course_id, c.title AS course_title, {module_columns},
                    t.created_by, t.approval_status_id, t.is_published, t.rejection_reason,
                    t.created_at, t.updated_at
             FROM {table} t
             JOIN courses c ON c.id = t.course_id
             {module_join}
             WHERE ($1::SMALLINT IS NULL OR t.approval_status_id = $1)
               AND (NOT $2 OR t.is_published)
               AND ($3::BIGINT IS NULL OR t.created_by = $3)
             ORDER BY t.updated_at DESC, t.id DESC",
            table = K::TABLE,
        );
        sqlx::query_as::<_, ContentSummary>(&query)
            .bind(filter.status_id)
            .bind(filter.published_only)
            .bind(filter.created_by)
            .fetch_all(pool)
            .await
    }

    /// Version metadata for a versioned row; `None` when absent or the kind
    /// keeps no history.
    pub async fn history(pool: &PgPool, id: DbId) -> Result<Option<VersionHistoryRow>, sqlx::Error> {
        if !K::VERSIONED {
            return Ok(None);
        }
        let query = format!(
            "SELECT created_by, version, previous_versions FROM {} WHERE id = $1",
            K::TABLE
        );
        sqlx::query_as::<_, VersionHistoryRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Archive `previous` ahead of a payload change and bump `version`.
    ///
    /// Must run in the edit transaction after [`Self::lock`]. Returns the
    /// new version number.
    pub async fn archive_previous(
        conn: &mut PgConnection,
        id: DbId,
        previous: &serde_json::Value,
        previous_non_empty: bool,
        saved_by: DbId,
        now: Timestamp,
    ) -> Result<i32, sqlx::Error> {
        let select = format!(
            "SELECT version, previous_versions FROM {} WHERE id = $1",
            K::TABLE
        );
        let (current_version, Json(mut history)) =
            sqlx::query_as::<_, (i32, Json<VersionHistory>)>(&select)
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;

        let version = history.archive(current_version, previous, previous_non_empty, saved_by, now);

        let update = format!(
            "UPDATE {} SET version = $2, previous_versions = $3 WHERE id = $1",
            K::TABLE
        );
        sqlx::query(&update)
            .bind(id)
            .bind(version)
            .bind(Json(&history))
            .execute(&mut *conn)
            .await?;
        Ok(version)
    }
}
