//! Repository for the `exams` table.

use sqlx::types::Json;
use sqlx::PgPool;
use lms_core::approval::Actor;
use lms_core::content::ExamQuestion;
use lms_core::error::CoreError;
use lms_core::types::DbId;

use crate::error::RepoError;
use crate::models::exam::{CreateExam, Exam, UpdateExam};
use crate::models::workflow::ContentFilter;
use crate::repositories::workflow_repo::{bind_filter, ExamKind, WorkflowRepo, FILTER_SQL};

/// Column list for exams queries.
const COLUMNS: &str = "id, course_id, title, description, duration_mins, passing_score, \
    activation_threshold, questions, version, created_by, approval_status_id, \
    rejection_reason, admin_remarks, approved_by, approved_at, is_published, published_at, \
    created_at, updated_at";

/// Provides CRUD operations for exams.
pub struct ExamRepo;

impl ExamRepo {
    /// Insert a Draft exam and bump the course's exam counter in the same
    /// transaction. Questions must already be validated.
    pub async fn create(
        pool: &PgPool,
        course_id: DbId,
        created_by: DbId,
        input: &CreateExam,
    ) -> Result<Exam, RepoError> {
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
            "INSERT INTO exams
                (course_id, title, description, duration_mins, passing_score,
                 activation_threshold, questions, created_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, 70), COALESCE($6, 0), $7, $8)
             RETURNING {COLUMNS}"
        );
        let exam = sqlx::query_as::<_, Exam>(&query)
            .bind(course_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(input.duration_mins)
            .bind(input.passing_score)
            .bind(input.activation_threshold)
            .bind(Json(&input.questions))
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE courses SET total_exams = total_exams + 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(exam)
    }

    /// Find an exam by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Exam>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM exams WHERE id = $1");
        sqlx::query_as::<_, Exam>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List exams of a course, newest first.
    pub async fn list_for_course(
        pool: &PgPool,
        course_id: DbId,
        filter: &ContentFilter,
    ) -> Result<Vec<Exam>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM exams
             WHERE course_id = $1 AND {FILTER_SQL}
             ORDER BY created_at DESC, id DESC"
        );
        bind_filter(sqlx::query_as::<_, Exam>(&query).bind(course_id), filter)
            .fetch_all(pool)
            .await
    }

    /// Apply an edit. A change to the question list is versioned like a
    /// document change.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
        input: &UpdateExam,
    ) -> Result<Exam, RepoError> {
        let mut tx = pool.begin().await?;
        let record = WorkflowRepo::<ExamKind>::lock(&mut tx, id).await?;
        let state = record.state()?;
        state.authorize_edit(actor, record.created_by)?;

        let Json(current): Json<Vec<ExamQuestion>> =
            sqlx::query_scalar("SELECT questions FROM exams WHERE id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let new_questions = input.questions.as_ref().filter(|q| **q != current);

        if let Some(new) = new_questions {
            let previous = serde_json::to_value(&current)
                .map_err(|e| CoreError::Internal(format!("Failed to archive questions: {e}")))?;
            WorkflowRepo::<ExamKind>::archive_previous(
                &mut tx,
                id,
                &previous,
                !current.is_empty(),
                actor.user_id,
                chrono::Utc::now(),
            )
            .await?;
            let next = state.after_edit(actor, true, !new.is_empty());
            WorkflowRepo::<ExamKind>::write_state(&mut tx, id, &next).await?;
        }

        let query = format!(
            "UPDATE exams SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                duration_mins = COALESCE($4, duration_mins),
                passing_score = COALESCE($5, passing_score),
                activation_threshold = COALESCE($6, activation_threshold),
                questions = COALESCE($7, questions)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let exam = sqlx::query_as::<_, Exam>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.duration_mins)
            .bind(input.passing_score)
            .bind(input.activation_threshold)
            .bind(new_questions.map(Json))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(exam)
    }
}
