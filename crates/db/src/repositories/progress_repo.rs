//! Repository for the `progress_records` and `module_progress` tables.

use sqlx::PgPool;
use lms_core::approval::ApprovalStatus;
use lms_core::enrollment::EnrollmentStatus;
use lms_core::error::CoreError;
use lms_core::progress::{CourseProgress, ModuleProgress};
use lms_core::types::DbId;

use crate::error::RepoError;
use crate::models::progress::{
    ModuleProgressRow, ProgressRecord, ProgressSummary, ProgressUpdate, RecordProgress,
};

/// Column list for progress_records queries.
const COLUMNS: &str = "id, student_id, course_id, completed_module_ids, percent_complete, \
    last_accessed_at, created_at, updated_at";

/// Column list for module_progress queries.
const MODULE_COLUMNS: &str = "module_id, time_spent_secs, completed, last_updated_at";

/// Provides progress tracking operations.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Add study time to a module and recompute the course percentage.
    ///
    /// The record is created on first use (`ON CONFLICT DO NOTHING`) and then
    /// row-locked, so concurrent calls for the same student and course apply
    /// one after another and no delta is lost.
    pub async fn record_time(
        pool: &PgPool,
        student_id: DbId,
        input: &RecordProgress,
    ) -> Result<ProgressUpdate, RepoError> {
        let mut tx = pool.begin().await?;

        let (module_course_id, duration_mins) = sqlx::query_as::<_, (DbId, Option<i32>)>(
            "SELECT course_id, duration_mins FROM modules WHERE id = $1",
        )
        .bind(input.module_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Module",
            id: input.module_id,
        })?;
        if module_course_id != input.course_id {
            return Err(CoreError::Validation(format!(
                "Module {} does not belong to course {}",
                input.module_id, input.course_id
            ))
            .into());
        }

        let access_statuses = EnrollmentStatus::access_ids();
        let enrolled = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM enrollments
             WHERE student_id = $1 AND course_id = $2 AND status_id = ANY($3)
             LIMIT 1",
        )
        .bind(student_id)
        .bind(input.course_id)
        .bind(&access_statuses)
        .fetch_optional(&mut *tx)
        .await?;
        if enrolled.is_none() {
            return Err(CoreError::Forbidden(
                "You must be enrolled in this course to record progress".into(),
            )
            .into());
        }

        sqlx::query(
            "INSERT INTO progress_records (student_id, course_id)
             VALUES ($1, $2)
             ON CONFLICT (student_id, course_id) DO NOTHING",
        )
        .bind(student_id)
        .bind(input.course_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM progress_records
             WHERE student_id = $1 AND course_id = $2
             FOR UPDATE"
        );
        let record = sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(student_id)
            .bind(input.course_id)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!("SELECT {MODULE_COLUMNS} FROM module_progress WHERE progress_id = $1");
        let rows = sqlx::query_as::<_, ModuleProgressRow>(&query)
            .bind(record.id)
            .fetch_all(&mut *tx)
            .await?;

        let approved_ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT id FROM modules WHERE course_id = $1 AND approval_status_id = $2",
        )
        .bind(input.course_id)
        .bind(ApprovalStatus::Approved.id())
        .fetch_all(&mut *tx)
        .await?;

        let mut progress = CourseProgress {
            modules: rows
                .into_iter()
                .map(|r| ModuleProgress {
                    module_id: r.module_id,
                    time_spent_secs: r.time_spent_secs,
                    completed: r.completed,
                    last_updated: r.last_updated_at,
                })
                .collect(),
            completed_module_ids: record.completed_module_ids,
            percent_complete: record.percent_complete,
        };
        let now = chrono::Utc::now();
        let outcome = progress.record_time(
            input.module_id,
            duration_mins,
            input.time_spent_secs,
            &approved_ids,
            now,
        )?;

        sqlx::query(
            "INSERT INTO module_progress
                (progress_id, module_id, time_spent_secs, completed, last_updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (progress_id, module_id) DO UPDATE SET
                time_spent_secs = EXCLUDED.time_spent_secs,
                completed = EXCLUDED.completed,
                last_updated_at = EXCLUDED.last_updated_at",
        )
        .bind(record.id)
        .bind(outcome.module_id)
        .bind(outcome.time_spent_secs)
        .bind(outcome.completed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE progress_records SET
                completed_module_ids = $2, percent_complete = $3, last_accessed_at = $4
             WHERE id = $1",
        )
        .bind(record.id)
        .bind(&progress.completed_module_ids)
        .bind(progress.percent_complete)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Mirror onto the enrollment; completion of the course is sticky.
        sqlx::query(
            "UPDATE enrollments SET
                percent_complete = $3,
                completed = completed OR $3 = 100,
                status_id = CASE WHEN $3 = 100 THEN $4 ELSE status_id END
             WHERE student_id = $1 AND course_id = $2 AND status_id = ANY($5)",
        )
        .bind(student_id)
        .bind(input.course_id)
        .bind(progress.percent_complete)
        .bind(EnrollmentStatus::Completed.id())
        .bind(&access_statuses)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let next_module_id = if outcome.newly_completed {
            tracing::info!(
                user_id = student_id,
                course_id = input.course_id,
                module_id = input.module_id,
                percent_complete = outcome.percent_complete,
                "Module completed",
            );
            Self::next_approved_module(pool, input.course_id, input.module_id).await?
        } else {
            None
        };

        Ok(ProgressUpdate {
            course_id: input.course_id,
            module_id: outcome.module_id,
            time_spent_secs: outcome.time_spent_secs,
            completed: outcome.completed,
            newly_completed: outcome.newly_completed,
            percent_complete: outcome.percent_complete,
            next_module_id,
        })
    }

    /// The approved module that follows `module_id` by ordering key.
    pub async fn next_approved_module(
        pool: &PgPool,
        course_id: DbId,
        module_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM modules
             WHERE course_id = $1
               AND approval_status_id = $3
               AND sort_order > (SELECT sort_order FROM modules WHERE id = $2)
             ORDER BY sort_order ASC
             LIMIT 1",
        )
        .bind(course_id)
        .bind(module_id)
        .bind(ApprovalStatus::Approved.id())
        .fetch_optional(pool)
        .await
    }

    /// A student's progress in a course, or an empty summary when no time has
    /// been recorded yet.
    pub async fn summary(
        pool: &PgPool,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<ProgressSummary, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM progress_records WHERE student_id = $1 AND course_id = $2"
        );
        let Some(record) = sqlx::query_as::<_, ProgressRecord>(&query)
            .bind(student_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(ProgressSummary::empty(course_id));
        };

        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM module_progress
             WHERE progress_id = $1
             ORDER BY id ASC"
        );
        let modules = sqlx::query_as::<_, ModuleProgressRow>(&query)
            .bind(record.id)
            .fetch_all(pool)
            .await?;

        Ok(ProgressSummary {
            course_id,
            percent_complete: record.percent_complete,
            completed_module_ids: record.completed_module_ids,
            modules,
            last_accessed_at: Some(record.last_accessed_at),
        })
    }
}
