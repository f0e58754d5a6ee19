//! Repository for the `enrollments` and `student_courses` tables.

use sqlx::PgPool;
use lms_core::approval::Actor;
use lms_core::enrollment::{authorize_withdraw, EnrollmentStatus};
use lms_core::error::CoreError;
use lms_core::types::DbId;

use crate::error::RepoError;
use crate::models::enrollment::{Enrollment, EnrollmentWithCourse};

/// Column list for enrollments queries.
const COLUMNS: &str = "id, student_id, course_id, status_id, enrolled_at, completed, \
    percent_complete, withdrawn_at, created_at, updated_at";

/// Provides CRUD operations for enrollments.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Enroll a student in a course.
    ///
    /// Fails with `NotFound` for an unknown course and `Conflict` when the
    /// student is already enrolled (active or completed). Two concurrent
    /// requests that both pass the check are separated by
    /// `uq_enrollments_current_student_course`.
    pub async fn enroll(
        pool: &PgPool,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<Enrollment, RepoError> {
        let mut tx = pool.begin().await?;

        sqlx::query_scalar::<_, DbId>("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Course",
                id: course_id,
            })?;

        let existing = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM enrollments
             WHERE student_id = $1 AND course_id = $2 AND status_id = ANY($3)
             LIMIT 1",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(EnrollmentStatus::access_ids())
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(CoreError::Conflict("Already enrolled in this course".into()).into());
        }

        let query = format!(
            "INSERT INTO enrollments (student_id, course_id, status_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(student_id)
            .bind(course_id)
            .bind(EnrollmentStatus::Active.id())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO student_courses (student_id, course_id)
             VALUES ($1, $2)
             ON CONFLICT (student_id, course_id) DO NOTHING",
        )
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = student_id,
            course_id,
            enrollment_id = enrollment.id,
            "Student enrolled",
        );
        Ok(enrollment)
    }

    /// Find an enrollment by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The student's current enrollment in a course, if any. A completed
    /// enrollment still counts; a withdrawn one does not.
    pub async fn find_current(
        pool: &PgPool,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments
             WHERE student_id = $1 AND course_id = $2 AND status_id = ANY($3)
             ORDER BY enrolled_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(student_id)
            .bind(course_id)
            .bind(EnrollmentStatus::access_ids())
            .fetch_optional(pool)
            .await
    }

    /// All of a student's enrollments with a course summary, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
        sqlx::query_as::<_, EnrollmentWithCourse>(
            "SELECT e.id, e.student_id, e.course_id, e.status_id, e.enrolled_at,
                    e.completed, e.percent_complete,
                    c.title AS course_title,
                    c.description AS course_description,
                    c.category AS course_category,
                    c.thumbnail_url AS course_thumbnail_url,
                    c.price_cents AS course_price_cents
             FROM enrollments e
             JOIN courses c ON c.id = e.course_id
             WHERE e.student_id = $1
             ORDER BY e.enrolled_at DESC, e.id DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }

    /// Ids of every course the student has ever enrolled in.
    pub async fn course_ids_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT course_id FROM student_courses WHERE student_id = $1 ORDER BY added_at",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }

    /// Withdraw an active enrollment, freeing the student to enroll again.
    pub async fn withdraw(pool: &PgPool, id: DbId, actor: &Actor) -> Result<Enrollment, RepoError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Enrollment",
                id,
            })?;
        authorize_withdraw(
            actor,
            current.student_id,
            EnrollmentStatus::from_id(current.status_id)?,
        )?;

        let query = format!(
            "UPDATE enrollments SET status_id = $2, withdrawn_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .bind(EnrollmentStatus::Withdrawn.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = actor.user_id,
            enrollment_id = id,
            course_id = enrollment.course_id,
            "Enrollment withdrawn",
        );
        Ok(enrollment)
    }
}
