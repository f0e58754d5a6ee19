//! Repository for the `exam_attempts` table.

use lms_core::assessment::{check_eligibility, score_answers};
use lms_core::enrollment::EnrollmentStatus;
use lms_core::error::CoreError;
use lms_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::error::RepoError;
use crate::models::exam_attempt::{
    ExamAttempt, ExamAttemptStats, ExamEligibility, GradingExam,
};

/// Column list for exam_attempts queries.
const COLUMNS: &str = "id, exam_id, student_id, course_id, answers, correct_count, \
    total_questions, score_percent, passing_score, passed, exam_version, submitted_at, \
    created_at, updated_at";

/// Provides grading and history for exam attempts.
pub struct ExamAttemptRepo;

impl ExamAttemptRepo {
    async fn is_enrolled(
        conn: &mut PgConnection,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let id = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM enrollments
             WHERE student_id = $1 AND course_id = $2 AND status_id = ANY($3)
             LIMIT 1",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(EnrollmentStatus::access_ids())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(id.is_some())
    }

    async fn percent_complete(
        conn: &mut PgConnection,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let percent = sqlx::query_scalar::<_, i32>(
            "SELECT percent_complete FROM progress_records
             WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(percent.unwrap_or(0))
    }

    /// Grade `answers` against the exam's key and record the attempt.
    ///
    /// The student must be eligible: enrolled, the exam published, and the
    /// course percentage at or above the exam's activation threshold.
    pub async fn submit(
        pool: &PgPool,
        student_id: DbId,
        exam_id: DbId,
        answers: &[Vec<usize>],
    ) -> Result<ExamAttempt, RepoError> {
        let mut tx = pool.begin().await?;

        let exam = sqlx::query_as::<_, GradingExam>(
            "SELECT id, course_id, passing_score, activation_threshold, questions, version,
                    is_published
             FROM exams WHERE id = $1",
        )
        .bind(exam_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Exam",
            id: exam_id,
        })?;

        let enrolled = Self::is_enrolled(&mut tx, student_id, exam.course_id).await?;
        let percent = Self::percent_complete(&mut tx, student_id, exam.course_id).await?;
        check_eligibility(enrolled, exam.is_published, percent, exam.activation_threshold)
            .require()?;

        let score = score_answers(&exam.questions.0, answers, exam.passing_score)?;

        let query = format!(
            "INSERT INTO exam_attempts
                (exam_id, student_id, course_id, answers, correct_count, total_questions,
                 score_percent, passing_score, passed, exam_version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        let attempt = sqlx::query_as::<_, ExamAttempt>(&query)
            .bind(exam.id)
            .bind(student_id)
            .bind(exam.course_id)
            .bind(Json(answers))
            .bind(score.correct_count)
            .bind(score.total_questions)
            .bind(score.score_percent)
            .bind(exam.passing_score)
            .bind(score.passed)
            .bind(exam.version)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = student_id,
            exam_id,
            course_id = exam.course_id,
            attempt_id = attempt.id,
            score_percent = attempt.score_percent,
            passed = attempt.passed,
            "Exam attempt graded",
        );
        Ok(attempt)
    }

    /// A student's attempts at an exam, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
        exam_id: DbId,
    ) -> Result<Vec<ExamAttempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM exam_attempts
             WHERE student_id = $1 AND exam_id = $2
             ORDER BY submitted_at DESC, id DESC"
        );
        sqlx::query_as::<_, ExamAttempt>(&query)
            .bind(student_id)
            .bind(exam_id)
            .fetch_all(pool)
            .await
    }

    /// Eligibility and attempt totals for every published exam of a course.
    pub async fn eligibility_for_course(
        pool: &PgPool,
        student_id: DbId,
        course_id: DbId,
    ) -> Result<Vec<ExamEligibility>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let enrolled = Self::is_enrolled(&mut conn, student_id, course_id).await?;
        let percent = Self::percent_complete(&mut conn, student_id, course_id).await?;

        let stats = sqlx::query_as::<_, ExamAttemptStats>(
            "SELECT e.id AS exam_id, e.title, e.passing_score, e.activation_threshold,
                    COUNT(a.id) AS attempts,
                    MAX(a.score_percent) AS best_score,
                    COALESCE(BOOL_OR(a.passed), false) AS passed
             FROM exams e
             LEFT JOIN exam_attempts a ON a.exam_id = e.id AND a.student_id = $2
             WHERE e.course_id = $1 AND e.is_published
             GROUP BY e.id
             ORDER BY e.created_at ASC, e.id ASC",
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(stats
            .into_iter()
            .map(|s| ExamEligibility {
                eligibility: check_eligibility(enrolled, true, percent, s.activation_threshold),
                exam_id: s.exam_id,
                title: s.title,
                passing_score: s.passing_score,
                activation_threshold: s.activation_threshold,
                percent_complete: percent,
                attempts: s.attempts,
                best_score: s.best_score,
                passed: s.passed,
            })
            .collect())
    }
}
