//! Exam attempt models.

use lms_core::assessment::Eligibility;
use lms_core::content::ExamQuestion;
use lms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `exam_attempts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamAttempt {
    pub id: DbId,
    pub exam_id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub answers: Json<Vec<Vec<usize>>>,
    pub correct_count: i32,
    pub total_questions: i32,
    pub score_percent: i32,
    /// Passing score in force when the attempt was graded.
    pub passing_score: i32,
    pub passed: bool,
    pub exam_version: i32,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for `POST /exams/{id}/attempts`: the chosen option indices
/// for each question, in question order.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAttempt {
    pub answers: Vec<Vec<usize>>,
}

/// The exam columns needed to grade a submission.
#[derive(Debug, Clone, FromRow)]
pub struct GradingExam {
    pub id: DbId,
    pub course_id: DbId,
    pub passing_score: i32,
    pub activation_threshold: i32,
    pub questions: Json<Vec<ExamQuestion>>,
    pub version: i32,
    pub is_published: bool,
}

/// A published exam with the student's attempt totals.
#[derive(Debug, Clone, FromRow)]
pub struct ExamAttemptStats {
    pub exam_id: DbId,
    pub title: String,
    pub passing_score: i32,
    pub activation_threshold: i32,
    pub attempts: i64,
    pub best_score: Option<i32>,
    pub passed: bool,
}

/// One entry of `GET /courses/{id}/exam-eligibility`.
#[derive(Debug, Clone, Serialize)]
pub struct ExamEligibility {
    pub exam_id: DbId,
    pub title: String,
    pub passing_score: i32,
    pub activation_threshold: i32,
    pub percent_complete: i32,
    #[serde(flatten)]
    pub eligibility: Eligibility,
    pub attempts: i64,
    pub best_score: Option<i32>,
    pub passed: bool,
}
