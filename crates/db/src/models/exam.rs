//! Exam models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;
use lms_core::content::ExamQuestion;
use lms_core::types::{DbId, Timestamp};

use super::validate_title;

/// A row from the `exams` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Exam {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub duration_mins: Option<i32>,
    pub passing_score: i32,
    /// Course completion percentage at which the exam unlocks.
    pub activation_threshold: i32,
    pub questions: Json<Vec<ExamQuestion>>,
    pub version: i32,
    pub created_by: DbId,
    pub approval_status_id: i16,
    pub rejection_reason: Option<String>,
    pub admin_remarks: Option<String>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an exam. Questions are validated by the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExam {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub duration_mins: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub activation_threshold: Option<i32>,
    #[serde(default)]
    pub questions: Vec<ExamQuestion>,
}

/// DTO for editing an exam. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateExam {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub duration_mins: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub activation_threshold: Option<i32>,
    pub questions: Option<Vec<ExamQuestion>>,
}
