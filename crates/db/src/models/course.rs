//! Course models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use lms_core::types::{DbId, Timestamp};

use super::validate_title;

/// A row from the `courses` table, including denormalized child counters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail_url: Option<String>,
    pub price_cents: i64,
    pub created_by: DbId,
    pub module_ids: Vec<DbId>,
    pub total_modules: i32,
    pub total_lessons: i32,
    pub total_materials: i32,
    pub total_exams: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a course.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourse {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail_url: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
}
