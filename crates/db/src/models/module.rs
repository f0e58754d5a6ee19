//! Course module models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use lms_core::types::{DbId, Timestamp};

use super::validate_title;

/// A row from the `modules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Module {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub content: serde_json::Value,
    pub sort_order: i32,
    pub duration_mins: Option<i32>,
    pub lesson_ids: Vec<DbId>,
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

/// DTO for creating a module. `content` is validated by the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateModule {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub content: Option<serde_json::Value>,
    #[validate(range(min = 0))]
    pub duration_mins: Option<i32>,
}

/// DTO for editing a module. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateModule {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub content: Option<serde_json::Value>,
    #[validate(range(min = 0))]
    pub duration_mins: Option<i32>,
}
