//! Lesson models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;
use lms_core::types::{DbId, Timestamp};

use super::validate_title;

/// Valid values of `lessons.video_type`.
pub const VALID_VIDEO_TYPES: &[&str] = &["upload", "youtube", "vimeo", "external"];

/// A downloadable file attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonResource {
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub file_name: String,
    pub size_bytes: i64,
}

/// A row from the `lessons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lesson {
    pub id: DbId,
    pub module_id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub content: serde_json::Value,
    pub sort_order: i32,
    pub duration_mins: Option<i32>,
    pub video_url: Option<String>,
    pub video_type: String,
    pub video_duration_secs: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub resources: Json<Vec<LessonResource>>,
    pub is_free_preview: bool,
    pub preview_duration_secs: Option<i32>,
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

/// DTO for creating a lesson. `content` is validated by the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLesson {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub content: Option<serde_json::Value>,
    #[validate(range(min = 0))]
    pub duration_mins: Option<i32>,
    pub video_url: Option<String>,
    pub video_type: Option<String>,
    #[validate(range(min = 0))]
    pub video_duration_secs: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub is_free_preview: Option<bool>,
    #[validate(range(min = 0))]
    pub preview_duration_secs: Option<i32>,
}

/// DTO for editing a lesson. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLesson {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub content: Option<serde_json::Value>,
    #[validate(range(min = 0))]
    pub duration_mins: Option<i32>,
    pub video_url: Option<String>,
    pub video_type: Option<String>,
    #[validate(range(min = 0))]
    pub video_duration_secs: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub is_free_preview: Option<bool>,
    #[validate(range(min = 0))]
    pub preview_duration_secs: Option<i32>,
}
