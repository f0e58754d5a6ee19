//! Course material models (uploaded files).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use lms_core::types::{DbId, Timestamp};

use super::validate_title;

/// A row from the `materials` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Material {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub material_type: String,
    pub category: String,
    pub file_url: String,
    pub file_name: String,
    pub file_size_bytes: i64,
    pub preview_duration_secs: Option<i32>,
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

/// Metadata for a material upload. The file itself arrives as a multipart
/// part and is stored before the row is inserted.
#[derive(Debug, Clone, Default, Validate)]
pub struct CreateMaterial {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub material_type: String,
    /// Resolved category (see `lms_core::content::material_category`).
    pub category: String,
    #[validate(range(min = 0))]
    pub preview_duration_secs: Option<i32>,
}

/// DTO for editing material metadata.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMaterial {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub preview_duration_secs: Option<i32>,
}
