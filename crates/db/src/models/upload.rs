//! Ownership of stored upload files.

use lms_core::types::DbId;
use sqlx::FromRow;

/// The content row a stored file belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct UploadOwner {
    pub entity_id: DbId,
    pub course_id: DbId,
    pub created_by: DbId,
    pub is_published: bool,
}
