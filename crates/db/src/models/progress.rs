//! Course progress models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use lms_core::types::{DbId, Timestamp};

/// A row from the `progress_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgressRecord {
    pub id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub completed_module_ids: Vec<DbId>,
    pub percent_complete: i32,
    pub last_accessed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `module_progress` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleProgressRow {
    pub module_id: DbId,
    pub time_spent_secs: i64,
    pub completed: bool,
    pub last_updated_at: Timestamp,
}

/// Request body for `POST /progress`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordProgress {
    pub course_id: DbId,
    pub module_id: DbId,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub time_spent_secs: i64,
}

/// Result of recording study time on a module.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub course_id: DbId,
    pub module_id: DbId,
    pub time_spent_secs: i64,
    pub completed: bool,
    pub newly_completed: bool,
    pub percent_complete: i32,
    /// Next approved module by ordering key, set only when this call
    /// completed the module.
    pub next_module_id: Option<DbId>,
}

/// A student's progress in one course, as returned by `GET /progress/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub course_id: DbId,
    pub percent_complete: i32,
    pub completed_module_ids: Vec<DbId>,
    pub modules: Vec<ModuleProgressRow>,
    pub last_accessed_at: Option<Timestamp>,
}

impl ProgressSummary {
    /// Summary for a student who has not recorded any time yet.
    pub fn empty(course_id: DbId) -> Self {
        Self {
            course_id,
            percent_complete: 0,
            completed_module_ids: Vec::new(),
            modules: Vec::new(),
            last_accessed_at: None,
        }
    }
}
