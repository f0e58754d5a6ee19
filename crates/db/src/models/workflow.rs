//! Approval workflow columns shared by every content table.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use lms_core::approval::{ApprovalStatus, ContentKind, PersistedWorkflow, WorkflowState};
use lms_core::error::CoreError;
use lms_core::types::{DbId, Timestamp};
use lms_core::versioning::{ContentSnapshot, VersionHistory};

/// Workflow columns as they appear in every content table, in the order the
/// repositories select and update them.
pub const WORKFLOW_COLUMNS: &str = "approval_status_id, rejection_reason, admin_remarks, \
    approved_by, approved_at, is_published, published_at";

/// The slice of a content row needed to evaluate a workflow transition.
#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRecord {
    pub id: DbId,
    pub course_id: DbId,
    /// Course for modules, materials and exams; module for lessons.
    pub parent_id: DbId,
    pub created_by: DbId,
    pub approval_status_id: i16,
    pub rejection_reason: Option<String>,
    pub admin_remarks: Option<String>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub published_at: Option<Timestamp>,
    /// Whether the payload has at least one block, question or file.
    pub has_content: bool,
}

impl WorkflowRecord {
    /// Rebuild the engine state from the persisted columns.
    pub fn state(&self) -> Result<WorkflowState, CoreError> {
        Ok(WorkflowState::restore(PersistedWorkflow {
            status: ApprovalStatus::from_id(self.approval_status_id)?,
            rejection_reason: self.rejection_reason.clone(),
            admin_remarks: self.admin_remarks.clone(),
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            published_at: self.published_at,
        }))
    }
}

/// Response body for a workflow transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionResult {
    pub kind: ContentKind,
    pub id: DbId,
    pub action: &'static str,
    #[serde(flatten)]
    pub state: WorkflowState,
}

/// Filters accepted by the per-parent list queries.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub status_id: Option<i16>,
    /// Restrict to published rows (student view).
    pub published_only: bool,
    /// Restrict to rows created by this user (staff dashboard).
    pub created_by: Option<DbId>,
}

/// One row of a cross-course review queue.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentSummary {
    pub id: DbId,
    pub title: String,
    pub course_id: DbId,
    pub course_title: String,
    /// Set for lessons only.
    pub module_id: Option<DbId>,
    pub module_title: Option<String>,
    pub created_by: DbId,
    pub approval_status_id: i16,
    pub is_published: bool,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Version metadata of a versioned content row.
#[derive(Debug, Clone, FromRow)]
pub struct VersionHistoryRow {
    pub created_by: DbId,
    pub version: i32,
    pub previous_versions: Json<VersionHistory>,
}

/// Response body for `GET /{kind}/{id}/versions`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionListing {
    pub id: DbId,
    pub current_version: i32,
    pub versions: Vec<ContentSnapshot>,
}

/// Request body for `PUT /{kind}/{id}/approve`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApproveRequest {
    pub remarks: Option<String>,
}

/// Request body for `PUT /{kind}/{id}/request-corrections`.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectRequest {
    #[serde(alias = "rejection_reason")]
    pub reason: String,
    pub remarks: Option<String>,
}
