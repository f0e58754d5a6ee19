//! Approval workflow engine shared by modules, lessons, materials and exams.
//!
//! The engine is storage-independent: [`WorkflowState::apply`] validates a
//! [`Transition`] against the actor and the entity's current state and
//! returns the next state without mutating the original. Persistence and the
//! per-kind side effects (parent counters, ordered child lists) live in the
//! repository layer.
//!
//! State machine:
//!
//! ```text
//! Draft ──submit──▶ Pending ──approve──▶ Approved
//!   ▲                 │  ▲                  │
//!   │              reject│  └──unpublish─────┘
//!   │                 ▼  │
//!   └──edit(empty)── Rejected ──submit / edit──▶ Pending
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::ROLE_ADMIN;
use crate::types::{DbId, Timestamp};

/// Minimum length (in characters, after trimming) of a rejection reason.
pub const MIN_REJECTION_REASON_CHARS: usize = 10;

/// Status ID type matching the SMALLINT `approval_statuses` lookup table.
pub type ApprovalStatusId = i16;

// ---------------------------------------------------------------------------
// Status and kind enums
// ---------------------------------------------------------------------------

/// Approval lifecycle status. Discriminants match the `approval_statuses`
/// seed data.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft = 1,
    Pending = 2,
    Approved = 3,
    Rejected = 4,
}

impl ApprovalStatus {
    /// Return the database status ID.
    pub fn id(self) -> ApprovalStatusId {
        self as ApprovalStatusId
    }

    /// Map a database status ID back to the enum.
    pub fn from_id(id: ApprovalStatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Draft),
            2 => Ok(Self::Pending),
            3 => Ok(Self::Approved),
            4 => Ok(Self::Rejected),
            other => Err(CoreError::Internal(format!(
                "Unknown approval status id {other}"
            ))),
        }
    }

    /// Parse from a query-string value such as `?status=pending`.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid approval status '{other}'. Must be one of: draft, pending, approved, rejected"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four kinds of authored material governed by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Module,
    Lesson,
    Material,
    Exam,
}

impl ContentKind {
    /// Entity name used in `NotFound` errors and log lines.
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::Module => "Module",
            Self::Lesson => "Lesson",
            Self::Material => "Material",
            Self::Exam => "Exam",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Lesson => "lesson",
            Self::Material => "material",
            Self::Exam => "exam",
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The authenticated account performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: DbId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Whether the actor owns the entity or is an admin.
    pub fn owns_or_admin(&self, owner_id: DbId) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

// ---------------------------------------------------------------------------
// Workflow state
// ---------------------------------------------------------------------------

/// Approval-related fields of a content entity.
///
/// Fields are private: a state is built with [`WorkflowState::draft`] or
/// [`WorkflowState::restore`] and changed only through the transition API,
/// which keeps `is_published == (status == Approved)`, keeps the rejection
/// reason only while Rejected, and keeps approver metadata only while
/// Approved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowState {
    status: ApprovalStatus,
    rejection_reason: Option<String>,
    admin_remarks: Option<String>,
    approved_by: Option<DbId>,
    approved_at: Option<Timestamp>,
    is_published: bool,
    published_at: Option<Timestamp>,
}

/// Raw workflow columns as persisted, used to rebuild a [`WorkflowState`].
#[derive(Debug, Clone)]
pub struct PersistedWorkflow {
    pub status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub admin_remarks: Option<String>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub published_at: Option<Timestamp>,
}

/// An approval transition requested by an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Draft/Rejected -> Pending.
    Submit,
    /// Any -> Approved (admin).
    Approve { remarks: Option<String> },
    /// Any -> Rejected with a reason (admin).
    Reject {
        reason: String,
        remarks: Option<String>,
    },
    /// Approved -> Pending, publication withdrawn (admin).
    Unpublish,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::Unpublish => "unpublish",
        }
    }
}

/// Facts about the entity and request needed to evaluate a transition.
#[derive(Debug, Clone)]
pub struct TransitionContext<'a> {
    pub actor: &'a Actor,
    pub owner_id: DbId,
    /// Whether the content payload has at least one block/question/file.
    pub has_content: bool,
    pub now: Timestamp,
}

impl WorkflowState {
    /// State of a freshly created entity.
    pub fn draft() -> Self {
        Self {
            status: ApprovalStatus::Draft,
            rejection_reason: None,
            admin_remarks: None,
            approved_by: None,
            approved_at: None,
            is_published: false,
            published_at: None,
        }
    }

    /// Rebuild a state from persisted columns, normalizing derived fields.
    pub fn restore(persisted: PersistedWorkflow) -> Self {
        Self {
            status: persisted.status,
            rejection_reason: persisted.rejection_reason,
            admin_remarks: persisted.admin_remarks,
            approved_by: persisted.approved_by,
            approved_at: persisted.approved_at,
            is_published: false,
            published_at: persisted.published_at,
        }
        .normalized()
    }

    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn admin_remarks(&self) -> Option<&str> {
        self.admin_remarks.as_deref()
    }

    pub fn approved_by(&self) -> Option<DbId> {
        self.approved_by
    }

    pub fn approved_at(&self) -> Option<Timestamp> {
        self.approved_at
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }

    /// Evaluate `transition` and return the resulting state.
    ///
    /// Authorization is checked before validation. On error `self` is
    /// untouched, so a rejected request leaves no partial mutation.
    pub fn apply(
        &self,
        transition: &Transition,
        ctx: &TransitionContext<'_>,
    ) -> Result<Self, CoreError> {
        let mut next = self.clone();

        match transition {
            Transition::Submit => {
                if !ctx.actor.owns_or_admin(ctx.owner_id) {
                    return Err(CoreError::Forbidden(
                        "You can only submit your own content".into(),
                    ));
                }
                if self.status == ApprovalStatus::Approved {
                    return Err(CoreError::Validation(
                        "Approved content cannot be resubmitted; unpublish it first".into(),
                    ));
                }
                if !ctx.has_content {
                    return Err(CoreError::Validation(
                        "Cannot submit empty content for approval".into(),
                    ));
                }
                next.status = ApprovalStatus::Pending;
            }
            Transition::Approve { remarks } => {
                require_admin(ctx.actor, "approve content")?;
                next.status = ApprovalStatus::Approved;
                next.admin_remarks = non_empty(remarks.as_deref());
                next.approved_by = Some(ctx.actor.user_id);
                next.approved_at = Some(ctx.now);
                next.published_at = Some(ctx.now);
            }
            Transition::Reject { reason, remarks } => {
                require_admin(ctx.actor, "request corrections")?;
                let reason = validate_rejection_reason(reason)?;
                next.status = ApprovalStatus::Rejected;
                next.admin_remarks =
                    non_empty(remarks.as_deref()).or_else(|| Some(reason.clone()));
                next.rejection_reason = Some(reason);
            }
            Transition::Unpublish => {
                require_admin(ctx.actor, "unpublish content")?;
                if self.status != ApprovalStatus::Approved {
                    return Err(CoreError::Validation(
                        "Only approved content can be unpublished".into(),
                    ));
                }
                next.status = ApprovalStatus::Pending;
            }
        }

        Ok(next.normalized())
    }

    /// Check that `actor` may edit an entity owned by `owner_id`.
    ///
    /// Owners may edit until the entity is approved; admins may always edit.
    pub fn authorize_edit(&self, actor: &Actor, owner_id: DbId) -> Result<(), CoreError> {
        if !actor.owns_or_admin(owner_id) {
            return Err(CoreError::Forbidden(
                "You can only edit content you created".into(),
            ));
        }
        if self.status == ApprovalStatus::Approved && !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "Cannot edit approved content".into(),
            ));
        }
        Ok(())
    }

    /// State after an authorized edit.
    ///
    /// A payload change by a non-admin sends the entity back for review
    /// (Pending), or to Draft when the new payload is empty. Admin edits and
    /// metadata-only edits leave the status alone.
    pub fn after_edit(&self, actor: &Actor, payload_changed: bool, has_content: bool) -> Self {
        if actor.is_admin() || !payload_changed {
            return self.clone();
        }
        let mut next = self.clone();
        next.status = if has_content {
            ApprovalStatus::Pending
        } else {
            ApprovalStatus::Draft
        };
        next.normalized()
    }

    /// Check that `actor` may delete an entity owned by `owner_id`.
    pub fn authorize_delete(&self, actor: &Actor, owner_id: DbId) -> Result<(), CoreError> {
        if !actor.owns_or_admin(owner_id) {
            return Err(CoreError::Forbidden(
                "You can only delete content you created".into(),
            ));
        }
        if self.status == ApprovalStatus::Approved && !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "Cannot delete approved content".into(),
            ));
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.is_published = self.status == ApprovalStatus::Approved;
        if !self.is_published {
            self.published_at = None;
            self.approved_by = None;
            self.approved_at = None;
        }
        if self.status != ApprovalStatus::Rejected {
            self.rejection_reason = None;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Validate a rejection reason, returning the trimmed text.
pub fn validate_rejection_reason(reason: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    if trimmed.chars().count() < MIN_REJECTION_REASON_CHARS {
        return Err(CoreError::Validation(format!(
            "Please provide detailed correction instructions (minimum {MIN_REJECTION_REASON_CHARS} characters)"
        )));
    }
    Ok(trimmed.to_string())
}

fn require_admin(actor: &Actor, action: &str) -> Result<(), CoreError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!("Only admins can {action}")))
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
