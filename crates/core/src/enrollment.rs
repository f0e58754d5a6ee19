//! Enrollment status values and access rules.

use serde::Serialize;

use crate::approval::Actor;
use crate::error::CoreError;
use crate::types::DbId;

/// Status ID type matching the SMALLINT `enrollment_statuses` lookup table.
pub type EnrollmentStatusId = i16;

/// Enrollment lifecycle. Discriminants match the `enrollment_statuses` seed
/// data.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active = 1,
    Withdrawn = 2,
    Completed = 3,
}

impl EnrollmentStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Withdrawn, Self::Completed];

    pub fn id(self) -> EnrollmentStatusId {
        self as EnrollmentStatusId
    }

    pub fn from_id(id: EnrollmentStatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Active),
            2 => Ok(Self::Withdrawn),
            3 => Ok(Self::Completed),
            other => Err(CoreError::Internal(format!(
                "Unknown enrollment status id {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Withdrawn => "withdrawn",
            Self::Completed => "completed",
        }
    }

    /// Whether the student may still study the course (record progress).
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Active | Self::Completed)
    }

    /// Lookup ids of every status that counts as enrolled.
    pub fn access_ids() -> Vec<EnrollmentStatusId> {
        Self::ALL
            .into_iter()
            .filter(|s| s.grants_access())
            .map(Self::id)
            .collect()
    }
}

/// Check that `actor` may withdraw the enrollment belonging to `student_id`
/// that is currently in `status`.
pub fn authorize_withdraw(
    actor: &Actor,
    student_id: DbId,
    status: EnrollmentStatus,
) -> Result<(), CoreError> {
    if !actor.owns_or_admin(student_id) {
        return Err(CoreError::Forbidden(
            "You can only withdraw your own enrollments".into(),
        ));
    }
    if status != EnrollmentStatus::Active {
        return Err(CoreError::Validation(format!(
            "Only active enrollments can be withdrawn (current status: {})",
            status.as_str()
        )));
    }
    Ok(())
}
