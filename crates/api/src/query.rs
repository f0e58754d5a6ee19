//! Query parameters shared by the content list endpoints.

use lms_core::approval::ApprovalStatus;
use lms_core::error::CoreError;
use lms_db::models::workflow::ContentFilter;
use serde::Deserialize;

use crate::middleware::auth::AuthUser;

/// `?status=<name>&mine=true` on module, lesson, material and exam lists.
#[derive(Debug, Default, Deserialize)]
pub struct ContentListParams {
    /// Approval status name (`draft`, `pending`, `approved`, `rejected`).
    pub status: Option<String>,
    /// Only rows created by the caller.
    #[serde(default)]
    pub mine: bool,
}

impl ContentListParams {
    /// Build the repository filter for `user`. Students only ever see
    /// published rows.
    pub fn to_filter(&self, user: &AuthUser) -> Result<ContentFilter, CoreError> {
        let status_id = self
            .status
            .as_deref()
            .map(ApprovalStatus::from_name)
            .transpose()?
            .map(ApprovalStatus::id);
        Ok(ContentFilter {
            status_id,
            published_only: user.is_student(),
            created_by: self.mine.then_some(user.user_id),
        })
    }
}
