//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

use std::borrow::Cow;

use validator::ValidationError;

pub mod course;
pub mod enrollment;
pub mod exam;
pub mod exam_attempt;
pub mod lesson;
pub mod material;
pub mod module;
pub mod progress;
pub mod upload;
pub mod user;
pub mod workflow;

/// Title length bounds, measured after trimming.
pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 200;

/// Validator for entity titles: 3 to 200 characters once trimmed.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("title_length").with_message(Cow::Owned(format!(
            "must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters"
        ))))
    }
}
