//! Enrollment models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use lms_core::types::{DbId, Timestamp};

/// A row from the `enrollments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub status_id: i16,
    pub enrolled_at: Timestamp,
    pub completed: bool,
    pub percent_complete: i32,
    pub withdrawn_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An enrollment joined with a summary of its course.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EnrollmentWithCourse {
    pub id: DbId,
    pub student_id: DbId,
    pub course_id: DbId,
    pub status_id: i16,
    pub enrolled_at: Timestamp,
    pub completed: bool,
    pub percent_complete: i32,
    pub course_title: String,
    pub course_description: Option<String>,
    pub course_category: Option<String>,
    pub course_thumbnail_url: Option<String>,
    pub course_price_cents: i64,
}

/// Request body for `POST /enrollments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnrollment {
    pub course_id: DbId,
}

/// Response for the is-enrolled check.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentCheck {
    pub is_enrolled: bool,
    pub enrollment: Option<Enrollment>,
}
