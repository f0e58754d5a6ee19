//! Well-known role name constants.
//!
//! These must match the `role` CHECK constraint on the `users` table and the
//! `role` claim issued by the authentication service.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_STUDENT: &str = "student";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_STAFF, ROLE_STUDENT];

/// Whether `role` may author content (staff or admin).
pub fn can_author(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_STAFF
}
