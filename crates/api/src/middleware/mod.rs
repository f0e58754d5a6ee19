//! Identity and role extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a Bearer token.
//! - [`rbac::RequireAdmin`] -- `admin` only.
//! - [`rbac::RequireAuthor`] -- `staff` or `admin`.
//! - [`rbac::RequireStudent`] -- `student` only.

pub mod auth;
pub mod rbac;
