//! Domain types and pure logic for the learning-management backend.
//!
//! This crate has no internal dependencies and performs no I/O, so the
//! workflow and progress rules can be exercised directly by unit tests and
//! reused by both the repository and HTTP layers.

pub mod approval;
pub mod assessment;
pub mod content;
pub mod enrollment;
pub mod error;
pub mod progress;
pub mod roles;
pub mod storage;
pub mod types;
pub mod versioning;
