//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod course_repo;
pub mod enrollment_repo;
pub mod exam_attempt_repo;
pub mod exam_repo;
pub mod lesson_repo;
pub mod material_repo;
pub mod module_repo;
pub mod progress_repo;
pub mod upload_repo;
pub mod user_repo;
pub mod workflow_repo;

pub use course_repo::CourseRepo;
pub use enrollment_repo::EnrollmentRepo;
pub use exam_attempt_repo::ExamAttemptRepo;
pub use exam_repo::ExamRepo;
pub use lesson_repo::LessonRepo;
pub use material_repo::MaterialRepo;
pub use module_repo::ModuleRepo;
pub use progress_repo::ProgressRepo;
pub use upload_repo::UploadRepo;
pub use user_repo::UserRepo;
pub use workflow_repo::{
    ContentTable, ExamKind, LessonKind, MaterialKind, ModuleKind, WorkflowRepo,
};
