pub mod course;
pub mod enrollment;
pub mod exam;
pub mod file;
pub mod lesson;
pub mod material;
pub mod module;
pub mod progress;
pub mod upload;
pub mod workflow;
