use lms_core::error::CoreError;

/// Error returned by repository operations that enforce domain rules inside
/// a transaction.
///
/// Plain CRUD methods return `sqlx::Error` directly; methods that load a row,
/// run a guard from `lms-core` and then write return this instead.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
