use thiserror::Error;

/// Failures of the durable buffer. Callers must not assume a write happened
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// `mark_consumed` was asked to flip identities that do not exist.
    /// Nothing was marked.
    #[error("activities not found: {0:?}")]
    MissingActivities(Vec<i64>),
}

pub type BufferResult<T> = Result<T, BufferError>;
