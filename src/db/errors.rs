use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    ConnectionError(String),

    #[error("query execution error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("transaction error: {0}")]
    TransactionError(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl DatabaseError {
    /// Transient errors a caller may reasonably retry: connection drops,
    /// serialization failures, deadlocks.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) => true,
            Self::QueryError(e) => {
                if let Some(db_error) = e.as_database_error() {
                    matches!(
                        db_error.code().as_deref(),
                        Some("40001") | // serialization_failure
                        Some("40P01") // deadlock_detected
                    )
                } else {
                    matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
                }
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
