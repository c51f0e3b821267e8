// Error types for repository operations

use sea_orm::DbErr;
use thiserror::Error;

/// Error types for database connection and query operations
#[derive(Debug, Error)]
pub enum DbError {
    /// The pool could not hand out a connection, or the server went away
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// A statement was rejected or failed while executing
    #[error("Database query error: {0}")]
    QueryError(String),
}

impl From<DbErr> for DbError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                DbError::ConnectionError(err.to_string())
            }
            other => DbError::QueryError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failures_map_to_query_error() {
        let err: DbError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, DbError::QueryError(msg) if msg.contains("boom")));
    }
}
