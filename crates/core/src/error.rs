//! Unified error types for toolshelf.
//!
//! Storage failures are carried verbatim in [`Error::Query`]; everything else
//! describes a domain condition the caller can act on.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the catalog data layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage-level failure (constraint violation, malformed SQL, closed connection).
    ///
    /// Never retried by the data layer.
    #[error("QUERY_FAILED: {0}")]
    Query(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("QUERY_FAILED: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid input parameters (e.g., unknown sort field, empty title).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A stored value could not be decoded.
    #[error("INVALID_DATA: {0}")]
    InvalidData(String),

    /// The requested row does not exist or is inactive.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Category still has active resources attached.
    #[error("CATEGORY_IN_USE: category {id} still has {resources} active resource(s)")]
    CategoryInUse { id: i64, resources: i64 },
}

impl Error {
    /// Returns the underlying SQLite error, if this is a storage failure.
    pub fn sqlite_error(&self) -> Option<&rusqlite::Error> {
        match self {
            Error::Query(tokio_rusqlite::Error::Error(e)) => Some(e),
            Error::Query(tokio_rusqlite::Error::Close((_, e))) => Some(e),
            _ => None,
        }
    }

    /// Whether the storage rejected the statement because of a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.sqlite_error().and_then(rusqlite::Error::sqlite_error_code),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        )
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Query(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Query(tokio_rusqlite::Error::Close(c)),
            _ => Error::Query(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Query(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Query(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Query(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::InvalidData(msg) => (-32003, msg.clone()),
            Error::NotFound(msg) => (-32004, msg.clone()),
            Error::CategoryInUse { .. } => (-32005, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
