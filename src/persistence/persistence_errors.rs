use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::errors::DatabaseError;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Sink unreachable: {0}")]
    ConnectionLost(DatabaseError),

    #[error("Constraint violation during load: {0}")]
    Conflict(String),

    #[error("Database query failed: {0}")]
    QueryFailed(DieselError),

    #[error("'{0}' is not a valid SQL identifier")]
    InvalidIdentifier(String),

    #[error("Column '{0}' is not part of the table schema")]
    UnknownColumn(String),

    #[error("Row has {actual} cells, schema expects {expected}")]
    RowWidthMismatch { expected: usize, actual: usize },
}

// Constraint violations abort the enclosing transaction and surface as a
// conflict; everything else stays a plain query failure.
impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            | DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info)
            | DieselError::DatabaseError(DatabaseErrorKind::NotNullViolation, info) => {
                PersistenceError::Conflict(info.message().to_string())
            }
            other => PersistenceError::QueryFailed(other),
        }
    }
}
