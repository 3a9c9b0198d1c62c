use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Columnar engine error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Snapshot column '{column}' unusable: {reason}")]
    Column { column: String, reason: String },

    #[error("Null value in snapshot column '{column}' at row {row}")]
    NullValue { column: String, row: usize },
}

impl SnapshotError {
    pub(crate) fn column(column: &str, reason: impl ToString) -> Self {
        SnapshotError::Column {
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn null(column: &str, row: usize) -> Self {
        SnapshotError::NullValue {
            column: column.to_string(),
            row,
        }
    }
}
