pub(crate) mod persistence_constants;
pub(crate) mod persistence_errors;
pub(crate) mod persistence_model;
pub(crate) mod persistence_queries;
pub(crate) mod persistence_repository;
pub(crate) mod persistence_schema;

// Re-export the public interface
pub use persistence_constants::*;
pub use persistence_errors::PersistenceError;
pub use persistence_model::{SqlValue, ToSqlRow};
pub use persistence_repository::MergeRepository;
pub use persistence_schema::{validate_identifier, ColumnDef, SqlType, TableSchema, TableSpec};
