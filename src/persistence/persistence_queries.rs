//! SQL text generation for the merge protocol. Every identifier reaching
//! these builders has been validated by the schema layer; values are
//! rendered through `SqlValue`, which escapes string content.

use super::persistence_errors::PersistenceError;
use super::persistence_model::SqlValue;
use super::persistence_schema::{TableSchema, TableSpec};

/// Staging table DDL: dropped if left over, then created fresh. TEMP keeps
/// it scoped to the loading connection.
pub fn create_staging_table_query(schema: &TableSchema, staging_table: &str) -> String {
    format!(
        "DROP TABLE IF EXISTS {staging_table};\nCREATE TEMP TABLE {staging_table} (\n{columns}\n)",
        staging_table = staging_table,
        columns = schema.sql_string(),
    )
}

/// Target table DDL. The primary key over the key columns is what the merge
/// statement's conflict target resolves against.
pub fn create_table_if_not_exists_query(spec: &TableSpec) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {name} (\n{columns},\n    PRIMARY KEY ({keys})\n)",
        name = spec.name,
        columns = spec.schema.sql_string(),
        keys = spec.key_columns.join(", "),
    )
}

pub fn delete_all_query(table: &str) -> String {
    format!("DELETE FROM {}", table)
}

/// One multi-row insert for a bounded chunk of the batch.
pub fn insert_rows_query(
    table: &str,
    columns: &[&str],
    rows: &[Vec<SqlValue>],
) -> Result<String, PersistenceError> {
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != columns.len() {
            return Err(PersistenceError::RowWidthMismatch {
                expected: columns.len(),
                actual: row.len(),
            });
        }
        let cells: Vec<String> = row.iter().map(SqlValue::render).collect();
        tuples.push(format!("({})", cells.join(", ")));
    }
    Ok(format!(
        "INSERT INTO {table} ({columns})\nVALUES\n    {values}",
        table = table,
        columns = columns.join(", "),
        values = tuples.join(",\n    "),
    ))
}

/// The merge statement: update rows whose key matches a staged row, insert
/// the rest — one statement, so there is no read-then-write window between
/// deciding "update vs insert" and doing it.
pub fn upsert_query(staging_table: &str, spec: &TableSpec) -> String {
    let columns = spec.merge_columns().join(", ");
    let setters = spec
        .value_columns
        .iter()
        .map(|column| format!("    {} = excluded.{}", column, column))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "INSERT INTO {target} ({columns})\n    SELECT {columns}\n    FROM {staging} WHERE true\nON CONFLICT ({keys}) DO UPDATE SET\n{setters}",
        target = spec.name,
        columns = columns,
        staging = staging_table,
        keys = spec.key_columns.join(", "),
        setters = setters,
    )
}
