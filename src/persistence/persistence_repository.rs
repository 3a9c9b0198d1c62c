use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use log::{debug, info};

use super::persistence_constants::{INSERT_CHUNK_ROWS, STAGING_TABLE_SUFFIX};
use super::persistence_errors::PersistenceError;
use super::persistence_model::SqlValue;
use super::persistence_queries::{
    create_staging_table_query, create_table_if_not_exists_query, delete_all_query,
    insert_rows_query, upsert_query,
};
use super::persistence_schema::TableSpec;
use crate::db::{get_connection, DbPool};

type Result<T> = std::result::Result<T, PersistenceError>;

/// Relational merge sink. Holds the pool for one ingestion unit; every
/// operation checks a connection out, runs one transaction, and returns it.
pub struct MergeRepository {
    pool: Arc<DbPool>,
}

impl MergeRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn create_table_if_not_exists(&self, spec: &TableSpec) -> Result<()> {
        let query = create_table_if_not_exists_query(spec);
        let mut conn = get_connection(&self.pool).map_err(PersistenceError::ConnectionLost)?;
        debug!("Ensuring table {} exists", spec.name);
        diesel::sql_query(query).execute(&mut conn)?;
        Ok(())
    }

    /// Land a batch so that repeated overlapping loads converge to one row
    /// per key, newest values winning.
    ///
    /// One transaction: create the staging table, stream the batch into it
    /// in bounded chunks, run the single merge statement, drop staging,
    /// commit. Any constraint violation rolls the whole thing back and
    /// leaves the target untouched; the caller retries the full batch.
    pub fn upsert_batch(&self, spec: &TableSpec, rows: &[Vec<SqlValue>]) -> Result<()> {
        if rows.is_empty() {
            debug!("Upsert into {} skipped: empty batch", spec.name);
            return Ok(());
        }

        let staging_table = format!("{}{}", spec.name, STAGING_TABLE_SUFFIX);
        let staging_ddl = create_staging_table_query(&spec.schema, &staging_table);
        let merge = upsert_query(&staging_table, spec);
        let columns = spec.merge_columns();

        let mut conn = get_connection(&self.pool).map_err(PersistenceError::ConnectionLost)?;
        info!(
            "Initializing bulk upsert of {} rows into {}",
            rows.len(),
            spec.name
        );

        conn.transaction::<_, PersistenceError, _>(|conn| {
            conn.batch_execute(&staging_ddl)?;
            debug!("Populating staging table {}", staging_table);
            for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
                let insert = insert_rows_query(&staging_table, &columns, chunk)?;
                diesel::sql_query(insert).execute(conn)?;
            }
            debug!("Executing upsert from {} into {}", staging_table, spec.name);
            diesel::sql_query(merge).execute(conn)?;
            diesel::sql_query(format!("DROP TABLE {}", staging_table)).execute(conn)?;
            Ok(())
        })?;

        info!("Upsert into {} successful", spec.name);
        Ok(())
    }

    /// Full-refresh path: empty the table and reload it in one transaction.
    /// Not a substitute for `upsert_batch` — this discards rows the batch
    /// does not carry.
    pub fn truncate_load(&self, spec: &TableSpec, rows: &[Vec<SqlValue>]) -> Result<()> {
        let columns = spec.merge_columns();
        let mut conn = get_connection(&self.pool).map_err(PersistenceError::ConnectionLost)?;
        info!(
            "Initializing truncate-load of {} rows into {}",
            rows.len(),
            spec.name
        );

        conn.transaction::<_, PersistenceError, _>(|conn| {
            diesel::sql_query(delete_all_query(&spec.name)).execute(conn)?;
            for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
                let insert = insert_rows_query(&spec.name, &columns, chunk)?;
                diesel::sql_query(insert).execute(conn)?;
            }
            Ok(())
        })?;

        info!("Truncate-load into {} successful", spec.name);
        Ok(())
    }
}
