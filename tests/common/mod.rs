use std::sync::Arc;

use marketflow_core::db::{self, DbPool};
use tempfile::TempDir;

/// Throwaway on-disk database for one test. The TempDir must stay alive for
/// the duration of the test or the files vanish under the pool.
pub fn setup_pool() -> (TempDir, Arc<DbPool>) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let db_path = dir.path().join("sink.db");
    let db_path = db::init(db_path.to_str().unwrap()).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");

    (dir, pool)
}
