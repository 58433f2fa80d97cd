use std::sync::Arc;

use carteira_core::db::{self, DbPool};
use tempfile::TempDir;

/// Spins up a throwaway SQLite database with migrations applied. The
/// TempDir must stay alive for the duration of the test.
pub fn setup_test_db() -> (Arc<DbPool>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let data_dir = dir.path().to_str().unwrap().to_string();

    let db_path = db::init(&data_dir).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    (pool, dir)
}
