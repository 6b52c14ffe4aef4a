//! Fixtures shared by the unit tests.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::models::{PermissionLevel, User};
use crate::db::{PermissionRepository, UserRepository};
use crate::services::init::run_migrations;
use crate::services::lists::ListService;
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Lowest work factor bcrypt accepts; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// A fresh in-memory database with the schema applied. A single connection
/// that never expires keeps the database alive for the whole test.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    run_migrations(&pool).await.unwrap();
    pool
}

pub async fn create_user(pool: &SqlitePool, email: &str) -> User {
    UserRepository::create(pool, email, "not-a-real-hash")
        .await
        .unwrap()
}

pub async fn share_with(pool: &SqlitePool, user_id: &str, list_id: &str, level: PermissionLevel) {
    PermissionRepository::create(pool, user_id, list_id, level)
        .await
        .unwrap();
}

pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    let mut config = Config::default();
    config.jwt.secret = TEST_JWT_SECRET.to_string();
    config.auth.bcrypt_cost = TEST_BCRYPT_COST;

    Arc::new(AppState {
        lists: ListService::new(pool.clone()),
        db: pool,
        config,
    })
}
