use chrono::Utc;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::User;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

impl UserRepository {
    /// Insert a new account. `email` is expected to be normalized already.
    pub async fn create<'e, E>(executor: E, email: &str, password_hash: &str) -> AppResult<User>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> AppResult<Option<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> AppResult<Option<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }
}
