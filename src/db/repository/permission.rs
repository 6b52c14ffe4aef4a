use chrono::Utc;
use sqlx::{Executor, Sqlite};

use crate::db::models::{Permission, PermissionLevel, SharingEntry};
use crate::error::{AppError, AppResult};

// ============================================================================
// Gift List Permission Repository
// ============================================================================

pub struct PermissionRepository;

impl PermissionRepository {
    pub async fn create<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
        level: PermissionLevel,
    ) -> AppResult<Permission>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO gift_list_permissions (user_id, list_id, permission, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING user_id, list_id, permission, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .bind(level)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Insert a permission unless the (user, list) pair already has one.
    /// Returns whether a row was inserted; an existing row is left untouched.
    pub async fn insert_if_absent<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
        level: PermissionLevel,
    ) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO gift_list_permissions (user_id, list_id, permission, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (user_id, list_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .bind(level)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
    ) -> AppResult<Option<Permission>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT user_id, list_id, permission, created_at, updated_at
            FROM gift_list_permissions
            WHERE user_id = ? AND list_id = ?
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Find the user's permission on a list if its level is one of `levels`.
    pub async fn find_with_level_in<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
        levels: &[PermissionLevel],
    ) -> AppResult<Option<Permission>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if levels.is_empty() {
            return Ok(None);
        }

        let placeholders = vec!["?"; levels.len()].join(", ");
        let sql = format!(
            r#"
            SELECT user_id, list_id, permission, created_at, updated_at
            FROM gift_list_permissions
            WHERE user_id = ? AND list_id = ? AND permission IN ({})
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, Permission>(&sql)
            .bind(user_id)
            .bind(list_id);
        for level in levels {
            query = query.bind(*level);
        }

        query
            .fetch_optional(executor)
            .await
            .map_err(AppError::Database)
    }

    /// Change the level of an existing row. Returns `None` if there is no such row.
    pub async fn update_level<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
        level: PermissionLevel,
    ) -> AppResult<Option<Permission>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Permission>(
            r#"
            UPDATE gift_list_permissions
            SET permission = ?, updated_at = ?
            WHERE user_id = ? AND list_id = ?
            RETURNING user_id, list_id, permission, created_at, updated_at
            "#,
        )
        .bind(level)
        .bind(now)
        .bind(user_id)
        .bind(list_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Delete a row and return it. Returns `None` if there was nothing to delete.
    pub async fn delete<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
    ) -> AppResult<Option<Permission>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Permission>(
            r#"
            DELETE FROM gift_list_permissions
            WHERE user_id = ? AND list_id = ?
            RETURNING user_id, list_id, permission, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// All permission rows of a list with the grantee's email, ordered by email.
    pub async fn list_with_user_info<'e, E>(
        executor: E,
        list_id: &str,
    ) -> AppResult<Vec<SharingEntry>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, SharingEntry>(
            r#"
            SELECT
                p.user_id AS user_id,
                u.email AS email,
                p.permission AS permission,
                p.created_at AS created_at,
                p.updated_at AS updated_at
            FROM gift_list_permissions p
            JOIN users u ON u.id = p.user_id
            WHERE p.list_id = ?
            ORDER BY u.email ASC
            "#,
        )
        .bind(list_id)
        .fetch_all(executor)
        .await
        .map_err(AppError::Database)
    }
}
