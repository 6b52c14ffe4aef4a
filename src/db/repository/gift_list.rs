use chrono::Utc;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::{AccessibleList, GiftList};
use crate::error::{AppError, AppResult};

// ============================================================================
// Gift List Repository
// ============================================================================

pub struct GiftListRepository;

impl GiftListRepository {
    /// Insert a bare list row. Callers are responsible for the owner permission.
    pub async fn create<'e, E>(executor: E, title: &str) -> AppResult<GiftList>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, GiftList>(
            r#"
            INSERT INTO gift_lists (id, title, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, title, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> AppResult<Option<GiftList>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, GiftList>(
            "SELECT id, title, created_at, updated_at FROM gift_lists WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Bump `updated_at` so the list sorts first for everyone who can see it.
    pub async fn touch<'e, E>(executor: E, id: &str) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE gift_lists SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Lists the user holds any permission on, most recently updated first.
    pub async fn list_accessible<'e, E>(executor: E, user_id: &str) -> AppResult<Vec<AccessibleList>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, AccessibleList>(
            r#"
            SELECT
                l.id AS id,
                l.title AS title,
                p.permission AS permission,
                (
                    SELECT u.email
                    FROM gift_list_permissions o
                    JOIN users u ON u.id = o.user_id
                    WHERE o.list_id = l.id AND o.permission = 'OWNER'
                    ORDER BY o.created_at ASC
                    LIMIT 1
                ) AS owner_email,
                l.created_at AS created_at,
                l.updated_at AS updated_at
            FROM gift_list_permissions p
            JOIN gift_lists l ON l.id = p.list_id
            WHERE p.user_id = ?
            ORDER BY l.updated_at DESC, l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(AppError::Database)
    }
}
