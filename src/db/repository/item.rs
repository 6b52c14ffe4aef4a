use chrono::Utc;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::{GiftListItem, NewGiftListItem};
use crate::error::{AppError, AppResult};

// ============================================================================
// Gift List Item Repository
// ============================================================================

pub struct GiftListItemRepository;

impl GiftListItemRepository {
    pub async fn create<'e, E>(
        executor: E,
        list_id: &str,
        item: &NewGiftListItem,
    ) -> AppResult<GiftListItem>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, GiftListItem>(
            r#"
            INSERT INTO gift_list_items (
                id, list_id, title, url, image_url, details, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, list_id, title, url, image_url, details, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(list_id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.image_url)
        .bind(&item.details)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Items of a list in the order they were added.
    pub async fn list_for_list<'e, E>(executor: E, list_id: &str) -> AppResult<Vec<GiftListItem>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, GiftListItem>(
            r#"
            SELECT id, list_id, title, url, image_url, details, created_at, updated_at
            FROM gift_list_items
            WHERE list_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(list_id)
        .fetch_all(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Find an item on a list, but only if `user_id` holds a permission on that list.
    pub async fn find_visible<'e, E>(
        executor: E,
        user_id: &str,
        list_id: &str,
        item_id: &str,
    ) -> AppResult<Option<GiftListItem>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, GiftListItem>(
            r#"
            SELECT
                i.id, i.list_id, i.title, i.url, i.image_url, i.details,
                i.created_at, i.updated_at
            FROM gift_list_items i
            JOIN gift_list_permissions p ON p.list_id = i.list_id
            WHERE i.id = ? AND i.list_id = ? AND p.user_id = ?
            "#,
        )
        .bind(item_id)
        .bind(list_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Replace all editable fields. Returns `None` when the item is not on `list_id`.
    pub async fn update<'e, E>(
        executor: E,
        list_id: &str,
        item_id: &str,
        item: &NewGiftListItem,
    ) -> AppResult<Option<GiftListItem>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, GiftListItem>(
            r#"
            UPDATE gift_list_items
            SET title = ?, url = ?, image_url = ?, details = ?, updated_at = ?
            WHERE id = ? AND list_id = ?
            RETURNING id, list_id, title, url, image_url, details, created_at, updated_at
            "#,
        )
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.image_url)
        .bind(&item.details)
        .bind(now)
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::Database)
    }
}
