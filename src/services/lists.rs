//! The access-controlled list store: every read or write of a list or its
//! items goes through a permission check on the (user, list) pair.
//!
//! Sharing operations live in [`crate::services::sharing`] and the permission
//! checks themselves in [`crate::services::access`]; all of them are methods
//! on [`ListService`].

use sqlx::SqlitePool;

use crate::db::models::{
    AccessibleList, GiftList, GiftListDetail, GiftListItem, ItemFields, PermissionLevel,
};
use crate::db::{GiftListItemRepository, GiftListRepository, PermissionRepository};
use crate::error::{AppError, AppResult};
use crate::services::validation::{validate_item, validate_title};

pub const ITEM_NOT_FOUND: &str = "Gift list item not found";

#[derive(Clone)]
pub struct ListService {
    pub(super) db: SqlitePool,
}

impl ListService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Every list the actor holds a permission on, most recently updated first.
    pub async fn list_accessible_lists(&self, actor: &str) -> AppResult<Vec<AccessibleList>> {
        GiftListRepository::list_accessible(&self.db, actor).await
    }

    /// Create a list owned by `actor`. The list and its OWNER row are written
    /// in one transaction so the list is never visible without an owner.
    pub async fn create_list(&self, actor: &str, title: &str) -> AppResult<GiftList> {
        let title = validate_title(title)?;

        let mut tx = self.db.begin().await?;
        let list = GiftListRepository::create(&mut *tx, &title).await?;
        PermissionRepository::create(&mut *tx, actor, &list.id, PermissionLevel::Owner).await?;
        tx.commit().await?;

        tracing::info!("User {} created gift list {}", actor, list.id);
        Ok(list)
    }

    /// The list with its items, if the actor holds any permission on it.
    ///
    /// A list that does not exist and one the actor may not see produce the
    /// same error.
    pub async fn get_list(&self, actor: &str, list_id: &str) -> AppResult<GiftListDetail> {
        let permission = PermissionRepository::find(&self.db, actor, list_id)
            .await?
            .ok_or_else(AppError::list_not_found)?;

        let list = GiftListRepository::find_by_id(&self.db, list_id)
            .await?
            .ok_or_else(AppError::list_not_found)?;
        let items = GiftListItemRepository::list_for_list(&self.db, list_id).await?;

        Ok(GiftListDetail {
            list,
            permission: permission.permission,
            items,
        })
    }

    /// Add an item to a list the actor can edit.
    pub async fn create_item(
        &self,
        actor: &str,
        list_id: &str,
        fields: &ItemFields,
    ) -> AppResult<GiftListItem> {
        let item = validate_item(fields)?;

        let mut tx = self.db.begin().await?;
        Self::check_level(&mut *tx, actor, list_id, &PermissionLevel::EDITING).await?;
        let created = GiftListItemRepository::create(&mut *tx, list_id, &item).await?;
        GiftListRepository::touch(&mut *tx, list_id).await?;
        tx.commit().await?;

        tracing::info!(
            "User {} added item {} to gift list {}",
            actor,
            created.id,
            list_id
        );
        Ok(created)
    }

    /// A single item, if it is on `list_id` and the actor can see that list.
    pub async fn get_item(
        &self,
        actor: &str,
        list_id: &str,
        item_id: &str,
    ) -> AppResult<GiftListItem> {
        GiftListItemRepository::find_visible(&self.db, actor, list_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(ITEM_NOT_FOUND.to_string()))
    }

    /// Replace an item's fields. Same rules as [`ListService::create_item`].
    pub async fn update_item(
        &self,
        actor: &str,
        list_id: &str,
        item_id: &str,
        fields: &ItemFields,
    ) -> AppResult<GiftListItem> {
        let item = validate_item(fields)?;

        let mut tx = self.db.begin().await?;
        Self::check_level(&mut *tx, actor, list_id, &PermissionLevel::EDITING).await?;
        let updated = GiftListItemRepository::update(&mut *tx, list_id, item_id, &item)
            .await?
            .ok_or_else(|| AppError::NotFound(ITEM_NOT_FOUND.to_string()))?;
        GiftListRepository::touch(&mut *tx, list_id).await?;
        tx.commit().await?;

        tracing::debug!("User {} updated item {} on gift list {}", actor, item_id, list_id);
        Ok(updated)
    }
}
