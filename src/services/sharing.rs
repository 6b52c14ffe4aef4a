//! Owner-only operations on a list's permission rows.

use crate::db::models::{Permission, PermissionLevel, SharingEntry};
use crate::db::{PermissionRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::services::lists::ListService;
use crate::services::validation::validate_email;

pub const SHARE_NOT_FOUND: &str = "Share not found";
pub const USER_NOT_FOUND: &str = "User not found";

impl ListService {
    /// All permission rows of a list, ordered by the grantee's email.
    pub async fn get_sharing(&self, actor: &str, list_id: &str) -> AppResult<Vec<SharingEntry>> {
        self.require_owner(actor, list_id).await?;
        PermissionRepository::list_with_user_info(&self.db, list_id).await
    }

    /// Give the user registered under `email` read access to the list.
    ///
    /// Sharing with someone who already has a permission leaves it as it is,
    /// so an EDITOR or OWNER is never demoted to VIEWER.
    pub async fn share_list(
        &self,
        actor: &str,
        list_id: &str,
        email: &str,
    ) -> AppResult<Permission> {
        let email = validate_email(email)?;

        let mut tx = self.db.begin().await?;
        Self::check_level(&mut *tx, actor, list_id, &[PermissionLevel::Owner]).await?;

        let target = UserRepository::find_by_email(&mut *tx, &email)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        let inserted = PermissionRepository::insert_if_absent(
            &mut *tx,
            &target.id,
            list_id,
            PermissionLevel::Viewer,
        )
        .await?;

        let permission = PermissionRepository::find(&mut *tx, &target.id, list_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "permission for user {} on list {} vanished after upsert",
                    target.id,
                    list_id
                ))
            })?;
        tx.commit().await?;

        if inserted {
            tracing::info!("User {} shared gift list {} with {}", actor, list_id, target.id);
        } else {
            tracing::debug!(
                "Gift list {} already shared with {} as {}",
                list_id,
                target.id,
                permission.permission.as_str()
            );
        }

        Ok(permission)
    }

    /// Switch another user's access between VIEWER and EDITOR.
    pub async fn set_share_level(
        &self,
        actor: &str,
        list_id: &str,
        target_user_id: &str,
        level: PermissionLevel,
    ) -> AppResult<Permission> {
        if level == PermissionLevel::Owner {
            return Err(AppError::validation(
                "permission",
                "Permission must be EDITOR or VIEWER",
            ));
        }

        let mut tx = self.db.begin().await?;
        Self::check_level(&mut *tx, actor, list_id, &[PermissionLevel::Owner]).await?;

        if target_user_id == actor {
            return Err(AppError::validation(
                "targetUserId",
                "You cannot change your own permission",
            ));
        }

        let existing = PermissionRepository::find(&mut *tx, target_user_id, list_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SHARE_NOT_FOUND.to_string()))?;
        if existing.permission == PermissionLevel::Owner {
            return Err(AppError::validation(
                "targetUserId",
                "An owner's permission cannot be changed",
            ));
        }

        let updated = PermissionRepository::update_level(&mut *tx, target_user_id, list_id, level)
            .await?
            .ok_or_else(|| AppError::NotFound(SHARE_NOT_FOUND.to_string()))?;
        tx.commit().await?;

        tracing::info!(
            "User {} set {} on gift list {} to {}",
            actor,
            target_user_id,
            list_id,
            level.as_str()
        );
        Ok(updated)
    }

    /// Remove another user's access. Owners can never remove themselves.
    pub async fn unshare_list(
        &self,
        actor: &str,
        target_user_id: &str,
        list_id: &str,
    ) -> AppResult<Permission> {
        let mut tx = self.db.begin().await?;
        Self::check_level(&mut *tx, actor, list_id, &[PermissionLevel::Owner]).await?;

        if target_user_id == actor {
            return Err(AppError::validation(
                "targetUserId",
                "You cannot remove your own access to this list",
            ));
        }

        let removed = PermissionRepository::delete(&mut *tx, target_user_id, list_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SHARE_NOT_FOUND.to_string()))?;
        tx.commit().await?;

        tracing::info!(
            "User {} removed {} from gift list {}",
            actor,
            target_user_id,
            list_id
        );
        Ok(removed)
    }
}
