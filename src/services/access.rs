use sqlx::{Executor, Sqlite};

use crate::db::models::{Permission, PermissionLevel};
use crate::db::PermissionRepository;
use crate::error::{AppError, AppResult};
use crate::services::lists::ListService;

impl ListService {
    /// The actor's permission if it allows editing items (OWNER or EDITOR).
    pub async fn require_editing(&self, actor: &str, list_id: &str) -> AppResult<Permission> {
        Self::check_level(&self.db, actor, list_id, &PermissionLevel::EDITING).await
    }

    /// The actor's permission if it is OWNER.
    pub async fn require_owner(&self, actor: &str, list_id: &str) -> AppResult<Permission> {
        Self::check_level(&self.db, actor, list_id, &[PermissionLevel::Owner]).await
    }

    /// Shared by the `require_*` checks and by mutations that must run the
    /// check inside their own transaction.
    pub(super) async fn check_level<'e, E>(
        executor: E,
        actor: &str,
        list_id: &str,
        levels: &[PermissionLevel],
    ) -> AppResult<Permission>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        PermissionRepository::find_with_level_in(executor, actor, list_id, levels)
            .await?
            .ok_or_else(|| {
                tracing::debug!(
                    "Permission check failed: user {} on list {} (needs one of {:?})",
                    actor,
                    list_id,
                    levels
                );
                AppError::NotAuthorized
            })
    }
}
