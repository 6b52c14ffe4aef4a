use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::models::{Permission, PermissionLevel, SharingEntry};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:list_id/sharing", get(get_sharing).post(share_list))
        .route(
            "/:list_id/sharing/:user_id",
            put(set_share_level).delete(unshare_list),
        )
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareLevelRequest {
    #[serde(default)]
    pub permission: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub user_id: String,
    pub list_id: String,
    pub permission: PermissionLevel,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            user_id: p.user_id,
            list_id: p.list_id,
            permission: p.permission,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingEntryResponse {
    pub user_id: String,
    pub email: String,
    pub permission: PermissionLevel,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<SharingEntry> for SharingEntryResponse {
    fn from(entry: SharingEntry) -> Self {
        Self {
            user_id: entry.user_id,
            email: entry.email,
            permission: entry.permission,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

async fn get_sharing(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
) -> Result<Json<Vec<SharingEntryResponse>>, AppError> {
    let entries = state.lists.get_sharing(&user.id, &list_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

async fn share_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> Result<Json<PermissionResponse>, AppError> {
    let permission = state
        .lists
        .share_list(&user.id, &list_id, &request.email)
        .await?;
    Ok(Json(permission.into()))
}

async fn set_share_level(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((list_id, target_user_id)): Path<(String, String)>,
    Json(request): Json<ShareLevelRequest>,
) -> Result<Json<PermissionResponse>, AppError> {
    let level = PermissionLevel::try_from(request.permission.as_str())
        .map_err(|msg| AppError::validation("permission", msg))?;

    let permission = state
        .lists
        .set_share_level(&user.id, &list_id, &target_user_id, level)
        .await?;
    Ok(Json(permission.into()))
}

async fn unshare_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((list_id, target_user_id)): Path<(String, String)>,
) -> Result<Json<PermissionResponse>, AppError> {
    let removed = state
        .lists
        .unshare_list(&user.id, &target_user_id, &list_id)
        .await?;
    Ok(Json(removed.into()))
}
