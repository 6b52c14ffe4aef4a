use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::models::{
    AccessibleList, GiftList, GiftListDetail, GiftListItem, ItemFields, PermissionLevel,
};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_lists).post(create_list))
        .route("/:list_id", get(get_list))
        .route("/:list_id/items", post(create_item))
        .route("/:list_id/items/:item_id", get(get_item).put(update_item))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: String,
    pub list_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<GiftListItem> for ItemResponse {
    fn from(item: GiftListItem) -> Self {
        Self {
            id: item.id,
            list_id: item.list_id,
            title: item.title,
            url: item.url,
            image_url: item.image_url,
            details: item.details,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummaryResponse {
    pub id: String,
    pub title: String,
    pub permission: PermissionLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AccessibleList> for ListSummaryResponse {
    fn from(list: AccessibleList) -> Self {
        Self {
            id: list.id,
            title: list.title,
            permission: list.permission,
            owner_email: list.owner_email,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDetailResponse {
    pub id: String,
    pub title: String,
    pub permission: PermissionLevel,
    pub can_edit: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub items: Vec<ItemResponse>,
}

impl ListDetailResponse {
    fn new(list: GiftList, permission: PermissionLevel, items: Vec<GiftListItem>) -> Self {
        Self {
            id: list.id,
            title: list.title,
            permission,
            can_edit: permission.can_edit(),
            created_at: list.created_at,
            updated_at: list.updated_at,
            items: items.into_iter().map(ItemResponse::from).collect(),
        }
    }
}

impl From<GiftListDetail> for ListDetailResponse {
    fn from(detail: GiftListDetail) -> Self {
        Self::new(detail.list, detail.permission, detail.items)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Lists the current user can see, most recently updated first
async fn list_lists(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ListSummaryResponse>>, AppError> {
    let lists = state.lists.list_accessible_lists(&user.id).await?;
    Ok(Json(lists.into_iter().map(Into::into).collect()))
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateListRequest>,
) -> Result<impl IntoResponse, AppError> {
    let list = state.lists.create_list(&user.id, &request.title).await?;
    let body = ListDetailResponse::new(list, PermissionLevel::Owner, Vec::new());
    Ok((StatusCode::CREATED, Json(body)))
}

async fn get_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
) -> Result<Json<ListDetailResponse>, AppError> {
    let detail = state.lists.get_list(&user.id, &list_id).await?;
    Ok(Json(detail.into()))
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Json(fields): Json<ItemFields>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.lists.create_item(&user.id, &list_id, &fields).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

async fn get_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((list_id, item_id)): Path<(String, String)>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = state.lists.get_item(&user.id, &list_id, &item_id).await?;
    Ok(Json(item.into()))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((list_id, item_id)): Path<(String, String)>,
    Json(fields): Json<ItemFields>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = state
        .lists
        .update_item(&user.id, &list_id, &item_id, &fields)
        .await?;
    Ok(Json(item.into()))
}
