use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use super::{GiftListItem, PermissionLevel};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GiftList {
    pub id: String,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A list as seen from one user's permission row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessibleList {
    pub id: String,
    pub title: String,
    pub permission: PermissionLevel,
    /// Email of the list's owner, if an owner row still exists
    pub owner_email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A list with its items, together with the permission the viewer holds on it.
#[derive(Debug, Clone, Serialize)]
pub struct GiftListDetail {
    pub list: GiftList,
    pub permission: PermissionLevel,
    pub items: Vec<GiftListItem>,
}
