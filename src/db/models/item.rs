use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GiftListItem {
    pub id: String,
    pub list_id: String,
    pub title: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub details: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Item fields as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    #[serde(default)]
    pub title: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub details: Option<String>,
}

/// Validated item values ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGiftListItem {
    pub title: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub details: Option<String>,
}
