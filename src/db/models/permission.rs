use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Access level a user holds on a gift list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Owner,
    Editor,
    Viewer,
}

impl PermissionLevel {
    /// Levels allowed to add and edit items.
    pub const EDITING: [PermissionLevel; 2] = [PermissionLevel::Owner, PermissionLevel::Editor];

    /// Convert from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OWNER" => Some(PermissionLevel::Owner),
            "EDITOR" => Some(PermissionLevel::Editor),
            "VIEWER" => Some(PermissionLevel::Viewer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Owner => "OWNER",
            PermissionLevel::Editor => "EDITOR",
            PermissionLevel::Viewer => "VIEWER",
        }
    }

    pub fn can_edit(self) -> bool {
        Self::EDITING.contains(&self)
    }
}

impl TryFrom<&str> for PermissionLevel {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or_else(|| format!("Invalid permission level: {}", value))
    }
}

/// One row of the user/list junction table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Permission {
    pub user_id: String,
    pub list_id: String,
    pub permission: PermissionLevel,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A permission row joined with the grantee's email, as shown on the sharing page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SharingEntry {
    pub user_id: String,
    pub email: String,
    pub permission: PermissionLevel,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
