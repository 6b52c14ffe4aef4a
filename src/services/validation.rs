//! Input validation shared by the list, item, sharing and account operations.

use url::Url;

use crate::db::models::{ItemFields, NewGiftListItem};
use crate::error::{AppResult, FieldErrors};

/// Item details must stay strictly below this many characters.
pub const MAX_DETAILS_CHARS: usize = 8192;

pub const MIN_PASSWORD_CHARS: usize = 8;

pub const BLANK_MESSAGE: &str = "Cannot be blank";
pub const INVALID_URL_MESSAGE: &str = "Must be a valid URL";
pub const DETAILS_TOO_LONG_MESSAGE: &str =
    "Too much detail, dumb it down to 8192 characters please.";
pub const INVALID_EMAIL_MESSAGE: &str = "Must be a valid email address";

/// Validate submitted item fields, reporting every failing field at once.
///
/// Blank optional fields are treated as not provided. URLs are stored in
/// their parsed, serialized form.
pub fn validate_item(fields: &ItemFields) -> AppResult<NewGiftListItem> {
    let mut errors = FieldErrors::new();

    let title = fields.title.trim();
    if title.is_empty() {
        errors.add("title", BLANK_MESSAGE);
    }

    let url = optional_url(fields.url.as_deref()).unwrap_or_else(|()| {
        errors.add("url", INVALID_URL_MESSAGE);
        None
    });
    let image_url = optional_url(fields.image_url.as_deref()).unwrap_or_else(|()| {
        errors.add("imageUrl", INVALID_URL_MESSAGE);
        None
    });

    // Length is checked on the raw value, before blank details are dropped
    if let Some(raw) = fields.details.as_deref() {
        if raw.chars().count() >= MAX_DETAILS_CHARS {
            errors.add("details", DETAILS_TOO_LONG_MESSAGE);
        }
    }
    let details = non_blank(fields.details.as_deref());

    errors.into_result()?;

    Ok(NewGiftListItem {
        title: title.to_string(),
        url,
        image_url,
        details: details.map(str::to_string),
    })
}

/// Validate a list title, returning it trimmed.
pub fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        FieldErrors::single("title", "Title is required").into_result()?;
    }
    Ok(title.to_string())
}

/// Loose email check (something before and after an `@`), returning the
/// address trimmed and lower-cased so lookups are case-insensitive.
pub fn validate_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    if email.len() <= 3 || !email.contains('@') {
        FieldErrors::single("email", INVALID_EMAIL_MESSAGE).into_result()?;
    }
    Ok(email.to_lowercase())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return FieldErrors::single("password", "Password is required").into_result();
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return FieldErrors::single("password", "Password is too short").into_result();
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// `Ok(None)` for absent/blank input, `Ok(Some)` for an absolute URL with a
/// host, `Err(())` for anything else.
fn optional_url(value: Option<&str>) -> Result<Option<String>, ()> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    match Url::parse(raw.trim()) {
        Ok(url) if url.has_host() => Ok(Some(url.to_string())),
        _ => Err(()),
    }
}
