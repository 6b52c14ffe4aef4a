use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::User;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/join", post(join))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub user: UserResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account and start a session for it
async fn join(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::join(
        &state.db,
        &request.email,
        &request.password,
        state.config.auth.bcrypt_cost,
    )
    .await?;

    let (jar, session) = start_session(&state.config, jar, user)?;
    Ok((StatusCode::CREATED, jar, Json(session)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::verify_login(&state.db, &request.email, &request.password).await?;

    tracing::info!("User {} logged in", user.id);
    let (jar, session) = start_session(&state.config, jar, user)?;
    Ok((jar, Json(session)))
}

/// Clear the session cookie. Tokens are stateless, so a bearer token stays
/// valid until it expires.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(serde_json::json!({ "message": "Logged out" })))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

// ============================================================================
// Helper functions
// ============================================================================

fn start_session(
    config: &Config,
    jar: CookieJar,
    user: User,
) -> Result<(CookieJar, SessionResponse), AppError> {
    let token = AuthService::issue_token(&config.jwt, &user.id)?;
    let now = Utc::now();
    let expires_at = AuthService::token_expiry(&config.jwt, now)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .path("/")
        .secure(config.server.cookie_secure())
        .same_site(same_site(config.server.cookie_same_site.as_deref()))
        .max_age(time::Duration::seconds((expires_at - now).num_seconds()));

    let session = SessionResponse {
        token,
        token_type: "Bearer",
        expires_at: expires_at.timestamp(),
        user: user.into(),
    };
    Ok((jar.add(cookie), session))
}

fn same_site(value: Option<&str>) -> SameSite {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("strict") => SameSite::Strict,
        Some("none") => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Bearer token from the Authorization header, if one is present.
fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    if !header.to_ascii_lowercase().starts_with("bearer ") {
        tracing::debug!("Authorization header doesn't start with 'Bearer '");
        return None;
    }

    let token = header[7..].trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Auth Extractor
// ============================================================================

/// Extractor for the authenticated user. Looks for a bearer token first and
/// falls back to the session cookie.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(SESSION_COOKIE)
                    .map(|c| c.value().to_string())
            })
            .ok_or_else(|| {
                tracing::debug!("No bearer token or session cookie on request");
                AppError::Unauthorized
            })?;

        let user = AuthService::get_user_from_token(&state.db, &state.config.jwt, &token)
            .await
            .map_err(|e| {
                tracing::debug!("Failed to get user from token: {:?}", e);
                AppError::Unauthorized
            })?;

        tracing::debug!("Authenticated user: {}", user.id);
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_site_defaults_to_lax() {
        assert_eq!(same_site(None), SameSite::Lax);
        assert_eq!(same_site(Some("Strict")), SameSite::Strict);
        assert_eq!(same_site(Some("none")), SameSite::None);
        assert_eq!(same_site(Some("bogus")), SameSite::Lax);
    }
}
