use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::config::JwtConfig;
use crate::db::{User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::services::validation::{validate_email, validate_password};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub struct AuthService;

impl AuthService {
    /// Register a new account and return it.
    pub async fn join(
        db: &SqlitePool,
        email: &str,
        password: &str,
        bcrypt_cost: u32,
    ) -> AppResult<User> {
        let email = validate_email(email)?;
        validate_password(password)?;

        if UserRepository::find_by_email(db, &email).await?.is_some() {
            return Err(AppError::Conflict(
                "A user already exists with this email".to_string(),
            ));
        }

        let password_hash = hash_password(password.to_string(), bcrypt_cost).await?;

        let user = match UserRepository::create(db, &email, &password_hash).await {
            Ok(user) => user,
            // Lost a race with a concurrent join for the same address
            Err(AppError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                return Err(AppError::Conflict(
                    "A user already exists with this email".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        tracing::info!("New account created: {}", user.id);
        Ok(user)
    }

    /// Check an email/password pair. Unknown emails and wrong passwords fail
    /// the same way.
    pub async fn verify_login(db: &SqlitePool, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();

        let Some(user) = UserRepository::find_by_email(db, &email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        if !valid {
            tracing::debug!("Wrong password for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// When a token issued at `now` stops being valid.
    pub fn token_expiry(jwt: &JwtConfig, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        jwt.ttl()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "JWT expiration of {} hours is out of range",
                    jwt.expiration_hours
                ))
            })
    }

    /// Create a signed JWT for a user id
    pub fn issue_token(jwt: &JwtConfig, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = Self::token_expiry(jwt, now)?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT, returning the claims
    pub fn decode_token(jwt: &JwtConfig, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Resolve the account a token was issued for.
    pub async fn get_user_from_token(
        db: &SqlitePool,
        jwt: &JwtConfig,
        token: &str,
    ) -> AppResult<User> {
        let claims = Self::decode_token(jwt, token)?;
        let user = UserRepository::find_by_id(db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(user)
    }
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(hash)
}
