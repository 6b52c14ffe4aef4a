use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    /// Whether to set the `Secure` flag on the session cookie.
    /// If `None`, it is inferred from `frontend_url` (`https` -> true).
    /// Read from env var `COOKIE_SECURE` (accepted values: "true"/"false", "1"/"0", "yes"/"no").
    pub cookie_secure: Option<bool>,
    /// Preferred SameSite value for the session cookie. Read from env var `COOKIE_SAMESITE`
    /// (accepted values: "Lax", "Strict", "None").
    pub cookie_same_site: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// bcrypt work factor used when storing new credentials
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for auth endpoints (e.g. /api/auth/login)
    pub auth_per_second: u32,
    /// Burst size for auth endpoints
    pub auth_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human readable format
    pub json: bool,
}

/// Upper bound for `JWT_EXPIRATION_HOURS` (one year).
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

impl JwtConfig {
    /// Token lifetime, or `None` when `expiration_hours` does not fit a duration.
    pub fn ttl(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_hours(self.expiration_hours)
    }
}

impl ServerConfig {
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
            .unwrap_or_else(|| self.frontend_url.starts_with("https://"))
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                cookie_secure: env::var("COOKIE_SECURE").ok().and_then(|v| parse_flag(&v)),
                cookie_same_site: env::var("COOKIE_SAMESITE").ok(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/gift_lists.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::MissingEnv("JWT_SECRET".to_string()))?,
                expiration_hours: parse_expiration_hours(
                    &env::var("JWT_EXPIRATION_HOURS").unwrap_or_else(|_| "24".to_string()),
                )?,
            },
            auth: AuthConfig {
                bcrypt_cost: env::var("BCRYPT_COST")
                    .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("BCRYPT_COST".to_string()))?,
            },
            rate_limit: RateLimitConfig {
                auth_per_second: env::var("RATE_LIMIT_AUTH_PER_SECOND")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                auth_burst: env::var("RATE_LIMIT_AUTH_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            logging: LoggingConfig {
                json: env::var("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
        })
    }
}

fn parse_expiration_hours(raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| (1..=MAX_JWT_EXPIRATION_HOURS).contains(hours))
        .ok_or_else(|| ConfigError::InvalidValue("JWT_EXPIRATION_HOURS".to_string()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
                cookie_secure: None,
                cookie_same_site: None,
            },
            database: DatabaseConfig {
                url: "sqlite://data/gift_lists.db".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: String::new(),
                expiration_hours: 24,
            },
            auth: AuthConfig {
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            rate_limit: RateLimitConfig {
                auth_per_second: 3,
                auth_burst: 10,
            },
            logging: LoggingConfig { json: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn expiration_hours_must_be_positive_and_bounded() {
        assert_eq!(parse_expiration_hours("24").unwrap(), 24);
        assert_eq!(
            parse_expiration_hours(&MAX_JWT_EXPIRATION_HOURS.to_string()).unwrap(),
            MAX_JWT_EXPIRATION_HOURS
        );
        for bad in ["0", "-1", "abc", "8761", &i64::MAX.to_string()] {
            assert!(matches!(
                parse_expiration_hours(bad),
                Err(ConfigError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn cookie_secure_is_inferred_from_frontend_scheme() {
        let mut server = Config::default().server;
        assert!(!server.cookie_secure());

        server.frontend_url = "https://gifts.example.com".to_string();
        assert!(server.cookie_secure());

        server.cookie_secure = Some(false);
        assert!(!server.cookie_secure());
    }
}
