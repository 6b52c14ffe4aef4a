use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use http::{HeaderValue, StatusCode};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod db;
mod error;
mod middleware;
mod routes;
mod services;
#[cfg(test)]
mod test_support;

use config::{Config, LoggingConfig};
use services::{init, lists::ListService};

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub lists: ListService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    init_tracing(&config.logging);
    tracing::info!("Starting Gift Lists Service");

    // Initialize database
    let pool = init::init_db(&config).await?;

    let app_state = Arc::new(AppState {
        lists: ListService::new(pool.clone()),
        db: pool,
        config: config.clone(),
    });

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Rate limiter for the public auth endpoints. Rejections use the same
    // `{"error": {...}}` body shape as `AppError`.
    let auth_gov_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit.auth_per_second.into())
            .burst_size(config.rate_limit.auth_burst)
            .key_extractor(SmartIpKeyExtractor)
            .error_handler(rate_limit_response)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build auth governor config"))?,
    );

    // Periodically drop stale limiter entries
    let limiter_cleaner = {
        let limiter = auth_gov_conf.limiter().clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Auth rate limiter cleanup task exiting");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::debug!("auth rate limiter size: {}", limiter.len());
                        limiter.retain_recent();
                    }
                }
            }
        })
    };

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .server
                .frontend_url
                .parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid FRONTEND_URL for CORS"))?,
        )
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::header::ACCEPT,
        ])
        .allow_credentials(true);

    let app = routes::router()
        .nest(
            "/api/auth",
            routes::auth::router().layer(GovernorLayer {
                config: auth_gov_conf.clone(),
            }),
        )
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::csp::csp_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let signal_tx = shutdown_tx.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        let _ = signal_tx.send(());
    })
    .await?;

    if tokio::time::timeout(Duration::from_secs(5), limiter_cleaner)
        .await
        .is_err()
    {
        tracing::warn!("Rate limiter cleanup task did not exit in time");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gift_lists=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to bind SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn rate_limit_response(error: GovernorError) -> http::Response<Body> {
    let (status, body, headers) = match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let body = serde_json::json!({
                "error": {
                    "code": "RATE_LIMITED",
                    "message": "Rate limit exceeded",
                    "details": { "retry_after_seconds": wait_time }
                }
            });
            let mut resp = json_response(StatusCode::TOO_MANY_REQUESTS, body, headers);
            resp.headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(wait_time));
            return resp;
        }
        GovernorError::UnableToExtractKey => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": {
                    "code": "INVALID_REQUEST",
                    "message": "Unable to determine client IP for rate limiting"
                }
            }),
            None,
        ),
        GovernorError::Other { code, msg, headers } => (
            StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            serde_json::json!({
                "error": {
                    "code": "INTERNAL_ERROR",
                    "message": msg.unwrap_or_else(|| "Rate limiting error".to_string())
                }
            }),
            headers,
        ),
    };

    json_response(status, body, headers)
}

fn json_response(
    status: StatusCode,
    body: serde_json::Value,
    headers: Option<http::HeaderMap>,
) -> http::Response<Body> {
    let mut resp = http::Response::new(Body::from(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Some(hmap) = headers {
        for (name, value) in hmap.iter() {
            resp.headers_mut().append(name.clone(), value.clone());
        }
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn rate_limited_responses_match_the_error_shape() {
        let resp = rate_limit_response(GovernorError::TooManyRequests {
            wait_time: 3,
            headers: None,
        });

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[http::header::RETRY_AFTER], "3");

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
        assert_eq!(body["error"]["details"]["retry_after_seconds"], 3);
    }
}
