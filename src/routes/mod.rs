use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub mod auth;
pub mod health;
pub mod lists;
pub mod sharing;

/// Every route except `/api/auth`, which `main` nests separately so it can
/// carry the rate limiter.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/lists", lists::router().merge(sharing::router()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::models::PermissionLevel;
    use crate::services::auth::AuthService;
    use crate::test_support::{create_user, share_with, test_pool, test_state};

    fn app(state: Arc<AppState>) -> Router {
        router()
            .nest("/api/auth", auth::router())
            .with_state(state)
    }

    fn token_for(state: &Arc<AppState>, user_id: &str) -> String {
        AuthService::issue_token(&state.config.jwt, user_id).unwrap()
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = test_state(test_pool().await);
        let (status, body) = send(&app(state), request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let state = test_state(test_pool().await);
        let app = app(state);

        let (status, body) = send(&app, request(Method::GET, "/api/lists", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send(
            &app,
            request(Method::GET, "/api/lists", Some("garbage"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forbidden_list_looks_exactly_like_a_missing_one() {
        let pool = test_pool().await;
        let state = test_state(pool.clone());
        let owner = create_user(&pool, "owner@example.com").await;
        let stranger = create_user(&pool, "stranger@example.com").await;
        let list = state.lists.create_list(&owner.id, "Private").await.unwrap();
        let app = app(state.clone());
        let token = token_for(&state, &stranger.id);

        let forbidden = send(
            &app,
            request(Method::GET, &format!("/api/lists/{}", list.id), Some(&token), None),
        )
        .await;
        let missing = send(
            &app,
            request(Method::GET, "/api/lists/does-not-exist", Some(&token), None),
        )
        .await;

        assert_eq!(forbidden.0, StatusCode::NOT_FOUND);
        assert_eq!(forbidden, missing);
    }

    #[tokio::test]
    async fn join_login_and_session_cookie() {
        let state = test_state(test_pool().await);
        let app = app(state);
        let credentials = json!({ "email": "Someone@Example.com", "password": "hunter2hunter2" });

        let (status, body) = send(
            &app,
            request(Method::POST, "/api/auth/join", None, Some(credentials.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "someone@example.com");

        let (status, _) = send(
            &app,
            request(Method::POST, "/api/auth/join", None, Some(credentials.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let resp = app
            .clone()
            .oneshot(request(Method::POST, "/api/auth/login", None, Some(credentials)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session="));

        let me = Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, me).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "someone@example.com");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = test_state(test_pool().await);
        let app = app(state);

        send(
            &app,
            request(
                Method::POST,
                "/api/auth/join",
                None,
                Some(json!({ "email": "a@example.com", "password": "password1" })),
            ),
        )
        .await;

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "a@example.com", "password": "password2" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn item_lifecycle_over_http() {
        let pool = test_pool().await;
        let state = test_state(pool.clone());
        let owner = create_user(&pool, "owner@example.com").await;
        let app = app(state.clone());
        let token = token_for(&state, &owner.id);

        let (status, list) = send(
            &app,
            request(Method::POST, "/api/lists", Some(&token), Some(json!({ "title": "Wishes" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(list["permission"], "OWNER");
        let list_id = list["id"].as_str().unwrap().to_string();

        let (status, item) = send(
            &app,
            request(
                Method::POST,
                &format!("/api/lists/{}/items", list_id),
                Some(&token),
                Some(json!({ "title": "Retro Phone", "url": "", "imageUrl": "https://example.com/p.png" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(item.get("url").is_none());
        assert_eq!(item["imageUrl"], "https://example.com/p.png");
        let item_id = item["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            request(
                Method::PUT,
                &format!("/api/lists/{}/items/{}", list_id, item_id),
                Some(&token),
                Some(json!({ "title": "Rotary Phone", "details": "Red" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Rotary Phone");
        assert!(updated.get("imageUrl").is_none());

        let (status, detail) = send(
            &app,
            request(Method::GET, &format!("/api/lists/{}", list_id), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validation_errors_name_their_fields() {
        let pool = test_pool().await;
        let state = test_state(pool.clone());
        let owner = create_user(&pool, "owner@example.com").await;
        let list = state.lists.create_list(&owner.id, "Wishes").await.unwrap();
        let app = app(state.clone());
        let token = token_for(&state, &owner.id);

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &format!("/api/lists/{}/items", list.id),
                Some(&token),
                Some(json!({ "title": "", "url": "not-a-url", "details": "x".repeat(8192) })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = &body["error"]["details"]["fields"];
        assert_eq!(fields["title"], "Cannot be blank");
        assert_eq!(fields["url"], "Must be a valid URL");
        assert!(fields["details"].is_string());
    }

    #[tokio::test]
    async fn viewers_cannot_add_items() {
        let pool = test_pool().await;
        let state = test_state(pool.clone());
        let owner = create_user(&pool, "owner@example.com").await;
        let viewer = create_user(&pool, "viewer@example.com").await;
        let list = state.lists.create_list(&owner.id, "Wishes").await.unwrap();
        share_with(&pool, &viewer.id, &list.id, PermissionLevel::Viewer).await;
        let app = app(state.clone());
        let token = token_for(&state, &viewer.id);

        let (status, _) = send(
            &app,
            request(Method::GET, &format!("/api/lists/{}", list.id), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &format!("/api/lists/{}/items", list.id),
                Some(&token),
                Some(json!({ "title": "Sneaky" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Gift list not found");
    }

    #[tokio::test]
    async fn sharing_endpoints() {
        let pool = test_pool().await;
        let state = test_state(pool.clone());
        let owner = create_user(&pool, "owner@example.com").await;
        let friend = create_user(&pool, "friend@example.com").await;
        let list = state.lists.create_list(&owner.id, "Wishes").await.unwrap();
        let app = app(state.clone());
        let token = token_for(&state, &owner.id);
        let sharing = format!("/api/lists/{}/sharing", list.id);
        let friend_uri = format!("{}/{}", sharing, friend.id);

        let (status, body) = send(
            &app,
            request(Method::POST, &sharing, Some(&token), Some(json!({ "email": "friend@example.com" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["permission"], "VIEWER");

        let (status, _) = send(
            &app,
            request(Method::PUT, &friend_uri, Some(&token), Some(json!({ "permission": "admin" }))),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &app,
            request(Method::PUT, &friend_uri, Some(&token), Some(json!({ "permission": "editor" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["permission"], "EDITOR");

        let (status, body) = send(&app, request(Method::GET, &sharing, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let self_uri = format!("{}/{}", sharing, owner.id);
        let (status, body) = send(&app, request(Method::DELETE, &self_uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["details"]["fields"]["targetUserId"].is_string());

        let (status, _) = send(&app, request(Method::DELETE, &friend_uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, request(Method::DELETE, &friend_uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
