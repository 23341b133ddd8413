//! API routes

use crate::api::handlers::{
    create_book, delete_book, get_book, list_books, update_book,
    get_profile, update_profile,
    AppState,
};
use crate::auth::handlers::{login, register};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    // Protected routes, behind the request gate
    let protected_routes = Router::new()
        .route("/api/user/profile", get(get_profile).put(update_profile))
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .layer(middleware::from_fn_with_state(
            state.token_service.clone(),
            authenticate,
        ));

    public_routes
        .merge(protected_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::db::manager::DatabaseManager;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let auth = AuthConfig {
            jwt_secret: Some("routes-test-secret".to_string()),
            issuer: "bookshelf".to_string(),
            token_lifetime_secs: 3600,
            bcrypt_cost: 4,
        };
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        AppState::new(&auth, db).unwrap()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register_user(app: &Router, name: &str, email: &str) -> (String, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": name, "email": email, "password": "longenough1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    fn book_body(title: &str) -> Value {
        json!({"title": title, "author": "Frank Herbert", "price": 20, "description": "Spice"})
    }

    #[tokio::test]
    async fn test_register_then_duplicate_is_conflict() {
        let state = test_state();
        let app = build_api_routes(state.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Ann", "email": "a@x.com", "password": "longenough1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["code"], 201);
        assert!(body["errors"].is_null());
        assert!(body["data"]["token"].is_string());
        assert!(body["data"].get("password_hash").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Ann Again", "email": "a@x.com", "password": "longenough1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 409);
        assert!(body["errors"].is_array());
        assert!(body["data"].is_object());

        assert_eq!(state.user_repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login() {
        let app = build_api_routes(test_state());
        register_user(&app, "Ann", "a@x.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0], "Invalid credentials");
        assert!(body["data"].get("token").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "nobody@x.com", "password": "longenough1"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0], "Invalid credentials");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "longenough1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["token"].is_string());
    }

    #[tokio::test]
    async fn test_login_does_not_match_on_truncated_password() {
        let app = build_api_routes(test_state());
        let password = "b".repeat(72);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Ann", "email": "a@x.com", "password": password})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": format!("{}zzz", password)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["data"].get("token").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": password})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["token"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_bad_request() {
        let app = build_api_routes(test_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "A", "email": "not-an-email", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 3);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_route_without_token() {
        let app = build_api_routes(test_state());

        let (status, body) = send(&app, Method::GET, "/api/books", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0], "No token found");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/books",
            None,
            Some(book_body("Dune")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_only_owner_can_mutate_book() {
        let app = build_api_routes(test_state());
        let (alice_id, alice) = register_user(&app, "Alice", "alice@x.com").await;
        let (_, bob) = register_user(&app, "Bob", "bob@x.com").await;

        let mut create = book_body("Dune");
        create["user_id"] = json!("forged-owner");
        let (status, body) = send(&app, Method::POST, "/api/books", Some(&alice), Some(create)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user_id"], alice_id.as_str());
        let book_id = body["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/books/{}", book_id);

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&bob),
            Some(book_body("Stolen")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 403);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let bearer = format!("Bearer {}", alice);
        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&bearer),
            Some(book_body("Children of Dune")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Children of Dune");
        assert_eq!(body["data"]["user"]["id"], alice_id.as_str());

        // Reads are not ownership-gated
        let (status, body) = send(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Children of Dune");

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Gone is indistinguishable from not owned for mutations
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_profile() {
        let app = build_api_routes(test_state());
        let (_, ann) = register_user(&app, "Ann", "ann@x.com").await;
        register_user(&app, "Bob", "bob@x.com").await;

        send(&app, Method::POST, "/api/books", Some(&ann), Some(book_body("Dune"))).await;

        let (status, body) = send(&app, Method::GET, "/api/user/profile", Some(&ann), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "ann@x.com");
        assert_eq!(body["data"]["books"].as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/user/profile",
            Some(&ann),
            Some(json!({"name": "Ann", "email": "bob@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/user/profile",
            Some(&ann),
            Some(json!({"name": "Ann Marie", "email": "ann@x.com", "password": "brand-new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Ann Marie");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ann@x.com", "password": "brand-new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
