//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use spindle_core::{CreateUser, Role};
use spindle_server::{create_router, services::AuthService, state::AppState};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub mod fixtures {
    pub const TEST_PASSWORD: &str = "TestPassword123!";
    pub const DEFAULT_TAG: &str = "rock";
    pub const REVIEW_BODY: &str = "Dense, warm and far better on the third listen than the first.";
}

/// A full router over a throwaway SQLite file
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub auth: Arc<AuthService>,
    _temp_dir: TempDir,
}

/// Status, headers and decoded JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let pool = spindle_storage::create_pool(&db_url).await.unwrap();
        spindle_storage::run_migrations(&pool).await.unwrap();

        let auth = Arc::new(AuthService::new("test-secret-key".to_string(), 1).with_hash_cost(4));
        let router = create_router(AppState::new(pool.clone(), Arc::clone(&auth)));

        Self {
            router,
            pool,
            auth,
            _temp_dir: temp_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// JSON request with an optional Bearer token
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register through the API; returns `(token, user id)`
    pub async fn register(&self, username: &str) -> (String, String) {
        let response = self
            .post(
                "/api/v1/users/register",
                None,
                json!({
                    "name": format!("{username} tester"),
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": fixtures::TEST_PASSWORD,
                    "confirmPassword": fixtures::TEST_PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        (
            response.body["token"].as_str().unwrap().to_string(),
            response.body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Admins can only be created out of band; returns a token for one
    pub async fn admin(&self, username: &str) -> String {
        let user = spindle_storage::users::create(
            &self.pool,
            CreateUser {
                name: "Admin".to_string(),
                email: format!("{username}@example.com"),
                username: username.to_string(),
                password_hash: self.auth.hash_password(fixtures::TEST_PASSWORD).unwrap(),
                role: Role::Admin,
                location: None,
                fav_genres: Vec::new(),
                fav_artists: Vec::new(),
            },
        )
        .await
        .unwrap();

        self.auth.create_token(&user.id).unwrap()
    }

    /// Create an album through the API; returns its id. Without tags the
    /// album gets [`fixtures::DEFAULT_TAG`].
    pub async fn album(&self, token: &str, title: &str, tags: &[&str]) -> String {
        let tags = if tags.is_empty() { &[fixtures::DEFAULT_TAG][..] } else { tags };
        let response = self
            .post(
                "/api/v1/albums",
                Some(token),
                json!({
                    "artist": "Radiohead",
                    "title": title,
                    "genre": "Rock",
                    "info": "Fourth studio album",
                    "year": "2000",
                    "label": "Parlophone",
                    "tracks": 10,
                    "tags": tags,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["album"]["id"].as_str().unwrap().to_string()
    }

    pub async fn review(&self, token: &str, album: &str, rating: u8) -> TestResponse {
        self.post(
            &format!("/api/v1/albums/{album}/reviews"),
            Some(token),
            json!({ "review": fixtures::REVIEW_BODY, "rating": rating }),
        )
        .await
    }
}
