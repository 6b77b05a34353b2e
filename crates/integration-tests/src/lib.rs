//! Test harness for the store ratings API.
//!
//! Each [`TestApp`] is the real router over a fresh in-memory repository, so
//! tests run in parallel without a database. Requests go through
//! `tower::ServiceExt::oneshot`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p store-ratings-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use store_ratings_core::{Role, UserId};
use store_ratings_server::config::{RatingsConfig, SentryConfig, StorageBackend};
use store_ratings_server::db::MemoryRepository;
use store_ratings_server::routes;
use store_ratings_server::services::auth::{AuthService, Registration};
use store_ratings_server::state::AppState;

/// Signing key used by every test app.
pub const TEST_JWT_SECRET: &str = "kq7V2mZp9RtXw4Lc8NbHy3Gd6Fs1Ja5U";

/// A response status and its body, parsed as JSON when possible.
pub type Reply = (StatusCode, Value);

/// Configuration for an in-memory server.
#[must_use]
pub fn test_config() -> RatingsConfig {
    RatingsConfig {
        storage: StorageBackend::Memory,
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        jwt_secret: SecretString::from(TEST_JWT_SECRET.to_owned()),
        access_token_ttl: chrono::Duration::hours(1),
        refresh_token_ttl: chrono::Duration::days(7),
        cors_origins: Vec::new(),
        sentry: SentryConfig::default(),
    }
}

/// The router plus a handle on its storage.
pub struct TestApp {
    router: Router,
    repo: Arc<MemoryRepository>,
}

/// A logged-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: UserId,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let state = AppState::new(test_config(), repo.clone()).unwrap();
        Self {
            router: routes::app(state),
            repo,
        }
    }

    /// The backing repository, for direct assertions.
    #[must_use]
    pub fn repo(&self) -> &MemoryRepository {
        &self.repo
    }

    /// Send a raw request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and collect the reply.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register through the public signup route.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Reply {
        self.post(
            "/v1/auth/signup",
            None,
            json!({ "name": name, "email": email, "password": password, "address": "Addr" }),
        )
        .await
    }

    /// Log in and return the token pair.
    pub async fn login(&self, email: &str, password: &str) -> Session {
        let (status, body) = self
            .post(
                "/v1/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        Session {
            id: UserId::new(i32::try_from(body["user"]["id"].as_i64().unwrap()).unwrap()),
            access_token: body["accessToken"].as_str().unwrap().to_owned(),
            refresh_token: body["refreshToken"].as_str().unwrap().to_owned(),
        }
    }

    /// Create a user with any role directly in storage, then log in.
    pub async fn user_with_role(&self, name: &str, email: &str, role: Role) -> Session {
        let password = format!("{}-pass", role.as_str());
        AuthService::new(self.repo.as_ref())
            .register(Registration {
                name: name.to_owned(),
                email: email.to_owned(),
                password: password.clone(),
                address: String::new(),
                role,
            })
            .await
            .unwrap();
        self.login(email, &password).await
    }

    /// Create a store as `admin` and return its id.
    pub async fn create_store(&self, admin: &Session, name: &str, owner: Option<UserId>) -> i64 {
        let (status, body) = self
            .post(
                "/v1/stores",
                Some(&admin.access_token),
                json!({ "name": name, "address": "1 Main St", "ownerId": owner }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "store creation failed: {body}");
        body["id"].as_i64().unwrap()
    }

    /// Rate a store as `session`.
    pub async fn rate(&self, session: &Session, store: i64, rating: i64) -> Reply {
        self.post(
            &format!("/v1/stores/{store}/rating"),
            Some(&session.access_token),
            json!({ "rating": rating }),
        )
        .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
