//! Shared fixtures for router tests

use crate::clock::FixedClock;
use crate::config::AppConfig;
use crate::repositories::MemoryStore;
use crate::routes::create_router;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use startkit_shared::{CreateUserRequest, User};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over an in-memory store and a manually driven clock
pub struct TestContext {
    pub state: AppState,
    pub store: MemoryStore,
    pub clock: FixedClock,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(AppConfig::for_tests())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let clock = FixedClock::new(Utc::now());
        let state = AppState::with_stores(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();

        Self { state, store, clock }
    }

    pub fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn seed_user(&self, email: &str, password: &str) -> User {
        UserService::create(
            self.state.users(),
            self.state.passwords(),
            CreateUserRequest {
                email: email.to_string(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                social_name: None,
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                password: password.to_string(),
            },
        )
        .await
        .unwrap()
    }

    /// Log in through the router and return the access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self.send(login_request("/api/v1/auth", email, password)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn login_request(uri: &str, email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", email, password)))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}
