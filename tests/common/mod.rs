#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_api::auth::{Argon2Hasher, TokenCodec};
use storefront_api::database::{MemoryAddresses, MemoryUsers};
use storefront_api::{app, AppState};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";
pub const PASSWORD: &str = "correct-horse-battery";

/// In-process server backed by in-memory repositories
pub struct TestServer {
    pub router: Router,
    pub state: AppState,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(15))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let tokens = TokenCodec::new(TEST_SECRET).expect("token codec");
        // Minimum argon2 cost keeps the suite fast
        let hasher = Arc::new(Argon2Hasher::with_params(8, 1, 1).expect("argon2 params"));

        Self::from_state(AppState::new(
            tokens,
            ttl,
            hasher,
            Arc::new(MemoryUsers::new()),
            Arc::new(MemoryAddresses::new()),
        ))
    }

    pub fn without_request_logging() -> Self {
        let server = Self::new();
        Self::from_state(server.state.with_request_logging(false))
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: app(state.clone()),
            state,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };
        Ok((status, json))
    }

    /// Register a user whose email and phone derive from `name`
    pub async fn register(&self, name: &str) -> Result<i64> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email_for(name),
                    "phone": format!("555-{}", name),
                    "password": PASSWORD,
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register {}: {} {}", name, status, body);
        body["id"].as_i64().context("register response without id")
    }

    pub async fn login(&self, name: &str) -> Result<String> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email_for(name), "password": PASSWORD })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login {}: {} {}", name, status, body);
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response without token")
    }

    pub async fn register_and_login(&self, name: &str) -> Result<(i64, String)> {
        let id = self.register(name).await?;
        let token = self.login(name).await?;
        Ok((id, token))
    }
}

pub fn email_for(name: &str) -> String {
    format!("{}@example.com", name)
}

pub fn address_body(name: &str) -> Value {
    json!({
        "name": name,
        "street": "12 Baker Street",
        "city": "London",
        "province": "Greater London",
        "zipcode": "NW1 6XE",
    })
}
