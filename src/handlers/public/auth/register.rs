// handlers/public/auth/register.rs - POST /api/auth/register handler

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/register - Create a new user account
///
/// Expected Input:
/// ```json
/// { "name": "Alice", "email": "alice@example.com", "phone": "555-0100", "password": "..." }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "message": "User created", "id": 1 }
/// ```
///
/// Email and phone uniqueness is enforced by the store; a duplicate is a 409.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    validate_registration(&request)?;

    let hasher = Arc::clone(&state.hasher);
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthError::Collaborator(format!("hashing task failed: {}", e)))??;

    let user = state
        .users
        .create_user(NewUser {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "Registered new user");
    Ok(ApiResponse::created(json!({ "message": "User created", "id": user.id })))
}

fn validate_registration(request: &RegisterRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    for (field, value) in [
        ("name", &request.name),
        ("email", &request.email),
        ("phone", &request.phone),
        ("password", &request.password),
    ] {
        if value.trim().is_empty() {
            field_errors.insert(field.to_string(), "This field is required".to_string());
        }
    }

    if !field_errors.contains_key("email") {
        if let Err(msg) = validate_email_format(request.email.trim()) {
            field_errors.insert("email".to_string(), msg);
        }
    }

    if !field_errors.contains_key("password") && request.password.chars().count() < MIN_PASSWORD_LENGTH {
        field_errors.insert(
            "password".to_string(),
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Invalid registration data", Some(field_errors)))
    }
}

/// Basic shape check: one `@`, non-empty local part, dotted domain
pub fn validate_email_format(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    match domain.split_once('.') {
        Some((head, tail)) if !head.is_empty() && !tail.is_empty() && !domain.ends_with('.') => Ok(()),
        _ => Err("Invalid email format".to_string()),
    }
}
