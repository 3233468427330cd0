// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /api/auth/login - Authenticate and receive a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "alice@example.com", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// Unknown email and wrong password produce the same 401 body.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;

    let identity = state
        .credentials
        .verify_login(request.email.trim(), &request.password)
        .await?;
    let token = state.tokens.mint(identity, state.token_ttl)?;

    tracing::info!(user_id = %identity, "Issued session token");
    Ok(ApiResponse::success(LoginResponse { token }))
}
