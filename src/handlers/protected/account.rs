// handlers/protected/account.rs - The caller's own account

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;

use crate::app::AppState;
use crate::database::models::{User, UserChanges};
use crate::error::ApiError;
use crate::handlers::public::auth::register::validate_email_format;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/accounts/me - Profile of the authenticated user
pub async fn me_get(State(state): State<AppState>, user: AuthUser) -> ApiResult<User> {
    let account = state
        .users
        .find_user(user.identity)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(account))
}

/// PUT /api/accounts/me - Update name, email or phone
///
/// Omitted fields keep their current value. Taking an email or phone that
/// belongs to another account is a 409.
pub async fn me_put(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<UserChanges>, JsonRejection>,
) -> ApiResult<User> {
    let Json(mut changes) = payload?;

    for field in [&mut changes.name, &mut changes.email, &mut changes.phone] {
        if let Some(value) = field {
            *value = value.trim().to_string();
            if value.is_empty() {
                return Err(ApiError::bad_request("Fields cannot be set to an empty value"));
            }
        }
    }
    if let Some(email) = changes.email.as_deref() {
        validate_email_format(email).map_err(ApiError::bad_request)?;
    }

    let account = state.users.update_user(user.identity, changes).await?;
    Ok(ApiResponse::success(account))
}
