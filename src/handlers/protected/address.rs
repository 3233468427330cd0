// handlers/protected/address.rs - Owner-scoped address CRUD
//
// The owner is always the authenticated caller; a `user_id` in the request
// body is ignored.

use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;

use crate::app::AppState;
use crate::auth::Identity;
use crate::database::models::{Address, AddressInput};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::parse_id;

/// GET /api/addresses - Addresses owned by the caller
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Address>> {
    let addresses = state.addresses.list_addresses(user.identity).await?;
    Ok(ApiResponse::success(addresses))
}

/// POST /api/addresses - Create an address for the caller
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<AddressInput>, JsonRejection>,
) -> ApiResult<Address> {
    let Json(input) = payload?;
    let address = state.addresses.create_address(user.identity, input).await?;

    tracing::debug!(user_id = %user.identity, address_id = address.id, "Created address");
    Ok(ApiResponse::created(address))
}

/// GET /api/addresses/:id
pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Address> {
    let id = parse_id(&id)?;
    let address = state.addresses.find_address(id).await?;

    let owner = address.as_ref().map(|a| Identity::new(a.user_id));
    state.address_owners.require_loaded_owner(id, owner, user.identity)?;

    match address {
        Some(address) => Ok(ApiResponse::success(address)),
        None => Err(ApiError::not_found("Resource not found")),
    }
}

/// PUT /api/addresses/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<AddressInput>, JsonRejection>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    state.address_owners.require_owner(id, user.identity).await?;

    state.addresses.update_address(id, user.identity, input).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /api/addresses/:id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    state.address_owners.require_owner(id, user.identity).await?;

    state.addresses.delete_address(id, user.identity).await?;
    Ok(ApiResponse::no_content())
}
