// handlers/protected/mod.rs - Protected handlers
//
// Every route in here sits behind `middleware::require_auth`, and each
// handler takes an `AuthUser` so the identity arrives as a typed argument.
// Owner-scoped resources additionally go through an `OwnershipGuard`:
// 404 when the resource does not exist, 403 when it belongs to someone else.

pub mod account;
pub mod address;

use crate::error::ApiError;

/// Parse a numeric `:id` path segment
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id '{}'", raw)))
}
