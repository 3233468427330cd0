use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, Identity, TokenCodec};
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions by `require_auth`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub identity: Identity,
}

/// Bearer token middleware for protected routes
///
/// Rejections never reach the wrapped handler. Every token failure gets the
/// same 401 body; the specific reason only goes to the log.
pub async fn require_auth(
    State(tokens): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verified = bearer_token(request.headers()).and_then(|token| tokens.verify(token));

    let identity = match verified {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(
                reason = err.kind(),
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected request token"
            );
            return Err(err.into());
        }
    };

    request.extensions_mut().insert(AuthUser { identity });
    Ok(next.run(request).await)
}

/// Pull the token out of the Authorization header
///
/// The `Bearer` scheme prefix is optional and matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?
        .trim();

    if value.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent only when a route forgot the middleware: fail closed
        parts.extensions.get::<AuthUser>().copied().ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "AuthUser requested on an unauthenticated route");
            ApiError::from(AuthError::MissingToken)
        })
    }
}
