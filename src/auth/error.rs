use thiserror::Error;

use crate::database::DatabaseError;

/// Authentication and authorization failures
///
/// The token variants stay distinct so they can be logged, but the HTTP
/// layer collapses them into a single "invalid token" response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Access denied")]
    Denied,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

impl AuthError {
    /// Short stable label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::ResourceNotFound => "resource_not_found",
            AuthError::Denied => "denied",
            AuthError::Signing(_) => "signing_error",
            AuthError::Collaborator(_) => "collaborator_error",
        }
    }
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        AuthError::Collaborator(err.to_string())
    }
}
