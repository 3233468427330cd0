use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthError, Identity};
use crate::database::DatabaseError;

/// Owner lookup for one kind of owner-scoped resource
#[async_trait]
pub trait OwnerStore: Send + Sync {
    /// `Ok(None)` when the resource does not exist
    async fn find_resource_owner(&self, resource_id: i64) -> Result<Option<Identity>, DatabaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Allowed,
    Denied,
}

/// Compares a resource's recorded owner with the requesting identity
///
/// The owner is fetched on every call. Nothing is cached.
#[derive(Clone)]
pub struct OwnershipGuard {
    resource: &'static str,
    owners: Arc<dyn OwnerStore>,
}

impl OwnershipGuard {
    pub fn new(resource: &'static str, owners: Arc<dyn OwnerStore>) -> Self {
        Self { resource, owners }
    }

    pub async fn check_owner(&self, resource_id: i64, identity: Identity) -> Result<Ownership, AuthError> {
        let owner = match self.owners.find_resource_owner(resource_id).await {
            Ok(owner) => owner,
            Err(DatabaseError::NotFound(_)) => None,
            Err(e) => {
                tracing::error!("Owner lookup for {} {} failed: {}", self.resource, resource_id, e);
                return Err(e.into());
            }
        };
        compare(owner, identity)
    }

    /// Like `check_owner` but turns `Denied` into an error for handlers
    pub async fn require_owner(&self, resource_id: i64, identity: Identity) -> Result<(), AuthError> {
        let ownership = self.check_owner(resource_id, identity).await?;
        self.permit(resource_id, ownership, identity)
    }

    /// Enforce ownership against an owner the caller loaded with the resource
    ///
    /// For reads that fetch the row anyway; `None` means the row is gone.
    pub fn require_loaded_owner(
        &self,
        resource_id: i64,
        owner: Option<Identity>,
        identity: Identity,
    ) -> Result<(), AuthError> {
        self.permit(resource_id, compare(owner, identity)?, identity)
    }

    fn permit(&self, resource_id: i64, ownership: Ownership, identity: Identity) -> Result<(), AuthError> {
        match ownership {
            Ownership::Allowed => Ok(()),
            Ownership::Denied => {
                tracing::warn!(
                    user_id = %identity,
                    "Denied access to {} {} owned by another user",
                    self.resource,
                    resource_id
                );
                Err(AuthError::Denied)
            }
        }
    }
}

fn compare(owner: Option<Identity>, identity: Identity) -> Result<Ownership, AuthError> {
    match owner {
        None => Err(AuthError::ResourceNotFound),
        Some(owner) if owner == identity => Ok(Ownership::Allowed),
        Some(_) => Ok(Ownership::Denied),
    }
}
