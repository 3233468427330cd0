use async_trait::async_trait;

use crate::auth::Identity;
use crate::database::models::{Address, AddressInput, NewUser, User, UserChanges};
use crate::database::DatabaseError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email or phone is already taken
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user(&self, id: Identity) -> Result<Option<User>, DatabaseError>;

    /// Fails with `NotFound` when the user no longer exists
    async fn update_user(&self, id: Identity, changes: UserChanges) -> Result<User, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Address storage; every mutation is scoped to `(id, owner)`
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn create_address(&self, owner: Identity, input: AddressInput) -> Result<Address, DatabaseError>;

    async fn list_addresses(&self, owner: Identity) -> Result<Vec<Address>, DatabaseError>;

    async fn find_address(&self, id: i64) -> Result<Option<Address>, DatabaseError>;

    async fn update_address(
        &self,
        id: i64,
        owner: Identity,
        input: AddressInput,
    ) -> Result<Address, DatabaseError>;

    async fn delete_address(&self, id: i64, owner: Identity) -> Result<(), DatabaseError>;
}
