// database/memory.rs - In-process repositories
//
// Used by the test suite and by development runs without DATABASE_URL.
// They honor the same contracts as the Postgres repositories, including
// the email/phone uniqueness the credential check depends on.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::auth::{Identity, OwnerStore, Principal, PrincipalStore};
use crate::database::models::{Address, AddressInput, NewUser, User, UserChanges};
use crate::database::repository::{AddressRepository, UserRepository};
use crate::database::DatabaseError;

struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    table: RwLock<Table<User>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(
    rows: &BTreeMap<i64, User>,
    skip: Option<i64>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), DatabaseError> {
    for user in rows.values().filter(|u| Some(u.id) != skip) {
        if email == Some(user.email.as_str()) {
            return Err(DatabaseError::Conflict("Email already exists".to_string()));
        }
        if phone == Some(user.phone.as_str()) {
            return Err(DatabaseError::Conflict("Phone already exists".to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut table = self.table.write().await;
        check_unique(&table.rows, None, Some(&user.email), Some(&user.phone))?;

        let now = Utc::now();
        let id = table.allocate_id();
        let row = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Identity) -> Result<Option<User>, DatabaseError> {
        Ok(self.table.read().await.rows.get(&id.get()).cloned())
    }

    async fn update_user(&self, id: Identity, changes: UserChanges) -> Result<User, DatabaseError> {
        let mut table = self.table.write().await;
        check_unique(
            &table.rows,
            Some(id.get()),
            changes.email.as_deref(),
            changes.phone.as_deref(),
        )?;

        let user = table
            .rows
            .get_mut(&id.get())
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for MemoryUsers {
    async fn find_principal_by_login(&self, login: &str) -> Result<Option<Principal>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| u.email == login)
            .map(|u| Principal {
                identity: Identity::new(u.id),
                secret_hash: u.password_hash.clone(),
            }))
    }
}

#[derive(Default)]
pub struct MemoryAddresses {
    table: RwLock<Table<Address>>,
}

impl MemoryAddresses {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressRepository for MemoryAddresses {
    async fn create_address(&self, owner: Identity, input: AddressInput) -> Result<Address, DatabaseError> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        let id = table.allocate_id();
        let row = Address {
            id,
            user_id: owner.get(),
            name: input.name,
            street: input.street,
            city: input.city,
            province: input.province,
            zipcode: input.zipcode,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn list_addresses(&self, owner: Identity) -> Result<Vec<Address>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|a| a.user_id == owner.get())
            .cloned()
            .collect())
    }

    async fn find_address(&self, id: i64) -> Result<Option<Address>, DatabaseError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update_address(
        &self,
        id: i64,
        owner: Identity,
        input: AddressInput,
    ) -> Result<Address, DatabaseError> {
        let mut table = self.table.write().await;
        let address = table
            .rows
            .get_mut(&id)
            .filter(|a| a.user_id == owner.get())
            .ok_or_else(|| DatabaseError::NotFound(format!("address {}", id)))?;

        address.name = input.name;
        address.street = input.street;
        address.city = input.city;
        address.province = input.province;
        address.zipcode = input.zipcode;
        address.updated_at = Utc::now();
        Ok(address.clone())
    }

    async fn delete_address(&self, id: i64, owner: Identity) -> Result<(), DatabaseError> {
        let mut table = self.table.write().await;
        let owned = table.rows.get(&id).is_some_and(|a| a.user_id == owner.get());
        if !owned {
            return Err(DatabaseError::NotFound(format!("address {}", id)));
        }
        table.rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl OwnerStore for MemoryAddresses {
    async fn find_resource_owner(&self, resource_id: i64) -> Result<Option<Identity>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&resource_id).map(|a| Identity::new(a.user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn input(name: &str) -> AddressInput {
        AddressInput {
            name: name.to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            province: "IL".to_string(),
            zipcode: "62701".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unique_email_and_phone() {
        let users = MemoryUsers::new();
        users.create_user(new_user("a@example.com", "111")).await.unwrap();

        let dup_email = users.create_user(new_user("a@example.com", "222")).await;
        assert!(matches!(dup_email, Err(DatabaseError::Conflict(m)) if m == "Email already exists"));

        let dup_phone = users.create_user(new_user("b@example.com", "111")).await;
        assert!(matches!(dup_phone, Err(DatabaseError::Conflict(m)) if m == "Phone already exists"));
    }

    #[tokio::test]
    async fn test_update_user_keeps_own_email() {
        let users = MemoryUsers::new();
        let user = users.create_user(new_user("a@example.com", "111")).await.unwrap();

        let changes = UserChanges {
            name: Some("Renamed".to_string()),
            email: Some("a@example.com".to_string()),
            phone: None,
        };
        let updated = users.update_user(Identity::new(user.id), changes).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.phone, "111");
    }

    #[tokio::test]
    async fn test_principal_lookup_by_email() {
        let users = MemoryUsers::new();
        let user = users.create_user(new_user("a@example.com", "111")).await.unwrap();

        let principal = users.find_principal_by_login("a@example.com").await.unwrap().unwrap();
        assert_eq!(principal.identity, Identity::new(user.id));
        assert!(users.find_principal_by_login("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_address_mutations_are_owner_scoped() {
        let addresses = MemoryAddresses::new();
        let alice = Identity::new(1);
        let bob = Identity::new(2);
        let home = addresses.create_address(alice, input("home")).await.unwrap();

        assert!(matches!(
            addresses.update_address(home.id, bob, input("stolen")).await,
            Err(DatabaseError::NotFound(_))
        ));
        assert!(matches!(
            addresses.delete_address(home.id, bob).await,
            Err(DatabaseError::NotFound(_))
        ));
        assert_eq!(addresses.find_address(home.id).await.unwrap().unwrap().name, "home");
        assert_eq!(addresses.find_resource_owner(home.id).await.unwrap(), Some(alice));

        addresses.delete_address(home.id, alice).await.unwrap();
        assert_eq!(addresses.find_resource_owner(home.id).await.unwrap(), None);
    }
}
