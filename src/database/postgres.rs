// database/postgres.rs - sqlx-backed repositories
//
// Each repository holds a clone of the shared pool handed out by
// `DatabaseManager`; nothing here reaches for a global connection.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::auth::{Identity, OwnerStore, Principal, PrincipalStore};
use crate::database::models::{Address, AddressInput, NewUser, User, UserChanges};
use crate::database::repository::{AddressRepository, UserRepository};
use crate::database::DatabaseError;

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, role, created_at, updated_at";
const ADDRESS_COLUMNS: &str =
    "id, user_id, name, street, city, province, zipcode, created_at, updated_at";

#[derive(Clone)]
pub struct PgUsers {
    pool: PgPool,
}

impl PgUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUsers {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (name, email, phone, password_hash) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn find_user(&self, id: Identity) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Identity, changes: UserChanges) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id.get())
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_write)?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for PgUsers {
    async fn find_principal_by_login(&self, login: &str) -> Result<Option<Principal>, DatabaseError> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<Principal, DatabaseError> {
            Ok(Principal {
                identity: Identity::new(row.try_get("id")?),
                secret_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }
}

#[derive(Clone)]
pub struct PgAddresses {
    pool: PgPool,
}

impl PgAddresses {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressRepository for PgAddresses {
    async fn create_address(&self, owner: Identity, input: AddressInput) -> Result<Address, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO addresses (user_id, name, street, city, province, zipcode)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );
        sqlx::query_as::<_, Address>(&sql)
            .bind(owner.get())
            .bind(&input.name)
            .bind(&input.street)
            .bind(&input.city)
            .bind(&input.province)
            .bind(&input.zipcode)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn list_addresses(&self, owner: Identity) -> Result<Vec<Address>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM addresses WHERE user_id = $1 ORDER BY id",
            ADDRESS_COLUMNS
        );
        let addresses = sqlx::query_as::<_, Address>(&sql)
            .bind(owner.get())
            .fetch_all(&self.pool)
            .await?;
        Ok(addresses)
    }

    async fn find_address(&self, id: i64) -> Result<Option<Address>, DatabaseError> {
        let sql = format!("SELECT {} FROM addresses WHERE id = $1", ADDRESS_COLUMNS);
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(address)
    }

    async fn update_address(
        &self,
        id: i64,
        owner: Identity,
        input: AddressInput,
    ) -> Result<Address, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE addresses SET
                name = $3, street = $4, city = $5, province = $6, zipcode = $7,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );
        sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(owner.get())
            .bind(&input.name)
            .bind(&input.street)
            .bind(&input.city)
            .bind(&input.province)
            .bind(&input.zipcode)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_write)?
            .ok_or_else(|| DatabaseError::NotFound(format!("address {}", id)))
    }

    async fn delete_address(&self, id: i64, owner: Identity) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("address {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl OwnerStore for PgAddresses {
    async fn find_resource_owner(&self, resource_id: i64) -> Result<Option<Identity>, DatabaseError> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM addresses WHERE id = $1")
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner.map(Identity::new))
    }
}
