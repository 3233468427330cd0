use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub zipcode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied address fields; the owner always comes from the token
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub name: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub zipcode: String,
}
