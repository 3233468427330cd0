pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryAddresses, MemoryUsers};
pub use postgres::{PgAddresses, PgUsers};
pub use repository::{AddressRepository, UserRepository};
