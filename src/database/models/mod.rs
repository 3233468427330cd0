pub mod address;
pub mod user;

pub use address::{Address, AddressInput};
pub use user::{NewUser, User, UserChanges};
