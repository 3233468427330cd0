// auth/mod.rs - Token issuing, credential checks and ownership authorization
//
// Everything in here is transport agnostic: the HTTP layer lives in
// `crate::middleware::auth` and only calls into these types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod credentials;
pub mod error;
pub mod ownership;
pub mod password;
pub mod token;

pub use credentials::{CredentialVerifier, Principal, PrincipalStore};
pub use error::AuthError;
pub use ownership::{OwnerStore, Ownership, OwnershipGuard};
pub use password::{Argon2Hasher, SecretHasher};
pub use token::{Claims, Clock, SystemClock, TokenCodec};

/// Authenticated principal identifier (the `users.id` primary key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(i64);

impl Identity {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}
