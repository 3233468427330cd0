use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};

use super::AuthError;

/// Password hashing collaborator
///
/// Both calls are CPU bound; async callers should run them through
/// `tokio::task::spawn_blocking`.
pub trait SecretHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, AuthError>;

    /// Compare `plain` against a stored PHC hash string
    fn verify(&self, plain: &str, stored_hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Cost parameters: memory in KiB, iterations, lanes
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::Collaborator(format!("invalid argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| AuthError::Collaborator(format!("salt generation failed: {}", e)))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AuthError::Collaborator(format!("salt encoding failed: {}", e)))?;

        self.argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Collaborator(format!("password hashing failed: {}", e)))
    }

    fn verify(&self, plain: &str, stored_hash: &str) -> bool {
        // Cost parameters are read back from the PHC string, so hashes made
        // with older settings still verify.
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self.argon2().verify_password(plain.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Hasher {
        Argon2Hasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = cheap();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = cheap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        assert!(!cheap().verify("anything", "not-a-phc-string"));
    }
}
