use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthError, Identity, SecretHasher};
use crate::database::DatabaseError;

/// Stored login record: the identity plus its password hash
#[derive(Debug, Clone)]
pub struct Principal {
    pub identity: Identity,
    pub secret_hash: String,
}

/// User-store lookup consumed by the credential verifier
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// `Ok(None)` when no user has this login identifier
    async fn find_principal_by_login(&self, login: &str) -> Result<Option<Principal>, DatabaseError>;
}

/// Compared against when the login is unknown; uses the default Argon2id cost
/// so the rejection takes as long as a real mismatch. No secret matches it.
const UNKNOWN_LOGIN_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Decides whether submitted login credentials are valid
#[derive(Clone)]
pub struct CredentialVerifier {
    principals: Arc<dyn PrincipalStore>,
    hasher: Arc<dyn SecretHasher>,
}

impl CredentialVerifier {
    pub fn new(principals: Arc<dyn PrincipalStore>, hasher: Arc<dyn SecretHasher>) -> Self {
        Self { principals, hasher }
    }

    /// Resolve `login` and check `secret` against the stored hash
    ///
    /// Unknown logins and wrong secrets both come back as
    /// `InvalidCredentials`, and both pay for one hash comparison. Only store
    /// or hasher infrastructure failures surface as `Collaborator`.
    pub async fn verify_login(&self, login: &str, secret: &str) -> Result<Identity, AuthError> {
        let (identity, stored_hash) = match self.principals.find_principal_by_login(login).await {
            Ok(Some(principal)) => (Some(principal.identity), principal.secret_hash),
            Ok(None) | Err(DatabaseError::NotFound(_)) => (None, UNKNOWN_LOGIN_HASH.to_string()),
            Err(e) => {
                tracing::error!("Principal lookup failed: {}", e);
                return Err(e.into());
            }
        };

        let hasher = Arc::clone(&self.hasher);
        let secret = secret.to_owned();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&secret, &stored_hash))
            .await
            .map_err(|e| AuthError::Collaborator(format!("secret comparison task failed: {}", e)))?;

        match identity {
            Some(identity) if matches => Ok(identity),
            Some(identity) => {
                tracing::info!(user_id = %identity, "Login rejected: secret mismatch");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                tracing::info!("Login rejected: unknown login identifier");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stores the plain secret as the "hash" to keep tests fast
    struct PlainHasher;

    impl SecretHasher for PlainHasher {
        fn hash(&self, plain: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{}", plain))
        }

        fn verify(&self, plain: &str, stored_hash: &str) -> bool {
            stored_hash == format!("plain:{}", plain)
        }
    }

    /// Counts comparisons, otherwise behaves like `PlainHasher`
    #[derive(Default)]
    struct CountingHasher {
        verifies: AtomicUsize,
    }

    impl SecretHasher for CountingHasher {
        fn hash(&self, plain: &str) -> Result<String, AuthError> {
            PlainHasher.hash(plain)
        }

        fn verify(&self, plain: &str, stored_hash: &str) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            PlainHasher.verify(plain, stored_hash)
        }
    }

    struct FixedPrincipals(HashMap<String, Principal>);

    #[async_trait]
    impl PrincipalStore for FixedPrincipals {
        async fn find_principal_by_login(&self, login: &str) -> Result<Option<Principal>, DatabaseError> {
            Ok(self.0.get(login).cloned())
        }
    }

    struct BrokenPrincipals;

    #[async_trait]
    impl PrincipalStore for BrokenPrincipals {
        async fn find_principal_by_login(&self, _login: &str) -> Result<Option<Principal>, DatabaseError> {
            Err(DatabaseError::QueryError("connection reset".to_string()))
        }
    }

    fn alice() -> Arc<FixedPrincipals> {
        let mut principals = HashMap::new();
        principals.insert(
            "alice@example.com".to_string(),
            Principal {
                identity: Identity::new(1),
                secret_hash: PlainHasher.hash("wonderland").unwrap(),
            },
        );
        Arc::new(FixedPrincipals(principals))
    }

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(alice(), Arc::new(PlainHasher))
    }

    #[tokio::test]
    async fn test_correct_secret_returns_identity() {
        let identity = verifier()
            .verify_login("alice@example.com", "wonderland")
            .await
            .unwrap();
        assert_eq!(identity, Identity::new(1));
    }

    #[tokio::test]
    async fn test_unknown_login_and_wrong_secret_look_the_same() {
        let verifier = verifier();
        let unknown = verifier
            .verify_login("mallory@example.com", "wonderland")
            .await
            .unwrap_err();
        let wrong = verifier
            .verify_login("alice@example.com", "looking-glass")
            .await
            .unwrap_err();

        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_invalid_credentials() {
        let verifier = CredentialVerifier::new(Arc::new(BrokenPrincipals), Arc::new(PlainHasher));
        let err = verifier
            .verify_login("alice@example.com", "wonderland")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Collaborator(_)));
    }

    #[tokio::test]
    async fn test_unknown_login_still_runs_a_comparison() {
        let hasher = Arc::new(CountingHasher::default());
        let verifier = CredentialVerifier::new(alice(), hasher.clone());

        let unknown = verifier.verify_login("mallory@example.com", "wonderland").await;
        assert_eq!(unknown, Err(AuthError::InvalidCredentials));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);

        let wrong = verifier.verify_login("alice@example.com", "looking-glass").await;
        assert_eq!(wrong, Err(AuthError::InvalidCredentials));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_login_hash_is_a_valid_phc_that_never_matches() {
        let hasher = crate::auth::Argon2Hasher::default();
        assert!(password_hash::PasswordHash::new(UNKNOWN_LOGIN_HASH).is_ok());
        assert!(!hasher.verify("", UNKNOWN_LOGIN_HASH));
        assert!(!hasher.verify("wonderland", UNKNOWN_LOGIN_HASH));
    }
}
