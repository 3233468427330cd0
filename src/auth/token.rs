use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, Identity};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claim set carried inside every session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a string per RFC 7519
    pub sub: String,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Wall clock used for minting and for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Signs and verifies session tokens with a process-wide HMAC secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &[u8], clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Signing("JWT secret is empty".to_string()));
        }

        // Expiry is checked by hand in `verify` so the boundary is exact
        // (`now >= exp` rejects) and comes from the injected clock.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    /// Mint a token for `identity` that expires `ttl` from now
    ///
    /// The expiry claim has whole-second precision, so the deadline is
    /// rounded up: a token is never rejected before `ttl` has elapsed.
    pub fn mint(&self, identity: Identity, ttl: Duration) -> Result<String, AuthError> {
        let now = self.clock.now();
        let deadline = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing(format!("token ttl of {}s overflows the clock", ttl.num_seconds())))?;
        let exp = deadline.timestamp() + i64::from(deadline.timestamp_subsec_nanos() > 0);

        let claims = Claims {
            sub: identity.to_string(),
            iat: now.timestamp(),
            exp,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded identity
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(token)?;

        let identity = claims
            .sub
            .parse::<Identity>()
            .map_err(|_| AuthError::MalformedToken)?;

        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedToken)?;
        if self.clock.now() >= expires_at {
            return Err(AuthError::Expired);
        }

        Ok(identity)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        // HMAC verification inside jsonwebtoken compares tags in constant time
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                _ => AuthError::MalformedToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    const SECRET: &[u8] = b"unit-test-secret";

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn at(secs: i64) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.timestamp_opt(secs, 0).unwrap())))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn codec_at(secs: i64) -> (TokenCodec, Arc<ManualClock>) {
        let clock = ManualClock::at(secs);
        let codec = TokenCodec::with_clock(SECRET, clock.clone()).unwrap();
        (codec, clock)
    }

    #[test]
    fn test_verify_returns_minted_identity() {
        let codec = TokenCodec::new(SECRET).unwrap();
        for id in [1_i64, 42, i64::MAX] {
            let token = codec.mint(Identity::new(id), Duration::minutes(15)).unwrap();
            assert_eq!(codec.verify(&token), Ok(Identity::new(id)));
        }
    }

    #[test]
    fn test_expired_exactly_at_deadline() {
        let (codec, clock) = codec_at(1_700_000_000);
        let token = codec.mint(Identity::new(7), Duration::seconds(30)).unwrap();

        clock.advance(Duration::seconds(29));
        assert_eq!(codec.verify(&token), Ok(Identity::new(7)));

        clock.advance(Duration::seconds(1));
        assert_eq!(codec.verify(&token), Err(AuthError::Expired));

        clock.advance(Duration::days(3));
        assert_eq!(codec.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_subsecond_deadline_rounds_up() {
        let clock = Arc::new(ManualClock(Mutex::new(
            Utc.timestamp_opt(1_700_000_000, 400_000_000).unwrap(),
        )));
        let codec = TokenCodec::with_clock(SECRET, clock.clone()).unwrap();
        let token = codec.mint(Identity::new(3), Duration::seconds(1)).unwrap();

        clock.advance(Duration::milliseconds(999));
        assert_eq!(codec.verify(&token), Ok(Identity::new(3)));

        clock.advance(Duration::seconds(1));
        assert_eq!(codec.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_claims_layout() {
        let (codec, _clock) = codec_at(1_700_000_000);
        let token = codec.mint(Identity::new(5), Duration::hours(24)).unwrap();
        let claims = codec.decode_claims(&token).unwrap();
        assert_eq!(
            claims,
            Claims {
                sub: "5".to_string(),
                iat: 1_700_000_000,
                exp: 1_700_000_000 + 24 * 3600,
            }
        );
    }

    #[test]
    fn test_ttl_past_end_of_clock_is_signing_error() {
        let (codec, _clock) = codec_at(1_700_000_000);
        let result = codec.mint(Identity::new(1), Duration::seconds(10_000_000_000_000));
        assert!(matches!(result, Err(AuthError::Signing(_))), "{:?}", result);
    }

    #[test]
    fn test_tampered_bytes_never_verify() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let token = codec.mint(Identity::new(11), Duration::hours(1)).unwrap();

        for (i, original) in token.char_indices() {
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            match codec.verify(&tampered) {
                Err(AuthError::InvalidSignature) | Err(AuthError::MalformedToken) => {}
                other => panic!("byte {} tampered, got {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let minting = TokenCodec::new(b"first-secret").unwrap();
        let verifying = TokenCodec::new(b"rotated-secret").unwrap();
        let token = minting.mint(Identity::new(1), Duration::hours(1)).unwrap();
        assert_eq!(verifying.verify(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let claims = Claims {
            sub: "1".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(codec.verify(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_structural_garbage_is_malformed() {
        let codec = TokenCodec::new(SECRET).unwrap();
        for token in ["", "abc", "a.b", "a.b.c", "not a token at all"] {
            assert_eq!(codec.verify(token), Err(AuthError::MalformedToken), "{:?}", token);
        }
    }

    #[test]
    fn test_non_numeric_subject_is_malformed() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let claims = serde_json::json!({
            "sub": "alice",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 3600,
        });
        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(SECRET))
            .unwrap();
        assert_eq!(codec.verify(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_missing_expiry_is_malformed() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let claims = serde_json::json!({ "sub": "1" });
        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(SECRET))
            .unwrap();
        assert_eq!(codec.verify(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenCodec::new(b""), Err(AuthError::Signing(_))));
    }
}
