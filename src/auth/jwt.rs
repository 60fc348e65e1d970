use std::{sync::Arc, time::Duration};

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::Duration as TimeDuration;
use tracing::debug;

use super::claims::{Claims, Identity, Subject};
use super::clock::Clock;
use crate::config::JwtConfig;

/// The only algorithm tokens are signed and accepted with.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a token was refused. Callers collapse all of these into a single
/// "unauthenticated" answer; the distinction is kept for logs.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token is signed with an unaccepted algorithm")]
    Algorithm,
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

fn classify(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => TokenError::Algorithm,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtKeys {
    /// Fails on an empty secret or a zero lifetime.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        anyhow::ensure!(!secret.is_empty(), "jwt secret must not be empty");
        anyhow::ensure!(!ttl.is_zero(), "jwt lifetime must be positive");

        let mut validation = Validation::new(ALGORITHM);
        // expiry is checked against the injected clock in `verify`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        })
    }

    pub fn from_config(cfg: &JwtConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Self::new(
            cfg.secret.as_bytes(),
            Duration::from_secs(cfg.ttl_seconds),
            clock,
        )
    }

    /// Default lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &Subject, ttl: Duration) -> Result<String, TokenError> {
        let now = self.clock.now();
        let ttl = TimeDuration::try_from(ttl).unwrap_or(TimeDuration::MAX);
        let exp = now.unix_timestamp().saturating_add(ttl.whole_seconds());
        let claims = Claims {
            name: subject.name.clone(),
            id: subject.id,
            iat: now.unix_timestamp(),
            exp,
        };
        let token =
            encode(&Header::new(ALGORITHM), &claims, &self.encoding).map_err(TokenError::Encode)?;
        debug!(user_id = subject.id, exp, "jwt signed");
        Ok(token)
    }

    pub fn issue_default(&self, subject: &Subject) -> Result<String, TokenError> {
        self.issue(subject, self.ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(classify)?;
        if self.clock.now().unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        let identity = Identity::try_from(data.claims)?;
        debug!(user_id = identity.id, "jwt verified");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;
    use time::macros::datetime;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-1234";

    fn subject() -> Subject {
        Subject {
            id: 42,
            name: "Ada".into(),
        }
    }

    fn keys_with_clock() -> (JwtKeys, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(datetime!(2024-03-01 12:00 UTC)));
        let keys = JwtKeys::new(SECRET, Duration::from_secs(3600), clock.clone()).expect("keys");
        (keys, clock)
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let (keys, _clock) = keys_with_clock();
        let token = keys.issue_default(&subject()).expect("sign");
        let identity = keys.verify(&token).expect("verify");
        assert_eq!(identity.id, 42);
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.issued_at, datetime!(2024-03-01 12:00 UTC));
        assert_eq!(identity.expires_at, datetime!(2024-03-01 13:00 UTC));
    }

    #[test]
    fn issuing_is_deterministic_for_fixed_key_and_clock() {
        let (keys, _clock) = keys_with_clock();
        let a = keys.issue_default(&subject()).expect("sign");
        let b = keys.issue_default(&subject()).expect("sign");
        assert_eq!(a, b);
    }

    #[test]
    fn token_is_valid_until_expiry_and_not_at_it() {
        let (keys, clock) = keys_with_clock();
        let token = keys
            .issue(&subject(), Duration::from_secs(60))
            .expect("sign");

        clock.advance(TimeDuration::seconds(59));
        assert!(keys.verify(&token).is_ok());

        clock.advance(TimeDuration::seconds(1));
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));

        clock.advance(TimeDuration::days(3));
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn claims_carry_name_id_iat_exp() {
        let (keys, _clock) = keys_with_clock();
        let token = keys.issue_default(&subject()).expect("sign");
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        let data = decode::<serde_json::Value>(&token, &DecodingKey::from_secret(SECRET), &validation)
            .expect("decode");
        let payload = data.claims;
        assert_eq!(payload["name"], "Ada");
        assert_eq!(payload["id"], 42);
        assert_eq!(
            payload["exp"].as_i64().unwrap() - payload["iat"].as_i64().unwrap(),
            3600
        );
    }

    #[test]
    fn rejects_token_signed_with_other_key() {
        let (keys, clock) = keys_with_clock();
        let other = JwtKeys::new(b"some-other-secret-entirely-000000", Duration::from_secs(3600), clock)
            .expect("keys");
        let token = other.issue_default(&subject()).expect("sign");
        assert!(matches!(keys.verify(&token), Err(TokenError::BadSignature)));
    }

    #[test]
    fn rejects_token_with_other_algorithm_even_with_same_secret() {
        let (keys, _clock) = keys_with_clock();
        let claims = Claims {
            name: "Ada".into(),
            id: 42,
            iat: datetime!(2024-03-01 12:00 UTC).unix_timestamp(),
            exp: datetime!(2024-03-01 13:00 UTC).unix_timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("sign hs512");
        assert!(matches!(keys.verify(&token), Err(TokenError::Algorithm)));
    }

    #[test]
    fn rejects_garbage() {
        let (keys, _clock) = keys_with_clock();
        assert!(matches!(keys.verify("not-a-token"), Err(TokenError::Malformed)));
        assert!(keys.verify("").is_err());
        assert!(keys.verify("a.b.c").is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let clock = Arc::new(FixedClock::new(datetime!(2024-03-01 12:00 UTC)));
        assert!(JwtKeys::new(b"", Duration::from_secs(3600), clock.clone()).is_err());
        assert!(JwtKeys::new(SECRET, Duration::ZERO, clock).is_err());
    }

    #[test]
    fn token_signed_with_empty_key_never_verifies() {
        let (keys, _clock) = keys_with_clock();
        let claims = Claims {
            name: "Mallory".into(),
            id: 1,
            iat: datetime!(2024-03-01 12:00 UTC).unix_timestamp(),
            exp: datetime!(2024-03-02 12:00 UTC).unix_timestamp(),
        };
        let forged = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(b""))
            .expect("sign");
        assert!(matches!(keys.verify(&forged), Err(TokenError::BadSignature)));
    }
}
