//! Password hashing and bearer tokens.
//!
//! Passwords are derived with PBKDF2-HMAC-SHA256 and a random per-user salt.
//! The stored form carries its own parameters:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt>$<hash>
//! ```
//!
//! Bearer tokens are HS256 JWTs whose `sub` claim is the user email.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{TimeDelta, Utc};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{EngineError, ResultEngine};

pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const OUTPUT_LEN: usize = 32;

/// Hash `plain` with a fresh random salt.
pub fn hash_password(plain: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt: [u8; SALT_LEN] = rand::random();
    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(plain.as_bytes(), &salt, iterations, &mut out);

    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(out)
    )
}

/// Check `plain` against a hash produced by [`hash_password`].
///
/// Malformed hashes never verify.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };
    if expected.len() != OUTPUT_LEN {
        return false;
    }

    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(plain.as_bytes(), &salt, iterations, &mut out);
    out.as_slice().ct_eq(expected.as_slice()).into()
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by an access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the authenticated user.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl: TimeDelta,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: TimeDelta) -> ResultEngine<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(EngineError::InvalidInput(
                "token secret must not be empty".to_string(),
            ));
        }
        Ok(Self { secret, ttl })
    }

    fn mac(&self) -> ResultEngine<Hmac<Sha256>> {
        Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|err| EngineError::InvalidInput(format!("invalid token secret: {err}")))
    }

    /// Issue a token for `subject`, valid for the configured TTL.
    pub fn issue(&self, subject: &str) -> ResultEngine<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let header_json = serde_json::to_vec(&header)
            .map_err(|err| EngineError::InvalidToken(format!("header: {err}")))?;
        let claims_json = serde_json::to_vec(&claims)
            .map_err(|err| EngineError::InvalidToken(format!("claims: {err}")))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Verify signature and expiry of `token` and return its claims.
    pub fn verify(&self, token: &str) -> ResultEngine<Claims> {
        let invalid = |reason: &str| EngineError::InvalidToken(reason.to_string());

        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("malformed token"));
        };

        let header_raw = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| invalid("malformed header"))?;
        let header: Header =
            serde_json::from_slice(&header_raw).map_err(|_| invalid("malformed header"))?;
        if header.alg != "HS256" {
            return Err(invalid("unsupported algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| invalid("malformed signature"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("bad signature"))?;

        let claims_raw = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| invalid("malformed claims"))?;
        let claims: Claims =
            serde_json::from_slice(&claims_raw).map_err(|_| invalid("malformed claims"))?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(invalid("token expired"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", TimeDelta::minutes(DEFAULT_TOKEN_TTL_MINUTES)).unwrap()
    }

    #[test]
    fn password_verifies() {
        let hash = hash_password("hunter2", 1_000);
        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("pw", 10), hash_password("pw", 10));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "pw"));
        assert!(!verify_password("pw", "bcrypt$10$abc$def"));
        assert!(!verify_password("pw", "pbkdf2-sha256$0$abc$def"));
        assert!(!verify_password("pw", "pbkdf2-sha256$10$!!$def"));
    }

    #[test]
    fn token_round_trips_subject() {
        let issuer = issuer();
        let token = issuer.issue("ann@x.com").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "ann@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = issuer().issue("ann@x.com").unwrap();
        let other = TokenIssuer::new("other", TimeDelta::minutes(5)).unwrap();
        assert_eq!(
            other.verify(&token),
            Err(EngineError::InvalidToken("bad signature".to_string()))
        );
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let issuer = issuer();
        let token = issuer.issue("ann@x.com").unwrap();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"sub":"bob@x.com","iat":0,"exp":99999999999}"#);
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;
        assert!(issuer.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", TimeDelta::minutes(-1)).unwrap();
        let token = issuer.issue("ann@x.com").unwrap();
        assert_eq!(
            issuer.verify(&token),
            Err(EngineError::InvalidToken("token expired".to_string()))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(issuer().verify("not-a-token").is_err());
        assert!(issuer().verify("a.b.c.d").is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(TokenIssuer::new(Vec::new(), TimeDelta::minutes(1)).is_err());
    }
}
