//! Stateless signing and verification of admin bearer tokens.
//!
//! The token is self-verifying but not sufficient for authorization on its
//! own: the session store is the revocation layer on top of it.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Admin;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id
    pub sub: i32,
    pub username: String,
    pub name: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token secret not configured")]
    MissingSecret,

    #[error("failed to sign token")]
    Signing,

    /// All verification failures collapse here; callers must not learn
    /// whether the signature, payload, or expiry was at fault.
    #[error("invalid token")]
    Invalid,
}

pub struct TokenCodec {
    secret: String,
    ttl: Duration,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, admin: &Admin) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let now = Utc::now();
        let claims = Claims {
            sub: admin.id,
            username: admin.username.clone(),
            name: admin.name.clone(),
            role: admin.role.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| TokenError::Signing)
    }

    /// Pure function of the token and the secret; does not consult the
    /// session store.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| TokenError::Invalid)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_admin() -> Admin {
        Admin {
            id: 42,
            username: "bu_lurah".to_string(),
            name: "Bu Lurah".to_string(),
            role: "village_admin".to_string(),
            village_id: Some(7),
            is_active: true,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn issue_then_verify_roundtrips_identity() {
        let codec = TokenCodec::new("unit-test-secret", 24);
        let token = codec.issue(&test_admin()).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "bu_lurah");
        assert_eq!(claims.name, "Bu Lurah");
        assert_eq!(claims.role, "village_admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let codec = TokenCodec::new("secret-a", 24);
        let token = codec.issue(&test_admin()).unwrap();

        let other = TokenCodec::new("secret-b", 24);
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let codec = TokenCodec::new("unit-test-secret", 24);
        let mut token = codec.issue(&test_admin()).unwrap();
        token.push('x');

        assert!(matches!(codec.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let codec = TokenCodec::new("unit-test-secret", 24);
        assert!(matches!(
            codec.verify("not.a.token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn empty_secret_fails_closed() {
        let codec = TokenCodec::new("", 24);
        assert!(matches!(
            codec.issue(&test_admin()),
            Err(TokenError::MissingSecret)
        ));
        assert!(matches!(
            codec.verify("anything"),
            Err(TokenError::MissingSecret)
        ));
    }
}
