//! Short-lived access token signing

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::UserId;

/// Access token lifetime
const ACCESS_TOKEN_TTL_HOURS: i64 = 1;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Signs identity payloads into opaque access tokens.
///
/// The identity service only needs `sign`; verification belongs to the
/// request-authenticating middleware in front of the poll endpoints.
pub trait AccessTokenSigner: Send + Sync {
    fn sign(&self, user_id: UserId, email: &str) -> Result<String, ApiError>;
}

/// HS256 JWT signer
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Decode and validate a token produced by this signer
    pub fn decode(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidCredentials)
    }
}

impl AccessTokenSigner for JwtSigner {
    fn sign(&self, user_id: UserId, email: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.0.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ACCESS_TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_decode() {
        let signer = JwtSigner::new("test-secret");

        let token = signer.sign(UserId(42), "test@example.com").unwrap();
        let claims = signer.decode(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "test@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_decode_rejects_foreign_secret() {
        let signer = JwtSigner::new("test-secret");
        let other = JwtSigner::new("other-secret");

        let token = signer.sign(UserId(1), "test@example.com").unwrap();
        assert!(other.decode(&token).is_err());
    }
}
