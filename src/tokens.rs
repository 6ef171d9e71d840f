//! # Session Tokens
//!
//! Mints and verifies the session credential returned by successful
//! WebAuthn ceremonies: an HS256 JWT whose subject is the verified email.
//! Protected routes accept it as a bearer token.

use crate::error::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The verified email address.
    sub: String,
    iat: i64,
    exp: i64,
}

/// Identity token issuer: `mint(email) -> token` and its inverse.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl_secs,
        }
    }

    /// Mint a session token for a verified email.
    pub fn mint(&self, email: &str) -> AppResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token minting failed: {}", e)))
    }

    /// Verify a token's signature and expiry; returns the subject email.
    pub fn verify(&self, token: &str) -> AppResult<String> {
        let validation = Validation::new(Algorithm::HS256);

        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(data.claims.sub)
    }
}
