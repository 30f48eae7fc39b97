//! Stateless bearer session tokens.
//!
//! Tokens are HS256 JWTs over a process-wide secret. Nothing is stored
//! server side: a token is valid while its signature checks out and its
//! `exp` has not been reached. There is no revocation; changing the secret
//! invalidates every outstanding token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::clock::deadline;
use crate::error::ServiceError;

/// Default lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Token payload
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: AccountId,
    pub iat: i64,
    pub exp: i64,
}

pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl SessionIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked against the caller's clock in `decode_at`
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    pub fn mint(&self, account_id: AccountId) -> Result<String, ServiceError> {
        self.mint_at(account_id, Utc::now())
    }

    pub fn mint_at(&self, account_id: AccountId, now: DateTime<Utc>) -> Result<String, ServiceError> {
        let claims = Claims {
            user_id: account_id,
            iat: now.timestamp(),
            exp: deadline(now, self.ttl_secs)?.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token signing: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<AccountId, ServiceError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, ServiceError> {
        Ok(self.decode_at(token, now)?.user_id)
    }

    /// Verify signature, algorithm and expiry, returning the full claims.
    /// A token is expired once `now` reaches `exp`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, ServiceError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| ServiceError::InvalidToken)?
            .claims;
        if now.timestamp() >= claims.exp {
            return Err(ServiceError::InvalidToken);
        }
        Ok(claims)
    }
}
