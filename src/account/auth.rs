//! One-way password hashing for accounts

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
    #[error("stored password hash is malformed")]
    MalformedHash,
}

/// Hashing capability used by the credential store.
///
/// Verification is always by re-hash-and-compare; implementations never
/// hand back anything that can be turned into the original password.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// `Ok(false)` means the password is wrong, `Err` means the stored hash is unusable.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher with configurable cost
#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::HashingFailed(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(password_hash).map_err(|_| HashError::MalformedHash)?;
        // Parameters come from the PHC string, so old hashes survive a cost change
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::HashingFailed(e.to_string())),
        }
    }
}
