//! Account system
//!
//! - Registration with one-way (Argon2id) password hashes
//! - Email/password authentication
//! - One-time passcode verification of the contact channel

pub mod auth;
pub mod otp;
pub mod store;
pub mod types;

pub use auth::{Argon2Hasher, CredentialHasher, HashError};
pub use otp::OtpIssuer;
pub use store::{CredentialStore, NewAccount};
pub use types::{Account, AccountId, IdentifierKind, PendingOtp, PublicAccount};
