//! Account type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account identifier - assigned sequentially from 1
pub type AccountId = u64;

/// Main account structure
#[derive(Clone, Debug)]
pub struct Account {
    // Identity
    pub id: AccountId,
    pub name: String,

    // Contact channels
    pub email: String,
    pub phone: Option<String>,

    // Authentication
    pub password_hash: String, // PHC string (Argon2id)
    pub verified: bool,

    // At most one outstanding code; reissue overwrites
    pub pending_otp: Option<PendingOtp>,

    pub created_at: DateTime<Utc>,
}

/// A one-time passcode waiting to be confirmed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingOtp {
    pub code: u32,
    pub expires_at: DateTime<Utc>,
}

/// Fields of an account that are safe to put on the wire
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicAccount {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// How an OTP identifier resolves to an account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierKind {
    Email,
    Phone,
}

impl IdentifierKind {
    /// Anything containing an '@' is an email, everything else is a phone number.
    pub fn classify(identifier: &str) -> Self {
        if identifier.contains('@') {
            Self::Email
        } else {
            Self::Phone
        }
    }
}

impl Account {
    pub fn public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn has_pending_otp(&self) -> bool {
        self.pending_otp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_classification() {
        assert_eq!(IdentifierKind::classify("a@x.com"), IdentifierKind::Email);
        assert_eq!(IdentifierKind::classify("+15550100"), IdentifierKind::Phone);
        // Naive rule: a lone '@' is still treated as an email
        assert_eq!(IdentifierKind::classify("@"), IdentifierKind::Email);
    }
}
