//! One-time passcodes attached to accounts

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;

use super::types::{Account, PendingOtp};
use crate::clock::deadline;
use crate::error::ServiceError;

pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// Default validity window: 10 minutes
pub const DEFAULT_OTP_TTL_SECS: u64 = 10 * 60;

/// Issues and checks 6-digit codes. Holds no state of its own; the pending
/// code lives on the [`Account`].
#[derive(Clone, Debug)]
pub struct OtpIssuer {
    ttl_secs: u64,
}

impl OtpIssuer {
    pub fn new(ttl_secs: u64) -> Self {
        Self { ttl_secs }
    }

    /// Generate a fresh code, replacing whatever was pending
    pub fn issue(&self, account: &mut Account) -> Result<u32, ServiceError> {
        self.issue_at(account, Utc::now())
    }

    pub fn issue_at(&self, account: &mut Account, now: DateTime<Utc>) -> Result<u32, ServiceError> {
        let expires_at = deadline(now, self.ttl_secs)?;
        let code = OsRng.gen_range(OTP_MIN..=OTP_MAX);
        account.pending_otp = Some(PendingOtp { code, expires_at });
        Ok(code)
    }

    pub fn validate(&self, account: &mut Account, supplied: u32) -> Result<(), ServiceError> {
        self.validate_at(account, supplied, Utc::now())
    }

    /// Succeeds only for the latest code while `now` is strictly before its expiry.
    /// A success consumes the code and marks the account verified.
    pub fn validate_at(
        &self,
        account: &mut Account,
        supplied: u32,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let pending = account.pending_otp.as_ref().ok_or(ServiceError::InvalidOtp)?;

        if pending.code != supplied || now >= pending.expires_at {
            return Err(ServiceError::InvalidOtp);
        }

        account.pending_otp = None;
        account.verified = true;
        Ok(())
    }
}

impl Default for OtpIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account() -> Account {
        Account {
            id: 1,
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            phone: Some("+1".to_string()),
            password_hash: "$argon2id$stub".to_string(),
            verified: false,
            pending_otp: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_sets_pending_code() {
        let issuer = OtpIssuer::default();
        let mut acct = account();
        let now = Utc::now();

        let code = issuer.issue_at(&mut acct, now).unwrap();

        assert!((OTP_MIN..=OTP_MAX).contains(&code));
        let pending = acct.pending_otp.clone().unwrap();
        assert_eq!(pending.code, code);
        assert_eq!(pending.expires_at, now + Duration::minutes(10));
        assert!(!acct.verified);
    }

    #[test]
    fn test_validate_success_clears_and_verifies() {
        let issuer = OtpIssuer::default();
        let mut acct = account();
        let now = Utc::now();
        let code = issuer.issue_at(&mut acct, now).unwrap();

        issuer.validate_at(&mut acct, code, now + Duration::minutes(9)).unwrap();

        assert!(acct.verified);
        assert!(acct.pending_otp.is_none());
        // Consumed: the same code cannot be used twice
        assert_eq!(
            issuer.validate_at(&mut acct, code, now),
            Err(ServiceError::InvalidOtp)
        );
        assert!(acct.verified);
    }

    #[test]
    fn test_wrong_code_keeps_pending() {
        let issuer = OtpIssuer::default();
        let mut acct = account();
        let now = Utc::now();
        let code = issuer.issue_at(&mut acct, now).unwrap();
        let wrong = if code == OTP_MAX { OTP_MIN } else { code + 1 };

        assert_eq!(
            issuer.validate_at(&mut acct, wrong, now),
            Err(ServiceError::InvalidOtp)
        );
        assert!(acct.has_pending_otp());
        assert!(!acct.verified);
        assert!(issuer.validate_at(&mut acct, code, now).is_ok());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let issuer = OtpIssuer::default();
        let now = Utc::now();

        let mut acct = account();
        let code = issuer.issue_at(&mut acct, now).unwrap();
        let expiry = now + Duration::minutes(10);

        assert_eq!(
            issuer.validate_at(&mut acct, code, expiry),
            Err(ServiceError::InvalidOtp)
        );
        assert_eq!(
            issuer.validate_at(&mut acct, code, expiry + Duration::seconds(1)),
            Err(ServiceError::InvalidOtp)
        );
        assert!(issuer
            .validate_at(&mut acct, code, expiry - Duration::milliseconds(1))
            .is_ok());
    }

    #[test]
    fn test_reissue_invalidates_previous_code() {
        let issuer = OtpIssuer::default();
        let mut acct = account();
        let now = Utc::now();

        let mut first = issuer.issue_at(&mut acct, now).unwrap();
        let mut second = issuer.issue_at(&mut acct, now).unwrap();
        // Codes may collide by chance; reissue until they differ
        while second == first {
            first = second;
            second = issuer.issue_at(&mut acct, now).unwrap();
        }

        assert_eq!(
            issuer.validate_at(&mut acct, first, now),
            Err(ServiceError::InvalidOtp)
        );
        assert!(issuer.validate_at(&mut acct, second, now).is_ok());
    }

    #[test]
    fn test_oversized_ttl_fails_without_touching_account() {
        let issuer = OtpIssuer::new(u64::MAX / 2);
        let mut acct = account();

        assert!(matches!(
            issuer.issue_at(&mut acct, Utc::now()),
            Err(ServiceError::Internal(_))
        ));
        assert!(!acct.has_pending_otp());
    }

    #[test]
    fn test_no_pending_code() {
        let issuer = OtpIssuer::default();
        let mut acct = account();
        assert_eq!(
            issuer.validate_at(&mut acct, 123_456, Utc::now()),
            Err(ServiceError::InvalidOtp)
        );
    }

    #[test]
    fn test_verified_never_reverts() {
        let issuer = OtpIssuer::default();
        let mut acct = account();
        acct.verified = true;
        let now = Utc::now();

        issuer.issue_at(&mut acct, now).unwrap();
        assert!(acct.verified);
        let _ = issuer.validate_at(&mut acct, 0, now);
        assert!(acct.verified);
    }
}
