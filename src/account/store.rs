//! Account storage and management

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use super::auth::CredentialHasher;
use super::types::{Account, AccountId, IdentifierKind};
use crate::error::ServiceError;

/// Credential store holding every registered account.
///
/// Accounts live in memory for the lifetime of the process. Password hashing
/// is split from insertion ([`hash_new_password`] then [`insert`]) so callers
/// can run the expensive hash without holding the store lock.
///
/// [`hash_new_password`]: CredentialStore::hash_new_password
/// [`insert`]: CredentialStore::insert
pub struct CredentialStore {
    accounts: BTreeMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
    next_id: AccountId,
}

/// Everything needed to create an account once its password is hashed
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

impl CredentialStore {
    /// Create a new empty account store
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            by_email: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn hash_new_password(
        hasher: &dyn CredentialHasher,
        password: &str,
    ) -> Result<String, ServiceError> {
        Ok(hasher.hash(password)?)
    }

    /// Store a pre-hashed account. The duplicate check and the insert happen
    /// under the same borrow, so two registrations for one email cannot both win.
    pub fn insert(&mut self, new: NewAccount, now: DateTime<Utc>) -> Result<Account, ServiceError> {
        if self.by_email.contains_key(&new.email) {
            return Err(ServiceError::DuplicateIdentity);
        }

        let id = self.next_id;
        self.next_id = id + 1;

        let account = Account {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            verified: false,
            pending_otp: None,
            created_at: now,
        };

        self.by_email.insert(account.email.clone(), id);
        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    /// Hash and insert in one step
    pub fn register(
        &mut self,
        hasher: &dyn CredentialHasher,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<Account, ServiceError> {
        // Fail fast before paying for the hash
        if self.by_email.contains_key(email) {
            return Err(ServiceError::DuplicateIdentity);
        }
        let password_hash = Self::hash_new_password(hasher, password)?;
        self.insert(
            NewAccount {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.map(str::to_string),
                password_hash,
            },
            Utc::now(),
        )
    }

    /// Check an email/password pair. Unknown email and wrong password are
    /// reported identically.
    pub fn authenticate(
        &self,
        hasher: &dyn CredentialHasher,
        email: &str,
        password: &str,
    ) -> Result<Account, ServiceError> {
        let account = self.get_by_email(email).ok_or(ServiceError::InvalidCredentials)?;
        check_password(hasher, account, password)?;
        Ok(account.clone())
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn get_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(&id)
    }

    /// Exact, case-sensitive email match
    pub fn get_by_email(&self, email: &str) -> Option<&Account> {
        self.by_email.get(email).and_then(|id| self.accounts.get(id))
    }

    /// Phones are not unique; the earliest registration wins.
    pub fn get_by_phone(&self, phone: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.phone.as_deref() == Some(phone))
    }

    /// Resolve an OTP identifier, treating it as an email when it contains '@'.
    pub fn resolve_identifier(&self, identifier: &str) -> Option<&Account> {
        match IdentifierKind::classify(identifier) {
            IdentifierKind::Email => self.get_by_email(identifier),
            IdentifierKind::Phone => self.get_by_phone(identifier),
        }
    }

    pub fn resolve_identifier_mut(&mut self, identifier: &str) -> Option<&mut Account> {
        let id = self.resolve_identifier(identifier)?.id;
        self.accounts.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-hash-and-compare against a stored account
pub fn check_password(
    hasher: &dyn CredentialHasher,
    account: &Account,
    password: &str,
) -> Result<(), ServiceError> {
    if hasher.verify(password, &account.password_hash)? {
        Ok(())
    } else {
        Err(ServiceError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::auth::Argon2Hasher;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut store = CredentialStore::new();
        let h = hasher();

        let ann = store.register(&h, "Ann", "a@x.com", "pw123", Some("+1")).unwrap();
        let bob = store.register(&h, "Bob", "b@x.com", "pw456", None).unwrap();

        assert_eq!(ann.id, 1);
        assert_eq!(bob.id, 2);
        assert!(!ann.verified);
        assert_ne!(ann.password_hash, "pw123");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut store = CredentialStore::new();
        let h = hasher();

        let original = store.register(&h, "Ann", "a@x.com", "pw123", Some("+1")).unwrap();
        let err = store.register(&h, "Imposter", "a@x.com", "other", None).unwrap_err();

        assert_eq!(err, ServiceError::DuplicateIdentity);
        let kept = store.get(original.id).unwrap();
        assert_eq!(kept.name, "Ann");
        assert_eq!(kept.password_hash, original.password_hash);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_rejects_second_prehashed_account() {
        let mut store = CredentialStore::new();
        let now = Utc::now();
        let new = |name: &str, hash: &str| NewAccount {
            name: name.to_string(),
            email: "a@x.com".to_string(),
            phone: None,
            password_hash: hash.to_string(),
        };

        // Both hashed before either insert, as two concurrent registrations would be
        let first = store.insert(new("Ann", "$argon2id$first"), now).unwrap();
        let err = store.insert(new("Imposter", "$argon2id$second"), now).unwrap_err();

        assert_eq!(err, ServiceError::DuplicateIdentity);
        assert_eq!(store.len(), 1);
        let kept = store.get_by_email("a@x.com").unwrap();
        assert_eq!(kept.id, first.id);
        assert_eq!(kept.password_hash, "$argon2id$first");

        // A rejected insert does not consume an id
        let next = store
            .insert(
                NewAccount {
                    email: "b@x.com".to_string(),
                    ..new("Bob", "$argon2id$third")
                },
                now,
            )
            .unwrap();
        assert_eq!(next.id, first.id + 1);
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let mut store = CredentialStore::new();
        let h = hasher();
        store.register(&h, "Ann", "a@x.com", "pw123", None).unwrap();

        assert!(store.register(&h, "Ann2", "A@x.com", "pw123", None).is_ok());
        assert!(store.get_by_email("A@X.COM").is_none());
    }

    #[test]
    fn test_authenticate() {
        let mut store = CredentialStore::new();
        let h = hasher();
        store.register(&h, "Ann", "a@x.com", "pw123", None).unwrap();

        let account = store.authenticate(&h, "a@x.com", "pw123").unwrap();
        assert_eq!(account.id, 1);

        let wrong_pw = store.authenticate(&h, "a@x.com", "nope").unwrap_err();
        let no_user = store.authenticate(&h, "z@x.com", "pw123").unwrap_err();
        assert_eq!(wrong_pw, ServiceError::InvalidCredentials);
        assert_eq!(wrong_pw, no_user);
    }

    #[test]
    fn test_resolve_identifier() {
        let mut store = CredentialStore::new();
        let h = hasher();
        store.register(&h, "Ann", "a@x.com", "pw123", Some("+1555")).unwrap();
        store.register(&h, "Bob", "b@x.com", "pw123", Some("+1555")).unwrap();

        assert_eq!(store.resolve_identifier("a@x.com").unwrap().id, 1);
        assert_eq!(store.resolve_identifier("b@x.com").unwrap().id, 2);
        // Shared phone resolves to the first account
        assert_eq!(store.resolve_identifier("+1555").unwrap().id, 1);
        assert!(store.resolve_identifier("+1999").is_none());
        // An email is never matched against the phone field
        assert!(store.resolve_identifier("+1555@").is_none());
    }
}
