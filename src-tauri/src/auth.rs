//! Local credential store.
//!
//! Users and the signed-in user live in the key-value store under `users`
//! and `currentUser`. Passwords are kept only as salted SHA-256 digests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::storage::{self, KeyValueStore, Loaded, CURRENT_USER_KEY, USERS_KEY};

const STORE_UNAVAILABLE: &str = "Unable to reach credential store";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    id: Uuid,
    email: String,
    name: String,
    password_digest: String,
}

impl StoredUser {
    fn user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }

    fn matches_password(&self, password: &str) -> bool {
        self.password_digest == password_digest(self.id, password)
    }
}

fn password_digest(id: Uuid, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Storage failures on the auth path are reported with a generic message.
fn store_error(err: AppError) -> AppError {
    tracing::warn!(error = %err, "credential store failure");
    AppError::Auth(STORE_UNAVAILABLE.to_string())
}

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // An unreadable users record is never overwritten.
    fn users(&self) -> AppResult<Vec<StoredUser>> {
        match storage::load(self.store.as_ref(), USERS_KEY).map_err(store_error)? {
            Loaded::Value(users) => Ok(users),
            Loaded::Missing => Ok(Vec::new()),
            Loaded::Corrupt(reason) => Err(store_error(AppError::Storage(reason))),
        }
    }

    fn set_current(&self, user: &User) -> AppResult<()> {
        storage::save(self.store.as_ref(), CURRENT_USER_KEY, user).map_err(store_error)
    }

    pub fn sign_up(&self, email: &str, password: &str, name: &str) -> AppResult<User> {
        let email = normalize_email(email);
        let name = name.trim();
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(AppError::validation("Name, email and password are required"));
        }
        if !email.contains('@') {
            return Err(AppError::validation("Please enter a valid email address"));
        }

        let mut users = self.users()?;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::Auth("User already exists".to_string()));
        }

        let id = Uuid::new_v4();
        let stored = StoredUser {
            id,
            email,
            name: name.to_string(),
            password_digest: password_digest(id, password),
        };
        let user = stored.user();
        users.push(stored);
        storage::save(self.store.as_ref(), USERS_KEY, &users).map_err(store_error)?;
        self.set_current(&user)?;

        tracing::info!(user_id = %user.id, "account created");
        Ok(user)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let user = self
            .users()?
            .into_iter()
            .find(|u| u.email == email && u.matches_password(password))
            .map(|u| u.user())
            .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;
        self.set_current(&user)?;

        tracing::info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    pub fn sign_out(&self) -> AppResult<()> {
        self.store.remove(CURRENT_USER_KEY).map_err(store_error)
    }

    pub fn current_user(&self) -> Option<User> {
        match storage::load::<User>(self.store.as_ref(), CURRENT_USER_KEY) {
            Ok(Loaded::Value(user)) => Some(user),
            Ok(Loaded::Missing) => None,
            Ok(Loaded::Corrupt(reason)) => {
                tracing::warn!(%reason, "ignoring unreadable current user");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read current user");
                None
            }
        }
    }

    #[cfg(test)]
    fn user_count(&self) -> usize {
        self.users().map(|users| users.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> AppResult<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::Storage("disk unavailable".into()));
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> AppResult<()> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> AppResult<()> {
            self.inner.remove(key)
        }
    }

    fn credentials() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn sign_up_sets_current_user() {
        let creds = credentials();
        let user = creds.sign_up("Ada@Example.com ", "secret", "Ada").unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(creds.current_user(), Some(user));
    }

    #[test]
    fn duplicate_sign_up_is_rejected_without_side_effects() {
        let creds = credentials();
        let first = creds.sign_up("ada@example.com", "secret", "Ada").unwrap();
        creds.sign_out().unwrap();
        let other = creds.sign_up("bob@example.com", "pw", "Bob").unwrap();

        let err = creds.sign_up("ADA@example.com", "another", "Imposter").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(creds.user_count(), 2);
        assert_eq!(creds.current_user(), Some(other));
        assert_ne!(creds.current_user().map(|u| u.id), Some(first.id));
    }

    #[test]
    fn sign_in_checks_password() {
        let creds = credentials();
        creds.sign_up("ada@example.com", "secret", "Ada").unwrap();
        creds.sign_out().unwrap();
        assert_eq!(creds.current_user(), None);

        let err = creds.sign_in("ada@example.com", "wrong").unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(creds.current_user(), None);

        let user = creds.sign_in("ada@example.com", "secret").unwrap();
        assert_eq!(creds.current_user(), Some(user));
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let creds = credentials();
        let err = creds.sign_up("", "secret", "Ada").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = creds.sign_up("not-an-email", "secret", "Ada").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = creds.sign_in("ada@example.com", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn passwords_are_not_stored_in_plain_text() {
        let store = Arc::new(MemoryStore::new());
        let creds = CredentialStore::new(store.clone());
        creds.sign_up("ada@example.com", "hunter2", "Ada").unwrap();

        let raw = store.get(USERS_KEY).unwrap().unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("passwordDigest"));
    }

    #[test]
    fn unreadable_store_is_reported_generically() {
        let store = Arc::new(FlakyStore::default());
        let creds = CredentialStore::new(store.clone());
        creds.sign_up("ada@example.com", "secret", "Ada").unwrap();
        creds.sign_up("bob@example.com", "pw", "Bob").unwrap();
        let users_before = store.inner.get(USERS_KEY).unwrap();

        store.fail_reads.store(true, Ordering::SeqCst);
        let err = creds.sign_in("ada@example.com", "secret").unwrap_err();
        assert_eq!(err.to_string(), STORE_UNAVAILABLE);
        let err = creds.sign_up("ada@example.com", "other", "Ada").unwrap_err();
        assert_eq!(err.to_string(), STORE_UNAVAILABLE);
        let err = creds.sign_up("carol@example.com", "pw", "Carol").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);

        store.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(store.inner.get(USERS_KEY).unwrap(), users_before);
        assert_eq!(creds.user_count(), 2);
        assert!(creds.sign_in("bob@example.com", "pw").is_ok());
    }

    #[test]
    fn corrupt_users_record_is_not_overwritten() {
        let store = Arc::new(MemoryStore::new());
        store.set(USERS_KEY, "[{\"id\": ").unwrap();
        let creds = CredentialStore::new(store.clone());

        let err = creds.sign_up("ada@example.com", "secret", "Ada").unwrap_err();
        assert_eq!(err.to_string(), STORE_UNAVAILABLE);
        assert_eq!(store.get(USERS_KEY).unwrap().as_deref(), Some("[{\"id\": "));
        assert_eq!(creds.current_user(), None);
    }

    #[test]
    fn corrupt_current_user_reads_as_signed_out() {
        let store = Arc::new(MemoryStore::new());
        store.set(CURRENT_USER_KEY, "{\"id\": 3").unwrap();
        assert_eq!(CredentialStore::new(store).current_user(), None);
    }
}
