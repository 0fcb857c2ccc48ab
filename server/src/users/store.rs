//! User persistence.
//!
//! The document database that backs users in production sits behind the
//! [`UserStore`] trait. [`InMemoryUserStore`] is the implementation used by the
//! binary and the tests.
//!
//! # Invariants
//! - No two stored users share a username or an email.
//! - Stored users are replaced as a whole on update.
//! - Credentials are persisted in their hex encoding, never as live values.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{User, UserId};
use crate::auth::Credential;

/// Errors returned by a user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    /// Another user already holds the value of this field.
    Taken(&'static str),
    /// No user with the given ID exists.
    NotFound,
    /// The store lock was poisoned by a panicking writer.
    LockPoisoned,
    /// A stored record could not be decoded.
    Corrupt(String),
}

impl std::fmt::Display for UserStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Taken(field) => write!(f, "{field} is already taken"),
            Self::NotFound => write!(f, "user not found"),
            Self::LockPoisoned => write!(f, "user store lock poisoned"),
            Self::Corrupt(reason) => write!(f, "corrupt user record: {reason}"),
        }
    }
}

impl std::error::Error for UserStoreError {}

/// Storage for user accounts.
pub trait UserStore: Send + Sync {
    /// Store a new user.
    ///
    /// # Errors
    /// Returns `UserStoreError::Taken` if the username or email is in use.
    fn insert(&self, user: User) -> Result<(), UserStoreError>;

    /// Replace an existing user.
    ///
    /// # Errors
    /// Returns `UserStoreError::NotFound` if no user has `user.id`, or
    /// `UserStoreError::Taken` if another user holds the new username or email.
    fn update(&self, user: User) -> Result<(), UserStoreError>;

    /// Look up a user by ID.
    fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError>;

    /// Look up a user by (lowercase) email.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;
}

/// A user in its persisted shape.
#[derive(Debug, Clone)]
struct UserRecord {
    id: UserId,
    username: String,
    email: String,
    bio: Option<String>,
    image: Option<String>,
    salt: String,
    hash: String,
}

impl UserRecord {
    fn from_user(user: User) -> Self {
        let (salt, hash) = user.credential.to_hex();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            image: user.image,
            salt,
            hash,
        }
    }

    fn to_user(&self) -> Result<User, UserStoreError> {
        let credential = Credential::from_hex(&self.salt, &self.hash)
            .map_err(|e| UserStoreError::Corrupt(format!("user {}: {e}", self.id)))?;
        Ok(User {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
            credential,
        })
    }
}

/// A `UserStore` kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if a user other than `user.id` holds its username or email.
    fn check_unique(
        users: &HashMap<UserId, UserRecord>,
        user: &User,
    ) -> Result<(), UserStoreError> {
        for other in users.values().filter(|other| other.id != user.id) {
            if other.username == user.username {
                return Err(UserStoreError::Taken("username"));
            }
            if other.email == user.email {
                return Err(UserStoreError::Taken("email"));
            }
        }
        Ok(())
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| UserStoreError::LockPoisoned)?;
        Self::check_unique(&users, &user)?;
        users.insert(user.id, UserRecord::from_user(user));
        Ok(())
    }

    fn update(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| UserStoreError::LockPoisoned)?;
        if !users.contains_key(&user.id) {
            return Err(UserStoreError::NotFound);
        }
        Self::check_unique(&users, &user)?;
        users.insert(user.id, UserRecord::from_user(user));
        Ok(())
    }

    fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| UserStoreError::LockPoisoned)?;
        users.get(id).map(UserRecord::to_user).transpose()
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| UserStoreError::LockPoisoned)?;
        users
            .values()
            .find(|record| record.email == email)
            .map(UserRecord::to_user)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credential;

    fn user(username: &str, email: &str) -> User {
        User::new(
            username,
            email,
            Credential::set_password("pw").expect("entropy available"),
        )
    }

    #[test]
    fn test_insert_and_find() {
        let store = InMemoryUserStore::new();
        let jake = user("jake", "jake@example.com");
        let id = jake.id;

        store.insert(jake).expect("inserted");

        let by_id = store.find_by_id(&id).expect("readable").expect("present");
        assert_eq!(by_id.username, "jake");
        let by_email = store
            .find_by_email("jake@example.com")
            .expect("readable")
            .expect("present");
        assert_eq!(by_email.id, id);
    }

    #[test]
    fn test_find_missing() {
        let store = InMemoryUserStore::new();

        assert!(store.find_by_id(&UserId([0; 12])).expect("readable").is_none());
        assert!(store.find_by_email("nobody@example.com").expect("readable").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        store.insert(user("jake", "jake@example.com")).expect("inserted");

        assert_eq!(
            store.insert(user("jake", "other@example.com")),
            Err(UserStoreError::Taken("username"))
        );
        assert_eq!(
            store.insert(user("other", "jake@example.com")),
            Err(UserStoreError::Taken("email"))
        );
    }

    #[test]
    fn test_update_replaces_user() {
        let store = InMemoryUserStore::new();
        let mut jake = user("jake", "jake@example.com");
        store.insert(jake.clone()).expect("inserted");

        jake.bio = Some("hello".to_string());
        jake.email = "jake@new.example.com".to_string();
        store.update(jake.clone()).expect("updated");

        let stored = store.find_by_id(&jake.id).expect("readable").expect("present");
        assert_eq!(stored.bio.as_deref(), Some("hello"));
        assert!(store.find_by_email("jake@example.com").expect("readable").is_none());
    }

    #[test]
    fn test_update_keeps_own_values() {
        let store = InMemoryUserStore::new();
        let jake = user("jake", "jake@example.com");
        store.insert(jake.clone()).expect("inserted");

        assert_eq!(store.update(jake), Ok(()));
    }

    #[test]
    fn test_update_rejects_taken_values() {
        let store = InMemoryUserStore::new();
        store.insert(user("jake", "jake@example.com")).expect("inserted");
        let mut anna = user("anna", "anna@example.com");
        store.insert(anna.clone()).expect("inserted");

        anna.username = "jake".to_string();
        assert_eq!(store.update(anna), Err(UserStoreError::Taken("username")));
    }

    #[test]
    fn test_update_unknown_user() {
        let store = InMemoryUserStore::new();
        assert_eq!(
            store.update(user("ghost", "ghost@example.com")),
            Err(UserStoreError::NotFound)
        );
    }

    #[test]
    fn test_credential_persisted_as_hex() {
        let store = InMemoryUserStore::new();
        let jake = user("jake", "jake@example.com");
        let (salt, hash) = jake.credential.to_hex();
        let id = jake.id;
        store.insert(jake).expect("inserted");

        {
            let records = store.users.read().expect("lock");
            let record = records.get(&id).expect("present");
            assert_eq!(record.salt, salt);
            assert_eq!(record.hash, hash);
        }

        let stored = store.find_by_id(&id).expect("readable").expect("present");
        assert!(stored.verify_password("pw"));
        assert!(!stored.verify_password("nope"));
    }

    #[test]
    fn test_corrupt_record_is_reported() {
        let store = InMemoryUserStore::new();
        let jake = user("jake", "jake@example.com");
        let id = jake.id;
        store.insert(jake).expect("inserted");

        store
            .users
            .write()
            .expect("lock")
            .get_mut(&id)
            .expect("present")
            .hash = "not-hex".to_string();

        assert!(matches!(
            store.find_by_id(&id),
            Err(UserStoreError::Corrupt(_))
        ));
        assert!(matches!(
            store.find_by_email("jake@example.com"),
            Err(UserStoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            UserStoreError::Taken("email").to_string(),
            "email is already taken"
        );
        assert_eq!(UserStoreError::NotFound.to_string(), "user not found");
        assert_eq!(
            UserStoreError::LockPoisoned.to_string(),
            "user store lock poisoned"
        );
        assert_eq!(
            UserStoreError::Corrupt("bad hex".to_string()).to_string(),
            "corrupt user record: bad hex"
        );
    }
}
