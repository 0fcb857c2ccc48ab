//! User accounts.
//!
//! A user owns exactly one [`Credential`]. Username and email are normalised to
//! lowercase before validation and storage.

mod store;
mod validation;

use std::fmt;

use serde::Serialize;

use crate::auth::{Credential, CredentialError};

pub use store::{InMemoryUserStore, UserStore, UserStoreError};
pub use validation::{
    BLANK, FieldErrors, INVALID, REQUIRED, TAKEN, validate_email, validate_username,
};

/// A unique identifier for a user.
///
/// 12 random bytes, displayed as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub [u8; 12]);

impl UserId {
    /// Generate a new random user ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Parse an ID from its hex form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        bytes.try_into().ok().map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub credential: Credential,
}

/// Representation of a user returned by account routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthJson {
    pub username: String,
    pub email: String,
    pub token: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl User {
    /// Create a user with a fresh ID.
    ///
    /// Username and email are lowercased. Validation is left to the caller.
    #[must_use]
    pub fn new(username: &str, email: &str, credential: Credential) -> Self {
        Self {
            id: UserId::generate(),
            username: username.to_lowercase(),
            email: email.to_lowercase(),
            bio: None,
            image: None,
            credential,
        }
    }

    /// Replace the credential with one derived from `plaintext`.
    ///
    /// On error the existing credential is left untouched.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), CredentialError> {
        self.credential = Credential::set_password(plaintext)?;
        Ok(())
    }

    /// Check `plaintext` against the stored credential.
    #[must_use]
    pub fn verify_password(&self, plaintext: &str) -> bool {
        self.credential.verify_password(plaintext)
    }

    /// Validate username and email, collecting every failure.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Err(message) = validate_username(&self.username) {
            errors.insert("username", message);
        }
        if let Err(message) = validate_email(&self.email) {
            errors.insert("email", message);
        }
        errors.into_result()
    }

    /// Build the account representation carrying `token`.
    #[must_use]
    pub fn to_auth_json(&self, token: String) -> AuthJson {
        AuthJson {
            username: self.username.clone(),
            email: self.email.clone(),
            token,
            bio: self.bio.clone(),
            image: self.image.clone(),
        }
    }
}
