//! Login strategies.
//!
//! Only local email/password login exists. New strategies are added as
//! variants, not as plugins.

use super::Credential;
use crate::users::{User, UserStore, UserStoreError};

/// A way of proving who you are at login.
#[derive(Debug, Clone)]
pub enum LoginStrategy {
    /// Email and password checked against the stored credential.
    LocalCredential { email: String, password: String },
}

/// Error returned when login fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Unknown account or wrong password. The two are not distinguished.
    InvalidCredentials,
    /// The user store failed.
    Store(UserStoreError),
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "email or password is invalid"),
            Self::Store(e) => write!(f, "user store error: {e}"),
        }
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::InvalidCredentials => None,
        }
    }
}

impl From<UserStoreError> for LoginError {
    fn from(e: UserStoreError) -> Self {
        Self::Store(e)
    }
}

impl LoginStrategy {
    /// Resolve the strategy to a user.
    ///
    /// Runs the password KDF, so async callers should use a blocking thread.
    /// An unknown email runs it too, against [`Credential::unmatchable`], so
    /// timing does not reveal whether the account exists.
    pub fn authenticate(&self, users: &dyn UserStore) -> Result<User, LoginError> {
        match self {
            Self::LocalCredential { email, password } => {
                let Some(user) = users.find_by_email(&email.to_lowercase())? else {
                    std::hint::black_box(Credential::unmatchable().verify_password(password));
                    return Err(LoginError::InvalidCredentials);
                };
                if !user.verify_password(password) {
                    return Err(LoginError::InvalidCredentials);
                }
                Ok(user)
            }
        }
    }
}
