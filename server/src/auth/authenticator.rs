//! Per-request authorization decision.
//!
//! Every request is classified from its `Authorization` header into a
//! [`TokenState`], then an [`AuthMode`] turns that state into either an
//! [`AuthContext`] or an [`Unauthorized`] rejection.
//!
//! | state      | required       | optional       |
//! |------------|----------------|----------------|
//! | no token   | `Unauthorized` | `Anonymous`    |
//! | valid      | `Authenticated`| `Authenticated`|
//! | invalid    | `Unauthorized` | `Unauthorized` |
//!
//! # Invariants
//! - The authenticator holds no mutable state; the secret is fixed at construction.
//! - Bad signature, malformed payload and expiry all map to `TokenState::Invalid`.
//! - An invalid token is never treated as anonymous.

use std::time::Duration;

use super::jwt::{self, Claims, JwtConfig, JwtError};

/// Scheme label expected as the first part of the `Authorization` header.
pub const TOKEN_SCHEME: &str = "Token";

/// Lifetime of an issued session token.
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Classification of a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// No usable `Authorization: Token <value>` header.
    NoToken,
    /// Signature and expiry checked out.
    Valid(Claims),
    /// A token was presented but failed verification.
    Invalid,
}

/// Enforcement policy for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// A valid token must be present.
    Required,
    /// A valid token is used when present; its absence is tolerated.
    Optional,
}

/// Identity available to a handler after authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// The request carried a valid token.
    Authenticated(Claims),
    /// No token was presented and the mode allowed it.
    Anonymous,
}

impl AuthContext {
    /// The verified claims, if any.
    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Authenticated(claims) => Some(claims),
            Self::Anonymous => None,
        }
    }

    /// Consume the context and return the claims, if any.
    #[must_use]
    pub fn into_claims(self) -> Option<Claims> {
        match self {
            Self::Authenticated(claims) => Some(claims),
            Self::Anonymous => None,
        }
    }
}

/// The request was rejected as unauthenticated.
///
/// Carries no detail on purpose: callers cannot tell a missing token from an
/// expired or forged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthorized;

impl std::fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing or invalid authorization token")
    }
}

impl std::error::Error for Unauthorized {}

/// Extracts the token from an `Authorization` header value.
///
/// The value must be exactly two whitespace-separated parts and the first
/// must equal [`TOKEN_SCHEME`]. Anything else yields `None`.
#[must_use]
pub fn extract_token(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || scheme != TOKEN_SCHEME {
        return None;
    }
    Some(token)
}

/// Issues and verifies session tokens.
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    config: JwtConfig,
}

impl TokenAuthenticator {
    /// Create an authenticator around the shared signing secret.
    #[must_use]
    pub const fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Issue a token for `id` that expires [`TOKEN_TTL`] from now.
    ///
    /// # Errors
    /// Returns `JwtError::Signing` if the token cannot be encoded.
    pub fn issue_token(&self, id: &str, username: &str) -> Result<String, JwtError> {
        self.issue_token_at(id, username, jsonwebtoken::get_current_timestamp())
    }

    /// Issue a token as if the current time were `now` (seconds since epoch).
    ///
    /// # Errors
    /// Returns `JwtError::Signing` if the token cannot be encoded.
    pub fn issue_token_at(&self, id: &str, username: &str, now: u64) -> Result<String, JwtError> {
        let claims = Claims {
            id: id.to_string(),
            username: username.to_string(),
            exp: now.saturating_add(TOKEN_TTL.as_secs()),
        };
        jwt::sign_token(&claims, &self.config)
    }

    /// Classify the credentials carried by an `Authorization` header value.
    #[must_use]
    pub fn inspect(&self, header: Option<&str>) -> TokenState {
        let Some(token) = extract_token(header) else {
            return TokenState::NoToken;
        };

        match jwt::verify_token(token, &self.config) {
            Ok(claims) => TokenState::Valid(claims),
            Err(e) => {
                tracing::debug!("rejecting presented token: {e}");
                TokenState::Invalid
            }
        }
    }

    /// Apply `mode` to the credentials carried by `header`.
    ///
    /// # Errors
    /// Returns `Unauthorized` for an invalid token in either mode, and for a
    /// missing token in `AuthMode::Required`.
    pub fn authorize(&self, header: Option<&str>, mode: AuthMode) -> Result<AuthContext, Unauthorized> {
        match (self.inspect(header), mode) {
            (TokenState::Valid(claims), _) => Ok(AuthContext::Authenticated(claims)),
            (TokenState::NoToken, AuthMode::Optional) => Ok(AuthContext::Anonymous),
            (TokenState::NoToken, AuthMode::Required) | (TokenState::Invalid, _) => {
                Err(Unauthorized)
            }
        }
    }
}
