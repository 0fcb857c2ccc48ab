//! Authentication module.
//!
//! Password credentials, session tokens and the per-request authorization
//! decision.
//!
//! # Pre-conditions
//! - The signing secret is non-empty and fixed for the life of the process.
//!
//! # Post-conditions
//! - Authorization outcomes are computed fresh for every request.
//!
//! # Invariants
//! - No server-side session state is kept; token verification is a pure
//!   function of the token, the secret and the clock.
//! - Plaintext passwords are never stored.

pub mod authenticator;
pub mod credential;
pub mod extract;
pub mod jwt;
pub mod login;

pub use authenticator::{
    AuthContext, AuthMode, TOKEN_SCHEME, TOKEN_TTL, TokenAuthenticator, TokenState, Unauthorized,
    extract_token,
};
pub use credential::{Credential, CredentialError};
pub use extract::{OptionalAuth, RequiredAuth};
pub use jwt::{Claims, JwtConfig, JwtConfigError, JwtError};
pub use login::{LoginError, LoginStrategy};
