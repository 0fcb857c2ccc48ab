//! JWT signing and verification.
//!
//! Tokens are HS256-signed with a single shared secret that is used for both
//! signing and verification.
//!
//! # Pre-conditions
//! - The secret must be non-empty.
//!
//! # Post-conditions
//! - On success, `verify_token` returns the decoded `Claims`.
//! - On failure, returns an error indicating which check failed. Callers
//!   outside this module must not forward that detail to clients.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.
//! - Expiry is checked with zero leeway.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Error returned when JWT configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtConfigError {
    /// The HS256 secret is empty.
    EmptySecret,
}

impl std::fmt::Display for JwtConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HS256 secret must not be empty"),
        }
    }
}

impl std::error::Error for JwtConfigError {}

/// HS256 signing/verification configuration.
///
/// Holds the shared secret. Anything holding it can mint valid tokens.
#[derive(Clone)]
pub struct JwtConfig {
    secret: Vec<u8>,
}

impl JwtConfig {
    /// Create a new HS256 configuration.
    ///
    /// # Errors
    /// Returns `JwtConfigError::EmptySecret` if the secret is empty.
    pub fn new_hs256(secret: Vec<u8>) -> Result<Self, JwtConfigError> {
        if secret.is_empty() {
            return Err(JwtConfigError::EmptySecret);
        }
        Ok(Self { secret })
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &"HS256")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the user the token was issued to.
    pub id: String,
    /// Username at the time of issue.
    pub username: String,
    /// Expiry, in seconds since the Unix epoch.
    pub exp: u64,
}

/// Error returned when signing or verifying a JWT fails.
#[derive(Debug)]
pub enum JwtError {
    /// The JWT signature is invalid.
    InvalidSignature,
    /// The JWT has expired.
    TokenExpired,
    /// The JWT is malformed or its payload cannot be parsed.
    MalformedToken,
    /// The 'id' claim is empty.
    MissingIdClaim,
    /// The token could not be encoded.
    Signing(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::MissingIdClaim => write!(f, "missing 'id' claim in JWT"),
            Self::Signing(reason) => write!(f, "failed to sign JWT: {reason}"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Signs `claims` with the configured secret.
///
/// # Errors
/// Returns `JwtError::Signing` if the claims cannot be encoded.
pub fn sign_token(claims: &Claims, config: &JwtConfig) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    encode(&header, claims, &EncodingKey::from_secret(&config.secret))
        .map_err(|e| JwtError::Signing(e.to_string()))
}

/// Verifies a JWT and returns its claims.
///
/// # Errors
/// Returns `JwtError` if verification fails for any reason.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(&config.secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(map_jwt_error)?;

    if token_data.claims.id.is_empty() {
        return Err(JwtError::MissingIdClaim);
    }

    Ok(token_data.claims)
}

/// Maps jsonwebtoken errors to our `JwtError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough";

    fn config(secret: &[u8]) -> JwtConfig {
        JwtConfig::new_hs256(secret.to_vec()).expect("non-empty secret")
    }

    fn claims(id: &str, exp: u64) -> Claims {
        Claims {
            id: id.to_string(),
            username: "jake".to_string(),
            exp,
        }
    }

    fn far_future() -> u64 {
        jsonwebtoken::get_current_timestamp() + 3600
    }

    #[test]
    fn test_sign_then_verify() {
        let original = claims("5f1a", far_future());
        let token = sign_token(&original, &config(SECRET)).expect("signed");

        assert_eq!(token.split('.').count(), 3);

        let decoded = verify_token(&token, &config(SECRET)).expect("verified token");
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_verify_invalid_signature() {
        let token =
            sign_token(&claims("5f1a", far_future()), &config(SECRET)).expect("signed");

        let result = verify_token(&token, &config(b"wrong-secret-key-that-is-different"));

        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_verify_expired() {
        let past = jsonwebtoken::get_current_timestamp() - 3600;
        let token = sign_token(&claims("5f1a", past), &config(SECRET)).expect("signed");

        let result = verify_token(&token, &config(SECRET));

        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_verify_malformed_token() {
        let result = verify_token("not-a-valid-jwt", &config(SECRET));
        assert!(matches!(result, Err(JwtError::MalformedToken)));
    }

    #[test]
    fn test_verify_empty_token() {
        let result = verify_token("", &config(SECRET));
        assert!(matches!(result, Err(JwtError::MalformedToken)));
    }

    #[test]
    fn test_verify_payload_missing_fields() {
        #[derive(Serialize)]
        struct Partial {
            sub: String,
            exp: u64,
        }

        let partial = Partial {
            sub: "5f1a".to_string(),
            exp: far_future(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &partial,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("signed");

        let result = verify_token(&token, &config(SECRET));

        assert!(matches!(result, Err(JwtError::MalformedToken)));
    }

    #[test]
    fn test_verify_empty_id_claim() {
        let token = sign_token(&claims("", far_future()), &config(SECRET)).expect("signed");

        let result = verify_token(&token, &config(SECRET));

        assert!(matches!(result, Err(JwtError::MissingIdClaim)));
    }

    #[test]
    fn test_new_hs256_empty_secret() {
        let result = JwtConfig::new_hs256(Vec::new());
        assert!(matches!(result, Err(JwtConfigError::EmptySecret)));
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let rendered = format!("{:?}", config(b"super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_jwt_error_display() {
        assert_eq!(
            JwtError::InvalidSignature.to_string(),
            "invalid JWT signature"
        );
        assert_eq!(JwtError::TokenExpired.to_string(), "JWT has expired");
        assert_eq!(JwtError::MalformedToken.to_string(), "malformed JWT");
        assert_eq!(
            JwtError::MissingIdClaim.to_string(),
            "missing 'id' claim in JWT"
        );
        assert_eq!(
            JwtError::Signing("boom".to_string()).to_string(),
            "failed to sign JWT: boom"
        );
        assert_eq!(
            JwtConfigError::EmptySecret.to_string(),
            "HS256 secret must not be empty"
        );
    }
}
