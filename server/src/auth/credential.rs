//! Password credential storage.
//!
//! A credential is a random per-user salt plus the output of PBKDF2-HMAC-SHA512
//! over the password and that salt. The plaintext is never kept.
//!
//! # Pre-conditions
//! - The operating system entropy source must be available when setting a password.
//!
//! # Post-conditions
//! - `Credential::set_password` always produces a fresh salt, so two credentials
//!   built from the same password differ.
//! - `Credential::verify_password` does not short-circuit on the first differing byte.
//!
//! # Invariants
//! - `salt` is exactly `SALT_LEN` bytes.
//! - `hash` is exactly `HASH_LEN` bytes.
//! - A credential is replaced as a whole, never partially mutated.

use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha512;

/// Length of the random salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived hash in bytes.
pub const HASH_LEN: usize = 512;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Error returned when building a credential fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The OS entropy source could not produce a salt.
    EntropyUnavailable(String),
    /// A persisted credential could not be decoded.
    InvalidEncoding(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntropyUnavailable(reason) => {
                write!(f, "entropy source unavailable: {reason}")
            }
            Self::InvalidEncoding(reason) => write!(f, "invalid credential encoding: {reason}"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// A salted password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    salt: [u8; SALT_LEN],
    hash: Box<[u8]>,
}

impl Credential {
    /// Build a credential for `plaintext` with a freshly generated salt.
    ///
    /// This is deliberately slow. Async callers should run it on a blocking
    /// thread.
    ///
    /// # Errors
    /// Returns `CredentialError::EntropyUnavailable` if no salt could be generated.
    /// The error is not retried.
    pub fn set_password(plaintext: &str) -> Result<Self, CredentialError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CredentialError::EntropyUnavailable(e.to_string()))?;

        Ok(Self {
            hash: derive(plaintext, &salt),
            salt,
        })
    }

    /// A fixed credential no password is expected to match.
    ///
    /// Verifying against it costs one full key derivation, the same as a real
    /// check.
    #[must_use]
    pub fn unmatchable() -> Self {
        Self {
            salt: [0; SALT_LEN],
            hash: vec![0; HASH_LEN].into_boxed_slice(),
        }
    }

    /// Check `plaintext` against this credential.
    ///
    /// Recomputes the hash with the stored salt and compares in constant time.
    #[must_use]
    pub fn verify_password(&self, plaintext: &str) -> bool {
        let candidate = derive(plaintext, &self.salt);
        constant_time_eq(&candidate, &self.hash)
    }

    /// The salt bytes.
    #[must_use]
    pub const fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// The derived hash bytes.
    #[must_use]
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Encode as `(salt_hex, hash_hex)`, the form user stores persist.
    #[must_use]
    pub fn to_hex(&self) -> (String, String) {
        (hex::encode(self.salt), hex::encode(&self.hash))
    }

    /// Decode a credential persisted with [`Credential::to_hex`].
    ///
    /// # Errors
    /// Returns `CredentialError::InvalidEncoding` if either part is not hex or
    /// has the wrong length.
    pub fn from_hex(salt_hex: &str, hash_hex: &str) -> Result<Self, CredentialError> {
        let salt_bytes =
            hex::decode(salt_hex).map_err(|e| CredentialError::InvalidEncoding(e.to_string()))?;
        let salt: [u8; SALT_LEN] = salt_bytes.try_into().map_err(|bytes: Vec<u8>| {
            CredentialError::InvalidEncoding(format!(
                "salt must be {SALT_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;

        let hash =
            hex::decode(hash_hex).map_err(|e| CredentialError::InvalidEncoding(e.to_string()))?;
        if hash.len() != HASH_LEN {
            return Err(CredentialError::InvalidEncoding(format!(
                "hash must be {HASH_LEN} bytes, got {}",
                hash.len()
            )));
        }

        Ok(Self {
            salt,
            hash: hash.into_boxed_slice(),
        })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("salt", &"<redacted>")
            .field("hash", &"<redacted>")
            .finish()
    }
}

/// PBKDF2-HMAC-SHA512 over `plaintext` and `salt`.
fn derive(plaintext: &str, salt: &[u8]) -> Box<[u8]> {
    let mut out = vec![0u8; HASH_LEN].into_boxed_slice();
    pbkdf2::pbkdf2_hmac::<Sha512>(plaintext.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

/// Byte comparison whose running time depends only on the input lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
